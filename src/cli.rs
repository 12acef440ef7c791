// ============================================================================
// PixelFE CLI — pixelate one image file from the command line
// ============================================================================
//
// Usage examples:
//   pixelfe --input photo.png --output mosaic.png
//   pixelfe -i photo.jpg -o out.jpg -p 16
//
// The output file keeps the input's container format (PNG in, PNG out).
// All processing runs synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::error::PixelError;
use crate::gpu::{GpuContext, KernelSource, Pixelator};
use crate::gpu::pixelate::MAX_BLOCK_SIZE;
use crate::io::{load_image, save_image};
use crate::{log_err, log_info, log_warn};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// GPU-accelerated image pixelator.
///
/// Replaces each square block of the image with its average colour.
#[derive(Parser, Debug)]
#[command(
    name = "pixelfe",
    about = "Apply a block-pixelation effect to an image on the GPU",
    long_about = "Divide an image into square blocks and replace each block with its\n\
                  average colour, computed by a GPU compute kernel. The output file\n\
                  uses the same container format as the input.\n\n\
                  Example:\n  \
                  pixelfe --input photo.png --output mosaic.png --pixel-size 16"
)]
pub struct CliArgs {
    /// Path to the input image file.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Path to save the output image.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Pixelation block size (1–128).
    #[arg(short, long, default_value_t = 8, value_name = "1-128")]
    pub pixel_size: u32,

    /// Print adapter info and per-stage timing.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the pixelation pipeline and return an OS exit code.
/// `0` = success, `1` = failure (error message printed to stderr).
pub fn run(args: CliArgs) -> ExitCode {
    if args.verbose {
        if let Some(path) = crate::logger::log_path() {
            println!("session log: {}", path.display());
        }
    }

    let pixel_size = effective_pixel_size(args.pixel_size);

    match run_one(&args.input, &args.output, pixel_size, args.verbose) {
        Ok(()) => {
            println!("Image saved to {}", args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            log_err!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// CLI-level convenience: oversized block sizes are clamped down to
/// [`MAX_BLOCK_SIZE`] with a warning instead of failing.
///
/// This policy lives here deliberately. The core library rejects
/// out-of-range values (`gpu::pixelate::validate_block_size`); only the
/// front end softens that into a clamp. Zero is passed through so the
/// core's validation error reaches the user.
pub fn effective_pixel_size(requested: u32) -> u32 {
    if requested > MAX_BLOCK_SIZE {
        eprintln!("warning: pixel size {requested} exceeds the maximum, using {MAX_BLOCK_SIZE}");
        log_warn!("pixel size {requested} clamped to {MAX_BLOCK_SIZE}");
        MAX_BLOCK_SIZE
    } else {
        requested
    }
}

// ============================================================================
// Processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, pixel_size: u32, verbose: bool) -> Result<(), PixelError> {
    // -- Step 1: Load ----------------------------------------------------
    let load_start = Instant::now();
    let (image, format) = load_image(input)?;
    let (w, h) = image.dimensions();
    log_info!("loaded {} ({w}x{h}, {format:?})", input.display());
    if verbose {
        println!(
            "loaded {} ({w}x{h}, {format:?}) in {:.0}ms",
            input.display(),
            load_start.elapsed().as_secs_f64() * 1000.0
        );
    }

    // -- Step 2: Pixelate on the GPU --------------------------------------
    let gpu_start = Instant::now();
    let ctx = GpuContext::new()?;
    let pixelator = Pixelator::new(ctx, KernelSource::builtin())?;

    let ctx = pixelator.context();
    if verbose {
        println!(
            "GPU adapter: {} (workgroup {}x{})",
            ctx.adapter_name, ctx.workgroup.x, ctx.workgroup.y
        );
    }
    log_info!("GPU adapter: {}", ctx.adapter_name);
    let result = pixelator.pixelate(&image, pixel_size)?;
    if verbose {
        println!(
            "pixelated with block size {pixel_size} in {:.0}ms",
            gpu_start.elapsed().as_secs_f64() * 1000.0
        );
    }

    // -- Step 3: Save in the input's container format ----------------------
    let save_start = Instant::now();
    save_image(&result, output, format)?;
    log_info!("saved {} ({format:?})", output.display());
    if verbose {
        println!(
            "saved in {:.0}ms",
            save_start.elapsed().as_secs_f64() * 1000.0
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_pixel_size_is_clamped() {
        assert_eq!(effective_pixel_size(129), MAX_BLOCK_SIZE);
        assert_eq!(effective_pixel_size(1000), MAX_BLOCK_SIZE);
    }

    #[test]
    fn in_range_pixel_size_passes_through() {
        assert_eq!(effective_pixel_size(1), 1);
        assert_eq!(effective_pixel_size(8), 8);
        assert_eq!(effective_pixel_size(128), 128);
    }

    #[test]
    fn zero_is_not_clamped_upward() {
        // Zero must reach the core and fail validation there, not be
        // silently corrected by the CLI.
        assert_eq!(effective_pixel_size(0), 0);
    }

    #[test]
    fn default_pixel_size_is_eight() {
        let args = CliArgs::parse_from(["pixelfe", "-i", "in.png", "-o", "out.png"]);
        assert_eq!(args.pixel_size, 8);
    }

    #[test]
    fn short_and_long_flags_parse() {
        let args = CliArgs::parse_from([
            "pixelfe",
            "--input",
            "a.png",
            "--output",
            "b.png",
            "--pixel-size",
            "32",
            "--verbose",
        ]);
        assert_eq!(args.input, PathBuf::from("a.png"));
        assert_eq!(args.output, PathBuf::from("b.png"));
        assert_eq!(args.pixel_size, 32);
        assert!(args.verbose);

        let args = CliArgs::parse_from(["pixelfe", "-i", "a.png", "-o", "b.png", "-p", "4"]);
        assert_eq!(args.pixel_size, 4);
    }

    #[test]
    fn negative_pixel_size_is_a_parse_error() {
        // The arg is u32: negative values never reach the library.
        assert!(CliArgs::try_parse_from(["pixelfe", "-i", "a.png", "-o", "b.png", "-p", "-3"])
            .is_err());
    }
}
