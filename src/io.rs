// ============================================================================
// IMAGE I/O — codec boundary (decode to RGBA, encode with format round-trip)
// ============================================================================
//
// The pixelation core never touches files. This module decodes an input file
// into an `RgbaImage` plus a detected `ImageFormat` tag, and encodes a result
// buffer back to disk using that same tag, so the output file keeps the
// input's container format.

use std::path::Path;

use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::PixelError;

/// Decode an image file into an RGBA8 buffer plus its detected format.
///
/// The format is detected from the file's magic bytes (not the extension)
/// and returned as an opaque tag for [`save_image`] to round-trip.
pub fn load_image(path: &Path) -> Result<(RgbaImage, ImageFormat), PixelError> {
    let reader = ImageReader::open(path)
        .map_err(|e| PixelError::io(path, format!("could not open image: {e}")))?
        .with_guessed_format()
        .map_err(|e| PixelError::io(path, format!("could not read image header: {e}")))?;

    let format = reader
        .format()
        .ok_or_else(|| PixelError::io(path, "could not determine image type"))?;

    let image = reader
        .decode()
        .map_err(|e| PixelError::io(path, format!("could not decode image: {e}")))?;

    Ok((image.into_rgba8(), format))
}

/// Encode an RGBA8 buffer to `path` in the given container format.
///
/// Formats without an alpha channel (JPEG) are flattened to RGB8 first;
/// everything else is written as-is.
pub fn save_image(image: &RgbaImage, path: &Path, format: ImageFormat) -> Result<(), PixelError> {
    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image.clone())
            .into_rgb8()
            .save_with_format(path, format),
        _ => image.save_with_format(path, format),
    };

    result.map_err(|e| PixelError::io(path, format!("could not write image: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pixelfe_io_test_{}_{}", std::process::id(), name))
    }

    #[test]
    fn png_round_trip_preserves_pixels_and_format() {
        let mut img = RgbaImage::new(4, 3);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 60) as u8, (y * 80) as u8, 200, 255]);
        }

        let path = temp_path("round_trip.png");
        save_image(&img, &path, ImageFormat::Png).unwrap();

        let (reloaded, format) = load_image(&path).unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert_eq!(reloaded.dimensions(), (4, 3));
        assert_eq!(reloaded.as_raw(), img.as_raw());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn format_detected_from_magic_bytes_not_extension() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));

        // PNG data behind a misleading extension still loads as PNG.
        let path = temp_path("mislabelled.jpg");
        img.save_with_format(&path, ImageFormat::Png).unwrap();

        let (_, format) = load_image(&path).unwrap();
        assert_eq!(format, ImageFormat::Png);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let path = temp_path("does_not_exist.png");
        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, PixelError::Io { .. }));
        assert!(err.to_string().contains("does_not_exist"));
    }

    #[test]
    fn load_undecodable_file_fails() {
        let path = temp_path("not_an_image.png");
        std::fs::write(&path, b"this is not image data at all").unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, PixelError::Io { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn jpeg_save_flattens_alpha() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([120, 130, 140, 128]));
        let path = temp_path("flatten.jpg");
        save_image(&img, &path, ImageFormat::Jpeg).unwrap();

        let (reloaded, format) = load_image(&path).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
        // Alpha is gone after the flatten; decode re-adds an opaque channel.
        assert!(reloaded.pixels().all(|p| p.0[3] == 255));

        let _ = std::fs::remove_file(&path);
    }
}
