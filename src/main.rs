use std::process::ExitCode;

use clap::Parser;

use pixelfe::cli::{self, CliArgs};

fn main() -> ExitCode {
    // Session log (truncates the previous run's file)
    pixelfe::logger::init();

    let args = CliArgs::parse();
    cli::run(args)
}
