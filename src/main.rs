use std::process::ExitCode;

use clap::Parser;
use signify::cli::{self, CliArgs};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    cli::run(CliArgs::parse())
}
