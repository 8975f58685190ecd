//! The main entry point for the jmm backend.

use jmmc_cli::{parse_args, run_compiler_args, utils};
use std::process::ExitCode;

// Used by the library.
use clap as _;
use jmmc_ast as _;
use jmmc_codegen as _;
use jmmc_config as _;
use jmmc_interface as _;
use tracing as _;
#[cfg(feature = "tracing")]
use tracing_subscriber as _;

fn main() -> ExitCode {
    utils::init_logger(Default::default());
    let opts = match parse_args(std::env::args_os()) {
        Ok(opts) => opts,
        Err(e) => e.exit(),
    };
    match run_compiler_args(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
