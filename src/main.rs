//! REST Model Extractor - Command-line tool for generating endpoint models.
//!
//! This binary generates a language-neutral REST endpoint model from the
//! class metadata of an application: controllers, their HTTP-mapped methods,
//! path and query parameters, request bodies and return types.
//!
//! # Usage
//!
//! ```bash
//! restmodel-from-metadata [OPTIONS] --seed <CLASS> <METADATA_PATH>
//! ```
//!
//! # Examples
//!
//! Extract the model of one controller:
//! ```bash
//! restmodel-from-metadata ./metadata -s OrderController -o model.yaml
//! ```
//!
//! Boot an application entry point and scan its component registry:
//! ```bash
//! restmodel-from-metadata ./metadata -s ShopApplication --scan-applications
//! ```
//!
//! Generate JSON output with verbose logging:
//! ```bash
//! restmodel-from-metadata ./metadata -s OrderController -f json -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;

use restmodel_from_metadata::cli;

fn main() -> Result<()> {
    // We need to parse args twice: once to get verbose flag, then again after logger init
    // First, do a quick parse just to check for verbose flag
    let args_for_verbose = cli::CliArgs::parse();

    // Initialize logger based on verbose flag
    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("REST Model Extractor starting...");

    // Now do the full parse with validation
    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    // Run the main workflow
    cli::run(args)?;

    info!("Endpoint model extraction completed successfully");

    Ok(())
}
