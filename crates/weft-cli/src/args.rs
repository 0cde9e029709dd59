//! Command-line argument definitions for the Weft CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input and output locations,
//! configuration file selection, error handling and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Weft compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input Weft file
    #[arg(help = "Path to the input .weft file")]
    pub input: String,

    /// Directory the generated files are written to
    #[arg(short, long, default_value = ".")]
    pub out_dir: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Go package of the generated files, instead of the source's package
    #[arg(long)]
    pub package: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write output even when semantic analysis reports errors
    #[arg(long)]
    pub allow_errors: bool,

    /// Print the parsed syntax tree to stdout
    #[arg(long)]
    pub dump_ast: bool,
}
