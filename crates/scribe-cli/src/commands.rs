use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "scribe")]
#[command(about = "An interactive shell for the scribe SQL dialect", long_about = None, version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// A script file to execute non-interactively, one statement per line.
    pub script: Option<PathBuf>,
    /// Run a single statement and exit instead of entering the REPL.
    #[arg(short = 'e', long = "execute")]
    pub execute: Option<String>,
    /// Log level for SCRIBE_LOG-style diagnostics (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "off")]
    pub log_level: String,
}
