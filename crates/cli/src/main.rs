/// Entry point for the Obscura CLI, a renamer for compiled JVM programs.
///
/// This module parses command-line arguments and dispatches to the `obfuscate` and
/// `retrace` subcommands after installing the log subscriber on stderr.
use clap::Parser;
use obscura_cli::commands::{Cmd, Command};
use tracing_subscriber::EnvFilter;

/// Command-line interface for Obscura.
///
/// Obscura renames the classes, fields and methods of a class model, writes a mapping
/// of the new names, and turns obfuscated stack traces back into readable ones.
#[derive(Parser)]
#[command(name = "obscura")]
#[command(about = "Obscura: JVM symbol obfuscator")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Log every phase at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Runs the Obscura CLI with the provided arguments.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli.command.execute()
}
