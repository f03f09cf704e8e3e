/// Module for the `retrace` subcommand, which restores original names in a stack trace.
use clap::Args;
use obscura_mapping::{NameMapping, Retracer};
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// Arguments for the `retrace` subcommand.
#[derive(Debug, Args)]
pub struct RetraceArgs {
    /// Mapping file written by `obfuscate --print-mapping`.
    #[arg(long)]
    pub mapping: PathBuf,
    /// File containing the obfuscated stack trace (stdin when omitted).
    pub trace: Option<PathBuf>,
}

impl super::Command for RetraceArgs {
    fn execute(self) -> Result<(), Box<dyn Error>> {
        let mapping = NameMapping::read_file(&self.mapping)?;
        let trace = match &self.trace {
            Some(path) => fs::read_to_string(path)?,
            None => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text)?;
                text
            }
        };

        let retracer = Retracer::new(&mapping);
        print!("{}", retracer.remap_stacktrace(&trace)?);
        Ok(())
    }
}
