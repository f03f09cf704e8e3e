use clap::Subcommand;
use std::error::Error;

pub mod obfuscate;
pub mod retrace;

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Rename the symbols of a program model
    Obfuscate(obfuscate::ObfuscateArgs),

    /// Translate an obfuscated stack trace back to original names
    Retrace(retrace::RetraceArgs),
}

pub trait Command {
    fn execute(self) -> Result<(), Box<dyn Error>>;
}

impl Command for Cmd {
    fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Obfuscate(args) => args.execute(),
            Cmd::Retrace(args) => args.execute(),
        }
    }
}
