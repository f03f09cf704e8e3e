/// Module for the `obfuscate` subcommand, which renames the symbols of a program model.
///
/// The program and library models are JSON class documents. Configuration comes from an
/// optional JSON file; the flags below override the corresponding file settings. The
/// rewritten program model goes to `--output` or stdout, and a summary report can be
/// written with `--emit`.
use clap::Args;
use obscura_core::ClassPool;
use obscura_rename::{ObfuscationConfig, Obfuscator};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Arguments for the `obfuscate` subcommand.
#[derive(Debug, Args)]
pub struct ObfuscateArgs {
    /// Program model (JSON class document).
    #[arg(long)]
    pub program: PathBuf,
    /// Library models; their symbols are never renamed.
    #[arg(long)]
    library: Vec<PathBuf>,
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reuse the names of a prior mapping.
    #[arg(long)]
    apply_mapping: Option<PathBuf>,
    /// Write the resulting mapping.
    #[arg(long)]
    print_mapping: Option<PathBuf>,
    /// Write the rewritten program model here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Path to emit the summary report as JSON.
    #[arg(long)]
    emit: Option<PathBuf>,
    /// Give equal member names equal new names across the program.
    #[arg(long)]
    unique_member_names: bool,
    /// Let overloads differ in their return type only.
    #[arg(long)]
    overload_aggressively: bool,
    /// Treat mapping and conflict warnings as errors.
    #[arg(long)]
    warnings_fatal: bool,
}

impl ObfuscateArgs {
    fn load_config(&self) -> Result<ObfuscationConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => ObfuscationConfig::from_file(path)?,
            None => ObfuscationConfig::default(),
        };
        if self.apply_mapping.is_some() {
            config.apply_mapping.clone_from(&self.apply_mapping);
        }
        if self.print_mapping.is_some() {
            config.print_mapping.clone_from(&self.print_mapping);
        }
        config.unique_member_names |= self.unique_member_names;
        config.overload_aggressively |= self.overload_aggressively;
        config.warnings_fatal |= self.warnings_fatal;
        Ok(config)
    }
}

/// Executes the `obfuscate` subcommand.
impl super::Command for ObfuscateArgs {
    fn execute(self) -> Result<(), Box<dyn Error>> {
        let config = self.load_config()?;

        let program = ClassPool::read_document(&self.program)?;
        let mut library = Vec::new();
        for path in &self.library {
            library.extend(ClassPool::read_document(path)?);
        }
        let mut pool = ClassPool::new(program, library);

        let result = Obfuscator::new(config).run(&mut pool)?;

        let document = pool.program_document()?;
        match &self.output {
            Some(path) => fs::write(path, document)?,
            None => println!("{document}"),
        }

        if let Some(path) = &self.emit {
            fs::write(path, serde_json::to_string_pretty(&result)?)?;
            tracing::info!("Report written to {}", path.display());
        }

        for warning in &result.warnings {
            eprintln!("Warning: {warning}");
        }
        Ok(())
    }
}
