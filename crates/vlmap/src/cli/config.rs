//! The `vlmap config` command for configuration management.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use vlmap_core::{Config, RelationshipOptions, VocabOptions};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Show where each job reads and writes under the current configuration
    Outputs,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Outputs => {
            let config = Config::load()?;
            if let Err(e) = config.check() {
                tracing::warn!("{e}");
            }
            for (label, path) in resolved_paths(&config) {
                let note = if path.exists() { "" } else { "  (missing)" };
                println!("{:<22} {}{}", label, path.display(), note);
            }
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::write(&path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Inputs and outputs of both jobs, with `~` expanded and directory names
/// derived the way the jobs derive them.
fn resolved_paths(config: &Config) -> Vec<(&'static str, PathBuf)> {
    let rel = RelationshipOptions::from_config(config);
    let vocab = VocabOptions::from_config(config);
    vec![
        ("relationships input", rel.relationships_path.clone()),
        ("vocabulary", rel.vocab_path.clone()),
        ("relationships output", rel.output_dir.clone()),
        ("  store", rel.store_path()),
        ("  index", rel.index_path()),
        ("  stats", rel.stats_path()),
        ("  predicates", rel.relationships_list_path()),
        ("caption split dir", vocab.split_dir.clone()),
        ("  caption split", vocab.caption_split_path()),
        ("  vocab", vocab.vocab_path()),
        ("  answer dictionary", vocab.answer_dict_path()),
    ]
}
