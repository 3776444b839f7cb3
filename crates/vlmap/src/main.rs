//! vlmap CLI - Preprocessing for visual-language mapping datasets.
//!
//! Builds question/answer vocabularies and packed relationship datasets from
//! captioning and visual-relationship corpora. Every command refuses to
//! overwrite existing outputs.
//!
//! # Usage
//!
//! ```bash
//! # Caption splits, vocabulary, and answer dictionary
//! vlmap vocab --caption-split-dir data/preprocessed/coco/standard
//!
//! # Relationship dataset
//! vlmap relationships --min-occurrence 20
//!
//! # Look at a finished dataset
//! vlmap inspect preprocessed/relationships_min_occ20 --image-id 1
//!
//! # View configuration
//! vlmap config show
//!
//! # Where the jobs will read and write
//! vlmap config outputs
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// vlmap - Preprocessing for visual-language mapping datasets.
#[derive(Parser, Debug)]
#[command(name = "vlmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the caption split, question vocabulary, and answer dictionary
    Vocab(cli::vocab::VocabArgs),

    /// Build a relationship dataset (structured store, index, stats)
    Relationships(cli::relationships::RelationshipsArgs),

    /// Print statistics and records of a finished dataset
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match vlmap_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `vlmap config path`."
            );
            vlmap_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("vlmap v{}", vlmap_core::VERSION);

    match cli.command {
        Commands::Vocab(args) => cli::vocab::execute(args, config),
        Commands::Relationships(args) => cli::relationships::execute(args, config),
        Commands::Inspect(args) => cli::inspect::execute(args),
        Commands::Config(args) => cli::config::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["vlmap", "relationships", "--verbose", "--json-logs"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Relationships(_)));
    }
}
