pub mod commands;
pub mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to this file in addition to stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a crawl job from a configuration profile
    Crawl {
        /// Job profile to run
        #[arg(required = true)]
        profile: String,

        /// Seed URL(s), replacing the profile's seeds
        #[arg(short, long)]
        seed: Vec<String>,

        /// Maximum crawling depth
        #[arg(short, long)]
        depth: Option<u32>,

        /// Maximum number of pages to scrape
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of concurrent fetch workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output directory for scraped markdown
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage job configuration profiles
    Config {
        /// Profile name to show, creating a default one if it doesn't exist
        profile: Option<String>,

        /// List all available profiles
        #[arg(long)]
        list: bool,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Crawl {
            profile,
            seed,
            depth,
            limit,
            workers,
            output,
        } => {
            info!("Starting crawl job from profile {}", profile);
            commands::crawl(profile, seed, depth, limit, workers, output).await
        }
        Commands::Config { profile, list } => {
            if list {
                commands::list_profiles()
            } else if let Some(profile_name) = profile {
                commands::manage_profile(profile_name)
            } else {
                commands::show_default_config()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }
}
