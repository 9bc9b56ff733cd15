use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;
use url::Url;

use crate::cli::config::JobConfig;
use crate::crawler::orchestrator::Orchestrator;
use crate::error::CrawlError;
use crate::fetch::ReaderClient;
use crate::storage::OutputStore;

/// Run a crawl job from a profile, with command line overrides applied.
pub async fn crawl(
    profile: String,
    seeds: Vec<String>,
    depth: Option<u32>,
    limit: Option<usize>,
    workers: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = JobConfig::load_profile(&profile)
        .context(format!("Failed to load profile: {}", profile))?;

    if !seeds.is_empty() {
        config.seed_urls = seeds
            .iter()
            .map(|seed| {
                Url::parse(seed).map_err(|e| CrawlError::MalformedUrl {
                    url: seed.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(d) = depth {
        config.max_depth = Some(d);
    }
    if let Some(l) = limit {
        config.max_pages = Some(l);
    }
    if let Some(w) = workers {
        config.max_workers = w;
    }
    if let Some(o) = output {
        config.output_dir = o;
    }

    config.validate()?;

    let config = Arc::new(config);
    let reader = Arc::new(ReaderClient::new(&config.reader)?);
    let output_store = Arc::new(OutputStore::new(&config.output_dir).await?);

    let orchestrator = Orchestrator::new(config.clone(), reader, output_store);
    let stats = orchestrator.run().await?;

    println!("Crawl complete:");
    println!("  Pages discovered: {}", stats.total_unique_pages);
    println!("  Pages scraped:    {}", stats.unique_pages_scraped);
    println!("  Pages pending:    {}", stats.pages_pending);
    println!("  Pages failed:     {}", stats.pages_failed);
    println!("  Max depth:        {}", stats.max_depth_reached);
    println!("  Output directory: {}", config.output_dir.display());

    Ok(())
}

/// List all available job profiles
pub fn list_profiles() -> Result<()> {
    let profiles = JobConfig::list_profiles()?;

    if profiles.is_empty() {
        println!("No job profiles found. Create one with `harvester config <name>`.");
        return Ok(());
    }

    println!("Available job profiles:");
    for profile in profiles {
        println!("  - {}", profile);
    }

    Ok(())
}

/// Show a profile, creating a default one if it doesn't exist yet
pub fn manage_profile(profile_name: String) -> Result<()> {
    match JobConfig::load_profile(&profile_name) {
        Ok(config) => {
            println!("Profile: {}", profile_name);
            println!("{:#?}", config);
        }
        Err(_) => {
            warn!("Profile '{}' does not exist. Creating a default profile.", profile_name);
            let config = JobConfig {
                name: profile_name.clone(),
                ..JobConfig::default()
            };
            config.save_as_profile(&profile_name)?;
            println!("Created default profile: {}", profile_name);
            println!("Edit it to add seed URLs before running a crawl.");
        }
    }

    Ok(())
}

/// Show the built-in default configuration
pub fn show_default_config() -> Result<()> {
    println!("Default job configuration:");
    println!("{:#?}", JobConfig::default());

    Ok(())
}
