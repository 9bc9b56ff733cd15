use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use url::Url;

use crate::error::CrawlError;

/// Configuration for one crawl job, immutable for the duration of a run.
///
/// Persisted as a YAML profile; every policy knob the frontier consults
/// lives here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobConfig {
    /// Name of the job, used for the profile file and logging
    pub name: String,

    /// Initial URLs to start crawling from
    pub seed_urls: Vec<Url>,

    /// Whether to follow links found in pages
    #[serde(default = "default_true")]
    pub follow_links: bool,

    /// Restrict crawling to the hosts of the seed URLs
    #[serde(default = "default_true")]
    pub domain_restricted: bool,

    /// Restrict crawling to the first path segments of the seed URLs
    #[serde(default = "default_true")]
    pub path_restricted: bool,

    /// URLs containing any of these substrings are skipped
    #[serde(default)]
    pub exclusion_patterns: Vec<String>,

    /// Maximum number of pages to scrape (None for unlimited)
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Maximum link depth from the seed URLs (None for unlimited)
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of concurrent fetch workers
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Failed fetch attempts before a URL is given up on
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay each worker observes after a fetch, in milliseconds
    #[serde(default)]
    pub politeness_delay_ms: u64,

    /// Directory scraped markdown is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Connection settings for the reader service
    #[serde(default)]
    pub reader: ReaderSettings,
}

/// Settings for the external content-extraction service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReaderSettings {
    /// Endpoint the extraction requests are posted to
    pub base_url: String,

    /// API key; falls back to the READER_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_reader_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_workers() -> usize {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_reader_timeout() -> u64 {
    120
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://r.jina.ai/".to_string(),
            api_key: None,
            timeout_secs: default_reader_timeout(),
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            seed_urls: vec![],
            follow_links: true,
            domain_restricted: true,
            path_restricted: true,
            exclusion_patterns: vec![],
            max_pages: None,
            max_depth: None,
            max_workers: default_max_workers(),
            max_attempts: default_max_attempts(),
            politeness_delay_ms: 0,
            output_dir: default_output_dir(),
            reader: ReaderSettings::default(),
        }
    }
}

impl JobConfig {
    /// Reject configurations that cannot produce a meaningful crawl, before
    /// any crawl work starts.
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.seed_urls.is_empty() {
            return Err(CrawlError::InvalidConfig(
                "at least one seed URL is required".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(CrawlError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        let mut path = if let Some(proj_dirs) = directories::ProjectDirs::from("com", "harvester", "harvester") {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        };

        path.push("jobs");
        if !path.exists() {
            if let Err(e) = fs::create_dir_all(&path) {
                error!("Failed to create config directory: {}", e);
            }
        }
        path.pop();
        path
    }

    /// Load a job profile by name.
    pub fn load_profile(profile: &str) -> Result<Self> {
        let profile_path = Self::config_dir().join("jobs").join(format!("{}.yaml", profile));

        if profile_path.exists() {
            Self::load_from_file(&profile_path)
        } else {
            anyhow::bail!("Profile '{}' not found", profile)
        }
    }

    /// Load a job configuration from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading job configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save the configuration as a named profile.
    pub fn save_as_profile(&self, profile: &str) -> Result<()> {
        let jobs_dir = Self::config_dir().join("jobs");

        if !jobs_dir.exists() {
            fs::create_dir_all(&jobs_dir)
                .context(format!("Failed to create jobs directory: {}", jobs_dir.display()))?;
        }

        let profile_path = jobs_dir.join(format!("{}.yaml", profile));
        self.save_to_file(&profile_path)
    }

    fn save_to_file(&self, path: &Path) -> Result<()> {
        debug!("Saving job configuration to: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let contents = serde_yaml::to_string(self)
            .context("Failed to serialize job configuration")?;

        fs::write(path, contents)
            .context(format!("Failed to write configuration file: {}", path.display()))?;

        info!("Saved job profile to {}", path.display());

        Ok(())
    }

    /// List all available job profiles.
    pub fn list_profiles() -> Result<Vec<String>> {
        let jobs_dir = Self::config_dir().join("jobs");

        if !jobs_dir.exists() {
            return Ok(vec![]);
        }

        let mut profiles = Vec::new();

        for entry in fs::read_dir(jobs_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && path.extension().map_or(false, |ext| ext == "yaml") {
                if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
                    profiles.push(name.to_string());
                }
            }
        }

        profiles.sort();
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let config = JobConfig {
            name: "docs".to_string(),
            seed_urls: vec![Url::parse("https://docs.example.com/guide/intro").unwrap()],
            exclusion_patterns: vec!["/changelog".to_string()],
            max_pages: Some(50),
            max_depth: Some(3),
            ..JobConfig::default()
        };

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: JobConfig = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.name, "docs");
        assert_eq!(parsed.seed_urls, config.seed_urls);
        assert_eq!(parsed.max_pages, Some(50));
        assert_eq!(parsed.max_depth, Some(3));
        assert!(parsed.domain_restricted);
    }

    #[test]
    fn test_minimal_yaml_gets_defaults() {
        let yaml = "name: minimal\nseed_urls:\n  - https://a.com/docs\n";
        let config: JobConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.follow_links);
        assert!(config.domain_restricted);
        assert!(config.path_restricted);
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_pages, None);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.reader.base_url, "https://r.jina.ai/");
    }

    #[test]
    fn test_validate_rejects_empty_seeds() {
        let config = JobConfig::default();
        assert!(matches!(
            config.validate(),
            Err(CrawlError::InvalidConfig(_))
        ));

        let mut config = JobConfig::default();
        config.seed_urls = vec![Url::parse("https://a.com/").unwrap()];
        assert!(config.validate().is_ok());

        config.max_workers = 0;
        assert!(config.validate().is_err());
    }
}
