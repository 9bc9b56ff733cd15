use std::collections::HashSet;

use tracing::debug;
use url::Url;

use crate::cli::config::JobConfig;
use crate::crawler::url::first_path_segment;

/// Determine whether a candidate URL is eligible for crawling.
///
/// Checks are applied in order, short-circuiting on the first failure:
/// already scraped, domain restriction, path restriction, exclusion patterns.
/// Malformed URLs are ineligible rather than an error, so one bad link never
/// aborts processing of the rest of a batch. Pure function with no side
/// effects; the frontier calls it on every insertion attempt.
pub fn eligible(url: &str, config: &JobConfig, scraped_urls: &HashSet<String>) -> bool {
    if scraped_urls.contains(url) {
        debug!("Skipping already scraped URL: {}", url);
        return false;
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Skipping invalid URL {}: {}", url, e);
            return false;
        }
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        debug!("Skipping non-HTTP URL: {}", url);
        return false;
    }

    let host = match parsed.host_str() {
        Some(host) => host,
        None => {
            debug!("Skipping URL without host: {}", url);
            return false;
        }
    };

    if config.domain_restricted {
        let seed_hosts: HashSet<&str> = config
            .seed_urls
            .iter()
            .filter_map(|seed| seed.host_str())
            .collect();
        if !seed_hosts.contains(host) {
            debug!("Skipping URL from non-seed domain {}: {}", host, url);
            return false;
        }
    }

    if config.path_restricted {
        // Seed URLs without a path segment impose no constraint
        let seed_segments: HashSet<String> = config
            .seed_urls
            .iter()
            .filter_map(first_path_segment)
            .collect();
        if !seed_segments.is_empty() {
            if let Some(segment) = first_path_segment(&parsed) {
                if !seed_segments.contains(&segment) {
                    debug!("Skipping URL outside seed paths ({}): {}", segment, url);
                    return false;
                }
            }
        }
    }

    for pattern in &config.exclusion_patterns {
        if url.contains(pattern.as_str()) {
            debug!("Skipping URL matching exclusion pattern '{}': {}", pattern, url);
            return false;
        }
    }

    true
}
