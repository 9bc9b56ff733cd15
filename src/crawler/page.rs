use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page known to the frontier, keyed by its canonical URL.
///
/// Created when a URL is first accepted; its depth is fixed at that moment and
/// never revised, even if the URL is later reachable through a shorter path.
/// Pages are never removed during a job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Canonical URL, the unique key within a job
    pub url: String,

    /// Link-following hops from the seed URL that first discovered this page
    pub depth: u32,

    /// Whether the page has been successfully fetched and written out
    pub done: bool,

    /// Local filename the content was written to, once done
    pub filename: Option<String>,

    /// SHA-256 of the written content, once done
    pub content_hash: Option<String>,

    /// Number of failed fetch attempts so far
    pub attempts: u32,

    /// When the URL was first accepted into the frontier
    pub discovered_at: DateTime<Utc>,
}

impl Page {
    pub fn new(url: String, depth: u32) -> Self {
        Self {
            url,
            depth,
            done: false,
            filename: None,
            content_hash: None,
            attempts: 0,
            discovered_at: Utc::now(),
        }
    }
}

/// Read-only snapshot of a job's progress, recomputed from the full page set
/// at call time rather than kept as incremental counters.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStatistics {
    pub total_unique_pages: usize,
    pub unique_pages_scraped: usize,
    pub pages_pending: usize,
    pub pages_failed: usize,
    pub max_depth_reached: u32,
    pub max_pages: Option<usize>,
}
