use thiserror::Error;

/// Errors raised while driving a crawl job.
///
/// Per-URL failures (`MalformedUrl`, `Fetch`) are always recovered locally by
/// the orchestrator: logged, the URL skipped or left for retry, and the rest
/// of the batch continues. Only `InvalidConfig` is fatal, and it is surfaced
/// before any crawl work starts.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("malformed URL '{url}': {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("fetch failed for '{url}': {reason}")]
    Fetch { url: String, reason: String },

    #[error("invalid job configuration: {0}")]
    InvalidConfig(String),
}
