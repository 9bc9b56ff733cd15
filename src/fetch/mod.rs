pub mod reader;

pub use reader::ReaderClient;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CrawlError;

/// Extracted page content as returned by the reader service.
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderResponse {
    /// Main textual content of the page, as markdown
    pub content: String,

    /// URLs discovered on the page
    #[serde(default)]
    pub links: Vec<String>,

    /// Image URLs discovered on the page
    #[serde(default)]
    pub images: Vec<String>,

    /// Page title, when the service reports one
    #[serde(default)]
    pub title: Option<String>,
}

/// The external fetch collaborator: turns a URL into extracted content plus
/// discovered links. Any failure means "no result for this URL"; the caller
/// logs it and the page stays pending.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageReader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ReaderResponse, CrawlError>;
}
