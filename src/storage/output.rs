use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Filenames longer than this (before the extension) get truncated.
const MAX_FILENAME_LEN: usize = 100;

/// Writes scraped pages as markdown files under one output directory.
///
/// Filenames are derived deterministically from the page title, so concurrent
/// workers write distinct files and need no synchronization beyond the
/// directory existing.
pub struct OutputStore {
    output_dir: PathBuf,
}

impl OutputStore {
    pub async fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .context(format!(
                "Failed to create output directory: {}",
                output_dir.display()
            ))?;
        Ok(Self { output_dir })
    }

    /// Write one page's content, returning the filename it landed in and the
    /// hex SHA-256 of the content.
    pub async fn write_page(&self, title: &str, content: &str) -> Result<(String, String)> {
        let filename = sanitize_filename(title);
        let path = self.output_dir.join(&filename);

        tokio::fs::write(&path, content)
            .await
            .context(format!("Failed to write page to {}", path.display()))?;

        debug!("Wrote {} bytes to {}", content.len(), path.display());

        Ok((filename, content_hash(content)))
    }
}

/// Turn a page title into a safe `.md` filename: drop characters that are
/// illegal or awkward in filenames, collapse whitespace to underscores and
/// truncate to a bounded length.
pub fn sanitize_filename(title: &str) -> String {
    static ILLEGAL: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let illegal = ILLEGAL.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static pattern"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"));

    let stripped = illegal.replace_all(title, "");
    let underscored = whitespace.replace_all(stripped.trim(), "_");

    let truncated: String = underscored.chars().take(MAX_FILENAME_LEN).collect();
    let name = truncated.trim_matches('_');

    if name.is_empty() {
        "page.md".to_string()
    } else {
        format!("{}.md", name)
    }
}

/// Hex SHA-256 of page content, recorded for change detection.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
