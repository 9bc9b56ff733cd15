use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::cli::config::JobConfig;
use crate::crawler::page::{CrawlStatistics, Page};
use crate::crawler::policy;
use crate::crawler::url::normalize;

/// The authoritative, concurrency-safe record of every URL a job knows about.
///
/// All mutable crawl state lives behind one exclusive lock; every public
/// operation is a single short critical section that performs no I/O. One lock
/// rather than fine-grained locking keeps the small number of operations free
/// of lock-ordering bugs.
///
/// A frontier is created once per job, seeded with depth-0 pages for the seed
/// URLs, and discarded when the orchestrator returns.
pub struct Frontier {
    config: Arc<JobConfig>,
    state: Mutex<FrontierState>,
}

struct FrontierState {
    /// Every known page, keyed by canonical URL
    pages: HashMap<String, Page>,

    /// Canonical URLs not yet fetched successfully
    pending: HashSet<String>,

    /// Canonical URLs given up on after too many failed fetches
    dead: HashSet<String>,
}

impl Frontier {
    pub fn new(config: Arc<JobConfig>) -> Self {
        let mut state = FrontierState {
            pages: HashMap::new(),
            pending: HashSet::new(),
            dead: HashSet::new(),
        };

        // Seed URLs enter unconditionally at depth 0; restriction policy
        // applies only to discovered candidates
        for seed in &config.seed_urls {
            let url = normalize(seed.as_str());
            if state.pages.contains_key(&url) {
                continue;
            }
            state.pages.insert(url.clone(), Page::new(url.clone(), 0));
            state.pending.insert(url);
        }

        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Offer a batch of candidate URLs discovered on `source_url`, returning
    /// the canonical URLs that were accepted as new pending pages.
    ///
    /// The depth of the whole batch is `depth(source) + 1` (an unknown source
    /// counts as depth 0). If that exceeds `max_depth` the entire batch is
    /// rejected: depth is a property of the batch's source, not of each URL.
    /// Otherwise each candidate is normalized and accepted if it is unknown,
    /// passes the restriction policy, and still fits within the page budget.
    pub fn add_urls(&self, candidates: &[String], source_url: &str) -> Vec<String> {
        let mut added = Vec::new();
        let mut state = self.lock();

        if self.budget_reached(&state) {
            return added;
        }

        let source = normalize(source_url);
        let source_depth = state.pages.get(&source).map(|p| p.depth).unwrap_or(0);
        let new_depth = source_depth + 1;

        if let Some(max_depth) = self.config.max_depth {
            if new_depth > max_depth {
                debug!(
                    "Rejecting {} candidates from {}: depth {} exceeds limit {}",
                    candidates.len(),
                    source,
                    new_depth,
                    max_depth
                );
                return added;
            }
        }

        let scraped_urls: HashSet<String> = state
            .pages
            .values()
            .filter(|p| p.done)
            .map(|p| p.url.clone())
            .collect();

        for candidate in candidates {
            if let Some(max_pages) = self.config.max_pages {
                // Accepted insertions in this call plus already completed
                // pages must not exceed the budget
                if scraped_urls.len() + added.len() >= max_pages {
                    debug!("Page budget {} leaves no slots for further candidates", max_pages);
                    break;
                }
            }

            let url = normalize(candidate);
            if state.pages.contains_key(&url) {
                continue;
            }
            if !policy::eligible(&url, &self.config, &scraped_urls) {
                continue;
            }

            state.pages.insert(url.clone(), Page::new(url.clone(), new_depth));
            state.pending.insert(url.clone());
            added.push(url);
        }

        if !added.is_empty() {
            debug!(
                "Accepted {}/{} candidates from {} at depth {}",
                added.len(),
                candidates.len(),
                source,
                new_depth
            );
        }

        added
    }

    /// Record a successful fetch. Idempotent: a no-op for unknown URLs, and a
    /// done page is never re-opened nor its metadata overwritten.
    pub fn mark_done(&self, url: &str, filename: Option<String>, content_hash: Option<String>) {
        let url = normalize(url);
        let mut guard = self.lock();
        let state = &mut *guard;

        match state.pages.get_mut(&url) {
            Some(page) => {
                if page.done {
                    return;
                }
                page.done = true;
                if filename.is_some() {
                    page.filename = filename;
                }
                if content_hash.is_some() {
                    page.content_hash = content_hash;
                }
                state.pending.remove(&url);
            }
            None => debug!("mark_done for unknown URL: {}", url),
        }
    }

    /// Record a failed fetch attempt. Once a page has failed `max_attempts`
    /// times it leaves the pending set for good, so a permanently
    /// unfetchable URL cannot stall the drain forever.
    pub fn mark_failed(&self, url: &str) {
        let url = normalize(url);
        let mut state = self.lock();

        let give_up = match state.pages.get_mut(&url) {
            Some(page) if !page.done => {
                page.attempts += 1;
                page.attempts >= self.config.max_attempts
            }
            _ => false,
        };

        if give_up {
            state.pending.remove(&url);
            state.dead.insert(url.clone());
            warn!(
                "Giving up on {} after {} failed attempts",
                url, self.config.max_attempts
            );
        }
    }

    /// Current pending URLs. Once the completed-page count has reached the
    /// budget this clears the pending set and returns empty, which is how the
    /// orchestrator learns to stop.
    pub fn get_pending(&self) -> Vec<String> {
        let mut state = self.lock();

        if self.budget_reached(&state) {
            if !state.pending.is_empty() {
                debug!(
                    "Page budget reached, discarding {} pending URLs",
                    state.pending.len()
                );
                state.pending.clear();
            }
            return Vec::new();
        }

        state.pending.iter().cloned().collect()
    }

    /// Snapshot of job progress, computed from the full page set.
    pub fn get_statistics(&self) -> CrawlStatistics {
        let state = self.lock();

        CrawlStatistics {
            total_unique_pages: state.pages.len(),
            unique_pages_scraped: state.pages.values().filter(|p| p.done).count(),
            pages_pending: state.pending.len(),
            pages_failed: state.dead.len(),
            max_depth_reached: state.pages.values().map(|p| p.depth).max().unwrap_or(0),
            max_pages: self.config.max_pages,
        }
    }

    /// Depth recorded for a canonical URL, if known.
    pub fn depth_of(&self, url: &str) -> Option<u32> {
        let state = self.lock();
        state.pages.get(&normalize(url)).map(|p| p.depth)
    }

    fn budget_reached(&self, state: &FrontierState) -> bool {
        match self.config.max_pages {
            Some(max_pages) => state.pages.values().filter(|p| p.done).count() >= max_pages,
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // Critical sections never panic mid-update, so poisoning would mean a
        // bug elsewhere; propagate it as a panic rather than limp on
        self.state.lock().expect("frontier lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn job_config(max_pages: Option<usize>, max_depth: Option<u32>) -> Arc<JobConfig> {
        Arc::new(JobConfig {
            name: "test".to_string(),
            seed_urls: vec![Url::parse("https://docs.example.com/guide/intro").unwrap()],
            max_pages,
            max_depth,
            ..JobConfig::default()
        })
    }

    #[test]
    fn test_seeds_enter_at_depth_zero() {
        let frontier = Frontier::new(job_config(None, None));

        assert_eq!(
            frontier.get_pending(),
            vec!["https://docs.example.com/guide/intro".to_string()]
        );
        assert_eq!(frontier.depth_of("https://docs.example.com/guide/intro"), Some(0));
    }

    #[test]
    fn test_no_duplicate_pages() {
        let frontier = Frontier::new(job_config(None, None));
        let candidates = vec![
            "https://docs.example.com/guide/setup".to_string(),
            "https://docs.example.com/guide/setup/".to_string(),
            "https://docs.example.com/guide/setup#install".to_string(),
        ];

        let added = frontier.add_urls(&candidates, "https://docs.example.com/guide/intro");

        // All three candidates share one canonical URL
        assert_eq!(added, vec!["https://docs.example.com/guide/setup".to_string()]);
        assert_eq!(frontier.get_statistics().total_unique_pages, 2);
    }

    #[test]
    fn test_first_discovery_fixes_depth() {
        let frontier = Frontier::new(job_config(None, None));
        let setup = vec!["https://docs.example.com/guide/setup".to_string()];
        let deep = vec!["https://docs.example.com/guide/deep".to_string()];

        frontier.add_urls(&setup, "https://docs.example.com/guide/intro");
        frontier.add_urls(&deep, "https://docs.example.com/guide/setup");
        assert_eq!(frontier.depth_of("https://docs.example.com/guide/deep"), Some(2));

        // Re-discovering from the seed (depth 1) neither re-adds nor revises
        let re_added = frontier.add_urls(&deep, "https://docs.example.com/guide/intro");
        assert!(re_added.is_empty());
        assert_eq!(frontier.depth_of("https://docs.example.com/guide/deep"), Some(2));
        assert_eq!(frontier.get_statistics().total_unique_pages, 3);
    }

    #[test]
    fn test_unknown_source_counts_as_depth_zero() {
        let frontier = Frontier::new(job_config(None, None));

        let added = frontier.add_urls(
            &["https://docs.example.com/guide/orphan".to_string()],
            "https://docs.example.com/guide/never-seen",
        );

        assert_eq!(added.len(), 1);
        assert_eq!(frontier.depth_of("https://docs.example.com/guide/orphan"), Some(1));
    }

    #[test]
    fn test_depth_limit_rejects_whole_batch() {
        let frontier = Frontier::new(job_config(None, Some(1)));
        frontier.add_urls(
            &["https://docs.example.com/guide/setup".to_string()],
            "https://docs.example.com/guide/intro",
        );

        // Source at depth 1, so the batch would land at depth 2
        let added = frontier.add_urls(
            &[
                "https://docs.example.com/guide/a".to_string(),
                "https://docs.example.com/guide/b".to_string(),
            ],
            "https://docs.example.com/guide/setup",
        );

        assert!(added.is_empty());
        let stats = frontier.get_statistics();
        assert_eq!(stats.total_unique_pages, 2);
        assert_eq!(stats.max_depth_reached, 1);
    }

    #[test]
    fn test_depth_zero_rejects_all_discoveries() {
        let frontier = Frontier::new(job_config(None, Some(0)));

        let added = frontier.add_urls(
            &["https://docs.example.com/guide/setup".to_string()],
            "https://docs.example.com/guide/intro",
        );

        assert!(added.is_empty());
        assert_eq!(frontier.get_statistics().total_unique_pages, 1);
    }

    #[test]
    fn test_page_budget_caps_insertions() {
        let frontier = Frontier::new(job_config(Some(2), None));
        frontier.mark_done("https://docs.example.com/guide/intro", None, None);

        let added = frontier.add_urls(
            &[
                "https://docs.example.com/guide/a".to_string(),
                "https://docs.example.com/guide/b".to_string(),
                "https://docs.example.com/guide/c".to_string(),
            ],
            "https://docs.example.com/guide/intro",
        );

        // One page done, budget two: only one slot left
        assert_eq!(added.len(), 1);
    }

    #[test]
    fn test_budget_reached_blocks_additions_and_clears_pending() {
        let frontier = Frontier::new(job_config(Some(1), None));
        frontier.add_urls(
            &["https://docs.example.com/guide/next".to_string()],
            "https://docs.example.com/guide/intro",
        );
        frontier.mark_done("https://docs.example.com/guide/intro", None, None);

        let added = frontier.add_urls(
            &["https://docs.example.com/guide/more".to_string()],
            "https://docs.example.com/guide/intro",
        );
        assert!(added.is_empty());

        // Budget reached: pending is force-cleared and stays empty
        assert!(frontier.get_pending().is_empty());
        assert_eq!(frontier.get_statistics().pages_pending, 0);
        assert_eq!(frontier.get_statistics().unique_pages_scraped, 1);
    }

    #[test]
    fn test_mark_done_is_idempotent() {
        let frontier = Frontier::new(job_config(None, None));
        let url = "https://docs.example.com/guide/intro";

        frontier.mark_done(url, Some("intro.md".to_string()), Some("abc".to_string()));
        frontier.mark_done(url, Some("other.md".to_string()), None);
        frontier.mark_done("https://docs.example.com/guide/unknown", None, None);

        let stats = frontier.get_statistics();
        assert_eq!(stats.unique_pages_scraped, 1);
        assert_eq!(stats.pages_pending, 0);

        // First completion's metadata wins
        let state = frontier.lock();
        let page = state.pages.get(url).unwrap();
        assert_eq!(page.filename.as_deref(), Some("intro.md"));
        assert_eq!(page.content_hash.as_deref(), Some("abc"));
    }

    #[test]
    fn test_mark_failed_dead_letters_after_max_attempts() {
        let config = Arc::new(JobConfig {
            name: "test".to_string(),
            seed_urls: vec![Url::parse("https://docs.example.com/guide/intro").unwrap()],
            max_attempts: 2,
            ..JobConfig::default()
        });
        let frontier = Frontier::new(config);
        let url = "https://docs.example.com/guide/intro";

        frontier.mark_failed(url);
        assert_eq!(frontier.get_pending().len(), 1);

        frontier.mark_failed(url);
        assert!(frontier.get_pending().is_empty());

        let stats = frontier.get_statistics();
        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.unique_pages_scraped, 0);
    }

    #[test]
    fn test_statistics_snapshot() {
        let frontier = Frontier::new(job_config(Some(10), None));
        frontier.add_urls(
            &[
                "https://docs.example.com/guide/a".to_string(),
                "https://docs.example.com/guide/b".to_string(),
            ],
            "https://docs.example.com/guide/intro",
        );
        frontier.mark_done("https://docs.example.com/guide/intro", None, None);

        let stats = frontier.get_statistics();
        assert_eq!(stats.total_unique_pages, 3);
        assert_eq!(stats.unique_pages_scraped, 1);
        assert_eq!(stats.pages_pending, 2);
        assert_eq!(stats.pages_failed, 0);
        assert_eq!(stats.max_depth_reached, 1);
        assert_eq!(stats.max_pages, Some(10));
    }
}
