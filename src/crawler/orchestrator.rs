use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cli::config::JobConfig;
use crate::crawler::frontier::Frontier;
use crate::crawler::page::CrawlStatistics;
use crate::crawler::url::make_absolute;
use crate::fetch::PageReader;
use crate::storage::OutputStore;

/// How many queued URLs each worker may have waiting ahead of it.
const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// What became of one dispatched URL.
enum FetchOutcome {
    /// Page fetched, written out and marked done
    Completed { discovered: usize },

    /// Fetch or write failed; the frontier keeps or dead-letters the URL
    Failed,
}

struct WorkerReport {
    url: String,
    outcome: FetchOutcome,
}

/// Drives a job from seeded frontier to drained frontier.
///
/// A fixed pool of workers consumes URLs from a bounded queue. The dispatcher
/// feeds the queue from the frontier's pending set, tracking in-flight URLs
/// through worker completion reports so no URL is ever dispatched twice
/// concurrently. The crawl ends when nothing is pending and nothing is in
/// flight - including the forced-empty pending set once the page budget is
/// reached.
pub struct Orchestrator {
    config: Arc<JobConfig>,
    frontier: Arc<Frontier>,
    reader: Arc<dyn PageReader>,
    output: Arc<OutputStore>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<JobConfig>,
        reader: Arc<dyn PageReader>,
        output: Arc<OutputStore>,
    ) -> Self {
        let frontier = Arc::new(Frontier::new(config.clone()));
        Self {
            config,
            frontier,
            reader,
            output,
        }
    }

    /// Run the crawl to completion and return the final statistics.
    pub async fn run(&self) -> Result<CrawlStatistics> {
        let started = Instant::now();

        // Seeding happened when the frontier was built
        info!(
            "Job '{}' seeded with {} URLs ({} workers, max_pages={:?}, max_depth={:?})",
            self.config.name,
            self.config.seed_urls.len(),
            self.config.max_workers,
            self.config.max_pages,
            self.config.max_depth,
        );

        let worker_count = self.config.max_workers.max(1);
        let (work_tx, work_rx) = mpsc::channel::<String>(worker_count * QUEUE_DEPTH_PER_WORKER);
        let work_rx = Arc::new(Mutex::new(work_rx));
        // Capacity covers one unsent report per worker, so workers never
        // block on reporting
        let (report_tx, mut report_rx) = mpsc::channel::<WorkerReport>(worker_count);

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            workers.push(tokio::spawn(worker_loop(
                worker_id,
                self.config.clone(),
                self.frontier.clone(),
                self.reader.clone(),
                self.output.clone(),
                work_rx.clone(),
                report_tx.clone(),
            )));
        }
        drop(report_tx);

        self.drain(work_tx, &mut report_rx).await?;

        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                error!("Worker task panicked: {}", e);
            }
        }

        let stats = self.frontier.get_statistics();
        info!(
            "Crawl finished in {:.2}s: {} scraped, {} discovered, {} pending, {} failed",
            started.elapsed().as_secs_f64(),
            stats.unique_pages_scraped,
            stats.total_unique_pages,
            stats.pages_pending,
            stats.pages_failed,
        );

        Ok(stats)
    }

    /// Feed pending URLs to the worker pool until the frontier drains.
    async fn drain(
        &self,
        work_tx: mpsc::Sender<String>,
        report_rx: &mut mpsc::Receiver<WorkerReport>,
    ) -> Result<()> {
        let mut in_flight: HashSet<String> = HashSet::new();

        loop {
            let pending = self.frontier.get_pending();
            let mut ready: Vec<String> = pending
                .into_iter()
                .filter(|url| !in_flight.contains(url))
                .collect();

            // Never dispatch more than the budget has room for, counting
            // work already in flight
            if let Some(max_pages) = self.config.max_pages {
                let scraped = self.frontier.get_statistics().unique_pages_scraped;
                let slots = max_pages.saturating_sub(scraped + in_flight.len());
                ready.truncate(slots);
            }

            if ready.is_empty() {
                if in_flight.is_empty() {
                    break;
                }
                match report_rx.recv().await {
                    Some(report) => self.handle_report(report, &mut in_flight),
                    None => break,
                }
                continue;
            }

            for url in ready {
                in_flight.insert(url.clone());
                if work_tx.send(url).await.is_err() {
                    anyhow::bail!("worker pool shut down unexpectedly");
                }
                // Keep the in-flight view fresh while feeding the queue
                while let Ok(report) = report_rx.try_recv() {
                    self.handle_report(report, &mut in_flight);
                }
            }
        }

        Ok(())
    }

    fn handle_report(&self, report: WorkerReport, in_flight: &mut HashSet<String>) {
        in_flight.remove(&report.url);

        if let FetchOutcome::Completed { discovered } = report.outcome {
            if discovered > 0 {
                debug!("{} new URLs discovered on {}", discovered, report.url);
            }
            let stats = self.frontier.get_statistics();
            info!(
                "Progress: {}/{} pages scraped, {} pending",
                stats.unique_pages_scraped, stats.total_unique_pages, stats.pages_pending
            );
        }
    }
}

/// One worker: pull a URL, fetch it, write it out, feed discoveries back.
///
/// Exits when the work queue closes. Every failure is contained here; a
/// worker never takes the pool down with it.
async fn worker_loop(
    worker_id: usize,
    config: Arc<JobConfig>,
    frontier: Arc<Frontier>,
    reader: Arc<dyn PageReader>,
    output: Arc<OutputStore>,
    work_rx: Arc<Mutex<mpsc::Receiver<String>>>,
    report_tx: mpsc::Sender<WorkerReport>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        let url = {
            let mut rx = work_rx.lock().await;
            rx.recv().await
        };
        let Some(url) = url else {
            break;
        };

        let outcome = process_url(&url, &config, &frontier, &*reader, &output).await;

        if config.politeness_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.politeness_delay_ms)).await;
        }

        if report_tx.send(WorkerReport { url, outcome }).await.is_err() {
            break;
        }
    }

    debug!("Worker {} stopped", worker_id);
}

async fn process_url(
    url: &str,
    config: &JobConfig,
    frontier: &Frontier,
    reader: &dyn PageReader,
    output: &OutputStore,
) -> FetchOutcome {
    info!("Fetching {}", url);

    let response = match reader.fetch(url).await {
        Ok(response) => response,
        Err(e) => {
            warn!("{}", e);
            frontier.mark_failed(url);
            return FetchOutcome::Failed;
        }
    };

    debug!(
        "Extracted {} links and {} images from {}",
        response.links.len(),
        response.images.len(),
        url
    );

    if response.content.is_empty() {
        warn!("No content returned for {}", url);
        frontier.mark_failed(url);
        return FetchOutcome::Failed;
    }

    let title = match &response.title {
        Some(title) if !title.is_empty() => title.clone(),
        _ => derive_title(&response.content, url),
    };

    let (filename, content_hash) = match output.write_page(&title, &response.content).await {
        Ok(written) => written,
        Err(e) => {
            error!("Failed to write output for {}: {:#}", url, e);
            frontier.mark_failed(url);
            return FetchOutcome::Failed;
        }
    };

    frontier.mark_done(url, Some(filename), Some(content_hash));

    let mut discovered = 0;
    if config.follow_links && !response.links.is_empty() {
        let absolute: Vec<String> = response
            .links
            .iter()
            .filter_map(|link| make_absolute(url, link))
            .collect();
        discovered = frontier.add_urls(&absolute, url).len();
    }

    FetchOutcome::Completed { discovered }
}

/// Page title for filename purposes: first content line with markdown heading
/// markers stripped, falling back to the last URL path segment.
fn derive_title(content: &str, url: &str) -> String {
    let first_line = content
        .lines()
        .next()
        .map(|line| line.trim_start_matches(['#', ' ']).trim())
        .unwrap_or("");

    if !first_line.is_empty() {
        return first_line.to_string();
    }

    url.rsplit('/').next().unwrap_or(url).to_string()
}
