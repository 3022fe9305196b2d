//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop and its control surface:
//! - Validating the run configuration and the seed
//! - Driving the frontier one page at a time, with pacing between pages
//! - Pausing, resuming and stopping a live run
//! - Reporting progress and log events to an observer
//! - Producing the results snapshot

use crate::config::{validate_crawl_config, CrawlConfig};
use crate::crawler::fetcher::{FetchOutcome, FetchStrategy};
use crate::crawler::frontier::{Admission, Frontier};
use crate::crawler::parser::extract_links;
use crate::crawler::timing::{format_duration, pages_remaining, TimeTracker};
use crate::output::{
    CrawlObserver, CrawlResults, LogEvent, LogLevel, NoopObserver, ProgressEvent,
};
use crate::state::RunState;
use crate::url::{canonicalize, CanonicalUrl};
use crate::SweepError;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Everything that belongs to the current (or last) run
#[derive(Debug, Default)]
struct CrawlSession {
    frontier: Frontier,
    tracker: TimeTracker,
    seed_domain: String,
    started_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl CrawlSession {
    fn reset(&mut self, seed: CanonicalUrl) {
        self.frontier.clear();
        self.tracker.reset();
        self.seed_domain = seed.host().to_string();
        self.started_at = Some(Utc::now());
        self.error = None;
        self.frontier.seed(seed);
    }

    fn progress(&self, budget: usize) -> ProgressEvent {
        let visited = self.frontier.visited_len();
        let queued = self.frontier.queued_len();
        let failed = self.frontier.failed_len();
        let processed = self.frontier.processed_len();
        let remaining = pages_remaining(queued, budget, processed);

        ProgressEvent {
            progress_percent: (visited as f64 * 100.0 / budget.max(1) as f64).min(100.0),
            visited,
            queued,
            failed,
            elapsed_formatted: format_duration(self.tracker.elapsed()),
            eta_formatted: self.tracker.estimate(remaining).to_string(),
            average_sec_per_page: self.tracker.average_ms() / 1000.0,
            pages_processed: processed,
        }
    }
}

struct Shared {
    settings: CrawlConfig,
    strategy: Arc<FetchStrategy>,
    observer: Arc<dyn CrawlObserver>,
    session: Mutex<CrawlSession>,
    state: watch::Sender<RunState>,
}

/// Single-domain crawl engine
///
/// The handle is cheap to clone; all clones drive the same engine, so one task
/// can await [`Crawler::start`] while another pauses, resumes or stops it.
///
/// # Example
///
/// ```no_run
/// use sumi_sweep::config::Config;
/// use sumi_sweep::crawler::{Crawler, FetchStrategy};
///
/// # async fn run() -> sumi_sweep::Result<()> {
/// let config = Config::default();
/// let crawler = Crawler::new(config.crawl.clone(), FetchStrategy::from_config(&config)?);
/// let results = crawler.start("https://example.com/").await?;
/// println!("Visited {} pages", results.total_pages);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Crawler {
    shared: Arc<Shared>,
}

impl Crawler {
    /// Creates an idle engine that reports to nobody
    pub fn new(settings: CrawlConfig, strategy: FetchStrategy) -> Self {
        Self::with_observer(settings, strategy, Arc::new(NoopObserver))
    }

    /// Creates an idle engine reporting progress and log events to `observer`
    pub fn with_observer(
        settings: CrawlConfig,
        strategy: FetchStrategy,
        observer: Arc<dyn CrawlObserver>,
    ) -> Self {
        let (state, _) = watch::channel(RunState::Idle);

        Self {
            shared: Arc::new(Shared {
                settings,
                strategy: Arc::new(strategy),
                observer,
                session: Mutex::new(CrawlSession::default()),
                state,
            }),
        }
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        *self.shared.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.shared.state.subscribe()
    }

    /// Runs a crawl from `seed` until the frontier is exhausted, the page
    /// budget is reached, or the run is stopped
    ///
    /// Any previous run's data is discarded. Failures of individual pages never
    /// end the run; a fault in the loop itself ends it in `Stopped` with the
    /// message recorded in [`CrawlResults::error`].
    ///
    /// # Errors
    ///
    /// * `SweepError::Config` - the run configuration is invalid
    /// * `SweepError::InvalidSeed` - the seed is refused by the canonicalizer
    /// * `SweepError::AlreadyRunning` - a run is active on this engine
    pub async fn start(&self, seed: &str) -> Result<CrawlResults, SweepError> {
        validate_crawl_config(&self.shared.settings)?;

        let seed_url = canonicalize(seed, None).map_err(|reason| SweepError::InvalidSeed {
            seed: seed.to_string(),
            reason,
        })?;

        let claimed = self.shared.state.send_if_modified(|state| {
            if state.can_transition_to(RunState::Running) {
                *state = RunState::Running;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(SweepError::AlreadyRunning);
        }

        self.session().reset(seed_url.clone());
        self.log(
            LogLevel::Info,
            format!(
                "Starting crawl of {} (budget {} pages, {}ms delay)",
                seed_url, self.shared.settings.max_pages, self.shared.settings.delay_ms
            ),
        );

        let outcome = self.run_loop().await;

        // The terminal state and the snapshot are taken under the session lock,
        // so a restart on another handle cannot reset the session in between
        let (results, elapsed) = {
            let mut session = self.session();
            let state = match &outcome {
                Err(e) => {
                    session.error = Some(e.to_string());
                    self.shared.state.send_replace(RunState::Stopped);
                    RunState::Stopped
                }
                Ok(()) => {
                    // A stop issued while the loop was winding down wins
                    let mut state = RunState::Completed;
                    self.shared.state.send_if_modified(|current| {
                        if *current == RunState::Stopped {
                            state = RunState::Stopped;
                            false
                        } else {
                            *current = RunState::Completed;
                            true
                        }
                    });
                    state
                }
            };
            (snapshot(&session, state), session.tracker.elapsed())
        };

        if let Err(e) = outcome {
            self.log(LogLevel::Error, format!("Crawl aborted: {}", e));
        }
        let level = match results.state {
            RunState::Completed => LogLevel::Success,
            _ => LogLevel::Warning,
        };
        self.log(
            level,
            format!(
                "Crawl {}: {} pages visited, {} failed in {}",
                results.state,
                results.total_pages,
                results.failed_urls.len(),
                format_duration(elapsed)
            ),
        );

        Ok(results)
    }

    /// Suspends a running crawl after the page in flight
    ///
    /// Returns false if the engine was not running.
    pub fn pause(&self) -> bool {
        let paused = self.transition(RunState::Running, RunState::Paused);
        if paused {
            self.log(LogLevel::Info, "Crawl paused".to_string());
        }
        paused
    }

    /// Resumes a paused crawl with its frontier intact
    ///
    /// Returns false if the engine was not paused.
    pub fn resume(&self) -> bool {
        let resumed = self.transition(RunState::Paused, RunState::Running);
        if resumed {
            self.log(LogLevel::Info, "Crawl resumed".to_string());
        }
        resumed
    }

    /// Ends an active crawl after the page in flight
    ///
    /// Returns false if no crawl was active.
    pub fn stop(&self) -> bool {
        let stopped = self.shared.state.send_if_modified(|state| {
            if state.is_active() {
                *state = RunState::Stopped;
                true
            } else {
                false
            }
        });
        if stopped {
            self.log(LogLevel::Warning, "Crawl stopped".to_string());
        }
        stopped
    }

    /// Snapshot of the current (or last) run
    pub fn results(&self) -> CrawlResults {
        let session = self.session();
        snapshot(&session, self.state())
    }

    /// Progress of the current (or last) run
    pub fn progress(&self) -> ProgressEvent {
        self.session().progress(self.shared.settings.max_pages)
    }

    /// Main crawl loop
    ///
    /// Runs while the state is active, the queue is non-empty and the visited
    /// count is under the page budget.
    async fn run_loop(&self) -> Result<(), SweepError> {
        let mut state_rx = self.shared.state.subscribe();
        let budget = self.shared.settings.max_pages;
        let delay = Duration::from_millis(self.shared.settings.delay_ms);

        loop {
            let state = *state_rx.borrow_and_update();

            match state {
                RunState::Running => {}
                RunState::Paused => {
                    // Hold the frontier until resumed or stopped
                    if state_rx.changed().await.is_err() {
                        break;
                    }
                    continue;
                }
                _ => break,
            }

            let next = {
                let mut session = self.session();
                if session.frontier.visited_len() >= budget {
                    tracing::debug!("Page budget of {} reached", budget);
                    break;
                }
                session.frontier.take_next()
            };

            let Some(url) = next else {
                tracing::debug!("Frontier is empty");
                break;
            };

            self.process_url(url).await?;

            if !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = stopped(&mut state_rx) => {}
                }
            }
        }

        Ok(())
    }

    /// Processes a single URL
    ///
    /// This method:
    /// 1. Marks the URL visited (skipping it if it was already processed)
    /// 2. Fetches the page on its own task
    /// 3. Extracts links and offers them to the frontier
    /// 4. Records timing and reports progress
    ///
    /// Only a panic inside the fetch task is returned as an error.
    async fn process_url(&self, url: CanonicalUrl) -> Result<(), SweepError> {
        let started = Instant::now();

        if !self.session().frontier.mark_visited(&url) {
            tracing::debug!("Skipping already processed {}", url);
            return Ok(());
        }
        self.log(LogLevel::Crawl, format!("Crawling {}", url));

        let strategy = Arc::clone(&self.shared.strategy);
        let target = url.clone();
        let joined = tokio::spawn(async move { strategy.fetch(&target).await }).await;

        match joined {
            Ok(Ok(page)) => self.handle_page(&url, page),
            Ok(Err(e)) => {
                self.session().frontier.mark_failed(&url);
                self.log(LogLevel::Error, format!("Failed to fetch {}: {}", url, e));
            }
            Err(e) => {
                self.session().frontier.mark_failed(&url);
                return Err(SweepError::Task(format!(
                    "fetch task for {} failed: {}",
                    url, e
                )));
            }
        }

        let progress = {
            let mut session = self.session();
            session.tracker.record(started.elapsed().as_millis() as u64);
            session.progress(self.shared.settings.max_pages)
        };
        self.shared.observer.on_progress(&progress);

        Ok(())
    }

    /// Records a fetched page and queues its same-domain links
    fn handle_page(&self, url: &CanonicalUrl, page: FetchOutcome) {
        let links = extract_links(&page.content, page.final_url.as_url());
        let redirected = page.final_url != *url;

        let queued: Vec<CanonicalUrl> = {
            let mut session = self.session();
            let seed_domain = session.seed_domain.clone();

            session.frontier.record_success();
            if redirected {
                session.frontier.record_redirect();
            }

            links
                .iter()
                .filter_map(|link| match session.frontier.offer(link, &seed_domain) {
                    Admission::Queued(found) => Some(found),
                    _ => None,
                })
                .collect()
        };

        if redirected {
            self.log(
                LogLevel::Redirect,
                format!("{} redirected to {}", url, page.final_url),
            );
        }
        for found in &queued {
            self.log(LogLevel::Discover, format!("Discovered {}", found));
        }

        let via = if page.rendered { " via renderer" } else { "" };
        self.log(
            LogLevel::Success,
            format!(
                "Fetched {}{} ({} links, {} new)",
                url,
                via,
                links.len(),
                queued.len()
            ),
        );
    }

    fn transition(&self, from: RunState, to: RunState) -> bool {
        self.shared.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    fn log(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Crawl | LogLevel::Discover => tracing::debug!("{}", message),
            LogLevel::Info | LogLevel::Redirect | LogLevel::Success => {
                tracing::info!("{}", message)
            }
        }

        self.shared.observer.on_log(&LogEvent { message, level });
    }

    fn session(&self) -> MutexGuard<'_, CrawlSession> {
        self.shared
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn snapshot(session: &CrawlSession, state: RunState) -> CrawlResults {
    let urls = session.frontier.visited_urls();

    CrawlResults {
        total_pages: urls.len(),
        urls,
        stats: *session.frontier.stats(),
        failed_urls: session.frontier.failed_urls(),
        state,
        started_at: session.started_at,
        error: session.error.clone(),
    }
}

/// Resolves once the run state becomes `Stopped`
async fn stopped(state_rx: &mut watch::Receiver<RunState>) {
    loop {
        let state = *state_rx.borrow_and_update();
        if state == RunState::Stopped || state_rx.changed().await.is_err() {
            return;
        }
    }
}
