use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::audit::engine::AccessibilityEngine;
use crate::audit::page::PageAuditor;
use crate::browser::BrowserDriver;
use crate::crawler::links::LinkCollector;
use crate::error::{error_chain, CrawlError};
use crate::report::model::{CrawlOptions, Report};

/// Lifecycle of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrawlState {
    Idle,
    SeedLoading,
    FrontierBuilt { total: usize },
    Visiting { current: usize, total: usize },
    Completed,
    Failed,
}

impl CrawlState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CrawlState::SeedLoading | CrawlState::FrontierBuilt { .. } | CrawlState::Visiting { .. }
        )
    }
}

/// Emitted after each page has been audited
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 1-based visitation index
    pub current: usize,
    pub total: usize,
    pub label: String,
}

/// Description of a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlFailure {
    /// Short message for end users
    pub summary: String,

    /// Full cause chain
    pub detail: String,
}

impl From<&CrawlError> for CrawlFailure {
    fn from(err: &CrawlError) -> Self {
        Self {
            summary: err.to_string(),
            detail: error_chain(err),
        }
    }
}

/// Events delivered to the consumer of a spawned crawl, in emission order
#[derive(Debug)]
pub enum CrawlEvent {
    Progress(Progress),
    Finished(Report),
    Failed(CrawlFailure),
}

/// Cooperative cancellation, checked before each page load
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Consumer side of a spawned crawl
pub struct CrawlHandle {
    events: mpsc::UnboundedReceiver<CrawlEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CrawlHandle {
    /// Next event; `None` once the terminal event has been taken
    pub async fn next_event(&mut self) -> Option<CrawlEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the crawl task to exit
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("Crawl task panicked: {}", e);
        }
    }
}

/// Drives a full crawl: seed, frontier, per-page audits, report
pub struct CrawlOrchestrator {
    auditor: PageAuditor,
    state: Mutex<CrawlState>,
}

impl CrawlOrchestrator {
    pub fn new(engine: Arc<dyn AccessibilityEngine>, settle_delay: Duration) -> Self {
        Self {
            auditor: PageAuditor::new(engine, settle_delay),
            state: Mutex::new(CrawlState::Idle),
        }
    }

    pub fn state(&self) -> CrawlState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, next: CrawlState) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!("Crawl state {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// Claim the orchestrator for a new run
    fn begin(&self) -> Result<(), CrawlError> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.is_active() {
            return Err(CrawlError::AlreadyRunning);
        }
        *state = CrawlState::SeedLoading;
        Ok(())
    }

    /// Run a crawl to completion on the current task.
    ///
    /// Progress events go to `progress`; the report is returned rather than
    /// sent. The driver is closed before returning, whatever the outcome.
    pub async fn run<D: BrowserDriver>(
        &self,
        options: &CrawlOptions,
        mut driver: D,
        progress: &mpsc::UnboundedSender<CrawlEvent>,
        cancel: &CancellationToken,
    ) -> Result<Report, CrawlError> {
        if let Err(e) = self.begin() {
            warn!("Rejected crawl of {}: {}", options.seed_url, e);
            Self::release(&mut driver).await;
            return Err(e);
        }

        let report = Report::new(options);
        let span = info_span!("crawl", run_id = %report.run_id, seed = %options.seed_url);

        let outcome = self
            .crawl(options, &mut driver, report, progress, cancel)
            .instrument(span)
            .await;

        Self::release(&mut driver).await;

        match &outcome {
            Ok(report) => {
                info!(
                    "Crawl of {} completed: {} pages, {} violations, {} contrast issues",
                    options.seed_url,
                    report.pages_completed,
                    report.accessibility_violation_count(),
                    report.contrast_violation_count()
                );
                self.transition(CrawlState::Completed);
            }
            Err(e) => {
                error!("Crawl of {} failed: {}", options.seed_url, error_chain(e));
                self.transition(CrawlState::Failed);
            }
        }

        outcome
    }

    async fn crawl<D: BrowserDriver>(
        &self,
        options: &CrawlOptions,
        driver: &mut D,
        mut report: Report,
        progress: &mpsc::UnboundedSender<CrawlEvent>,
        cancel: &CancellationToken,
    ) -> Result<Report, CrawlError> {
        let seed = &options.seed_url;

        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        info!("Loading seed page {}", seed);
        driver.navigate(seed).await?;

        // Single level: only links found on the seed page are visited
        let mut frontier = LinkCollector::collect(&*driver, seed).await?;
        frontier.insert(seed.clone());

        let total = frontier.len();
        report.total_pages_planned = total;
        self.transition(CrawlState::FrontierBuilt { total });
        info!("Frontier built with {} pages", total);

        for (index, url) in frontier.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Crawl cancelled before page {} of {}", index + 1, total);
                return Err(CrawlError::Cancelled);
            }

            let current = index + 1;
            self.transition(CrawlState::Visiting { current, total });

            let page = self.auditor.audit(driver, url, options).await?;
            report.push_page(page);

            let event = CrawlEvent::Progress(Progress {
                current,
                total,
                label: url.to_string(),
            });
            if progress.send(event).is_err() {
                debug!("Progress receiver dropped");
            }
        }

        Ok(report.finalize())
    }

    async fn release<D: BrowserDriver>(driver: &mut D) {
        if let Err(e) = driver.close().await {
            warn!("Error closing browser session: {}", e);
        }
    }

    /// Run a crawl on a background task and stream its events
    pub fn spawn<D>(self: &Arc<Self>, options: CrawlOptions, driver: D) -> CrawlHandle
    where
        D: BrowserDriver + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let orchestrator = Arc::clone(self);
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let event = match orchestrator.run(&options, driver, &tx, &token).await {
                Ok(report) => CrawlEvent::Finished(report),
                Err(e) => CrawlEvent::Failed(CrawlFailure::from(&e)),
            };
            if tx.send(event).is_err() {
                debug!("Crawl finished after its receiver was dropped");
            }
        });

        CrawlHandle {
            events: rx,
            cancel,
            task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::engine::AxeEngine;
    use crate::error::DriverError;
    use crate::report::formatter::ReportFormatter;
    use crate::report::translate::{Language, Translator};
    use crate::testing::{FakeBrowser, FakePage};
    use std::collections::HashSet;

    const SEED: &str = "https://a.test/";

    fn orchestrator() -> CrawlOrchestrator {
        CrawlOrchestrator::new(Arc::new(AxeEngine::new("window.axe = {};".into())), Duration::ZERO)
    }

    fn options(contrast: bool) -> CrawlOptions {
        CrawlOptions::new(SEED, contrast).unwrap()
    }

    async fn run(
        browser: &FakeBrowser,
        contrast: bool,
    ) -> (CrawlOrchestrator, Result<Report, CrawlError>, Vec<CrawlEvent>) {
        let orchestrator = orchestrator();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = orchestrator
            .run(&options(contrast), browser.driver(), &tx, &CancellationToken::new())
            .await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (orchestrator, result, events)
    }

    fn progress(events: &[CrawlEvent]) -> Vec<Progress> {
        events
            .iter()
            .filter_map(|e| match e {
                CrawlEvent::Progress(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_seed_without_links_and_no_violations() {
        let browser = FakeBrowser::new().with_page(SEED, FakePage::new());

        let (orchestrator, result, events) = run(&browser, false).await;
        let report = result.unwrap();

        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].url.as_str(), SEED);
        assert!(report.pages[0].accessibility_violations.is_empty());
        assert!(report.pages[0].contrast_violations.is_empty());
        assert_eq!(report.total_pages_planned, 1);
        assert_eq!(report.pages_completed, 1);
        assert!(report.finished_at.is_some());
        assert_eq!(events.len(), 1);
        assert_eq!(orchestrator.state(), CrawlState::Completed);
        assert_eq!(browser.close_count(), 1);

        let translator = Translator::default();
        assert_eq!(
            ReportFormatter::new(Language::En, &translator).render(&report),
            "✅ No accessibility violations found!"
        );
    }

    #[tokio::test]
    async fn test_one_critical_violation_on_seed() {
        let browser = FakeBrowser::new()
            .with_page(
                SEED,
                FakePage::new()
                    .with_links(&["/about"])
                    .with_violation("image-alt", "critical"),
            )
            .with_page("https://a.test/about", FakePage::new());

        let (_, result, _) = run(&browser, false).await;
        let report = result.unwrap();

        assert_eq!(report.pages.len(), 2);
        let urls: HashSet<&str> = report.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, HashSet::from([SEED, "https://a.test/about"]));

        let translator = Translator::default();
        let english = ReportFormatter::new(Language::En, &translator).render(&report);
        assert_eq!(english.matches("⚠️").count(), 1);
        assert_eq!(english.matches("🔴 Severity: Critical").count(), 1);

        let german = ReportFormatter::new(Language::De, &translator).render(&report);
        assert_eq!(german.matches("⚠️").count(), 1);
        assert_eq!(german.matches("🔴 Schwere: Kritisch").count(), 1);
    }

    #[tokio::test]
    async fn test_frontier_is_fixed_after_seed() {
        let browser = FakeBrowser::new()
            .with_page(SEED, FakePage::new().with_links(&["/a"]))
            .with_page("https://a.test/a", FakePage::new().with_links(&["/b"]))
            .with_page("https://a.test/b", FakePage::new());

        let (_, result, _) = run(&browser, false).await;
        let report = result.unwrap();

        assert_eq!(report.total_pages_planned, 2);
        assert!(report.pages.iter().all(|p| p.url.path() != "/b"));
        assert!(!browser.navigations().contains(&"https://a.test/b".to_string()));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_exhaustive() {
        let browser = FakeBrowser::new()
            .with_page(SEED, FakePage::new().with_links(&["/1", "/2", "/3", "/2", "mailto:x@a.test"]))
            .with_page("https://a.test/1", FakePage::new())
            .with_page("https://a.test/2", FakePage::new())
            .with_page("https://a.test/3", FakePage::new());

        let (_, result, events) = run(&browser, false).await;
        let report = result.unwrap();
        let progress = progress(&events);

        assert_eq!(progress.len(), 4);
        assert_eq!(progress.iter().map(|p| p.current).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!(progress.iter().all(|p| p.total == 4));

        // Each frontier member visited exactly once, in event order
        let labels: Vec<&str> = progress.iter().map(|p| p.label.as_str()).collect();
        let visited: Vec<&str> = report.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(labels, visited);
        assert_eq!(labels.iter().collect::<HashSet<_>>().len(), 4);
    }

    #[tokio::test]
    async fn test_seed_navigation_failure() {
        let browser = FakeBrowser::new().with_unreachable(SEED);

        let (orchestrator, result, events) = run(&browser, false).await;

        assert!(matches!(result, Err(CrawlError::Driver(DriverError::Navigation { .. }))));
        assert!(events.is_empty());
        assert_eq!(orchestrator.state(), CrawlState::Failed);
        assert_eq!(browser.close_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_run_discards_report() {
        let browser = FakeBrowser::new()
            .with_page(SEED, FakePage::new().with_links(&["/gone"]))
            .with_unreachable("https://a.test/gone");

        let (orchestrator, result, _) = run(&browser, false).await;

        assert!(matches!(result, Err(CrawlError::Driver(DriverError::Navigation { .. }))));
        assert_eq!(orchestrator.state(), CrawlState::Failed);
        assert_eq!(browser.close_count(), 1);
    }

    #[tokio::test]
    async fn test_contrast_results_are_aggregated() {
        use crate::testing::FakeElement;

        let browser = FakeBrowser::new().with_page(
            SEED,
            FakePage::new().with_element(FakeElement::new("p", "pale", "#eeeeee", "#ffffff")),
        );

        let (_, result, _) = run(&browser, true).await;
        let report = result.unwrap();

        assert!(report.contrast_checked);
        assert_eq!(report.contrast_violation_count(), 1);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_second_run_is_rejected_while_active() {
        let browser = FakeBrowser::new().with_page(SEED, FakePage::new());
        let orchestrator = orchestrator();
        orchestrator.transition(CrawlState::Visiting { current: 1, total: 3 });

        let (tx, _rx) = mpsc::unbounded_channel();
        let result = orchestrator
            .run(&options(false), browser.driver(), &tx, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CrawlError::AlreadyRunning)));
        assert_eq!(orchestrator.state(), CrawlState::Visiting { current: 1, total: 3 });
        assert_eq!(browser.close_count(), 1);
        assert!(browser.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_orchestrator_is_reusable_after_a_run() {
        let browser = FakeBrowser::new().with_page(SEED, FakePage::new());
        let orchestrator = orchestrator();
        let (tx, _rx) = mpsc::unbounded_channel();

        for _ in 0..2 {
            let report = orchestrator
                .run(&options(false), browser.driver(), &tx, &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(report.pages.len(), 1);
        }
        assert_eq!(browser.close_count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_fails_and_closes_session() {
        let browser = FakeBrowser::new().with_page(SEED, FakePage::new());
        let orchestrator = orchestrator();
        let (tx, _rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = orchestrator.run(&options(false), browser.driver(), &tx, &cancel).await;

        assert!(matches!(result, Err(CrawlError::Cancelled)));
        assert_eq!(orchestrator.state(), CrawlState::Failed);
        assert_eq!(browser.close_count(), 1);
    }

    #[tokio::test]
    async fn test_spawned_crawl_streams_events() {
        let browser = FakeBrowser::new()
            .with_page(SEED, FakePage::new().with_links(&["/about"]))
            .with_page("https://a.test/about", FakePage::new());
        let orchestrator = Arc::new(orchestrator());

        let mut handle = orchestrator.spawn(options(false), browser.driver());
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        handle.join().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], CrawlEvent::Progress(Progress { current: 1, total: 2, .. })));
        assert!(matches!(events[1], CrawlEvent::Progress(Progress { current: 2, total: 2, .. })));
        match &events[2] {
            CrawlEvent::Finished(report) => assert_eq!(report.pages.len(), 2),
            other => panic!("unexpected terminal event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawned_failure_has_summary_and_detail() {
        let browser = FakeBrowser::new().with_unreachable(SEED);
        let orchestrator = Arc::new(orchestrator());

        let mut handle = orchestrator.spawn(options(false), browser.driver());
        let event = handle.next_event().await.unwrap();
        assert!(handle.next_event().await.is_none());

        match event {
            CrawlEvent::Failed(failure) => {
                assert!(failure.summary.contains("failed to navigate to https://a.test/"));
                assert!(failure.detail.contains("net::ERR_NAME_NOT_RESOLVED"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(browser.close_count(), 1);
    }
}
