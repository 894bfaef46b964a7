//! Wires host load and navigation signals to readiness polling and reporting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::monitor::dispatcher::{to_payload, DropReason, ReportOutcome, Reporter};
use crate::monitor::types::ReportCategory;
use crate::performance::metrics::MetricsExtractor;
use crate::performance::navigation::{NavigationWatcher, RouteChange};
use crate::performance::poller::ReadinessPoller;
use crate::platform::host::PageHost;
use crate::platform::runtime;

#[derive(Clone)]
pub struct PerformanceCollector {
    inner: Arc<CollectorInner>,
}

struct CollectorInner {
    host: Arc<dyn PageHost>,
    extractor: MetricsExtractor,
    reporter: Reporter,
    poller: ReadinessPoller,
    watcher: NavigationWatcher,
    initial_started: AtomicBool,
}

impl PerformanceCollector {
    pub fn new(host: Arc<dyn PageHost>, reporter: Reporter, poller: ReadinessPoller) -> Self {
        let watcher = NavigationWatcher::new(host.current_location());
        Self {
            inner: Arc::new(CollectorInner {
                extractor: MetricsExtractor::new(host.clone()),
                host,
                reporter,
                poller,
                watcher,
                initial_started: AtomicBool::new(false),
            }),
        }
    }

    /// Schedules initial-load collection (now if the page already loaded, otherwise on load)
    /// and starts watching for route changes.
    pub fn install(&self) {
        let host = &self.inner.host;
        if host.is_already_complete() {
            self.schedule_initial();
        } else {
            let collector = self.clone();
            host.on_load_complete(Box::new(move || collector.schedule_initial()));
        }

        let collector = self.clone();
        host.on_location_mutated(Box::new(move |()| collector.handle_mutation()));
    }

    fn schedule_initial(&self) {
        if self.inner.initial_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let collector = self.clone();
        runtime::spawn_detached(async move {
            collector.collect_initial().await;
        });
    }

    fn handle_mutation(&self) {
        let location = self.inner.host.current_location();
        if let Some(change) = self.inner.watcher.observe(&location, self.inner.host.now_ms()) {
            log::debug!("route changed from {} to {}", change.from, change.to);
            let collector = self.clone();
            runtime::spawn_detached(async move {
                collector.collect_route_change(change).await;
            });
        }
    }

    /// Polls for initial-load metrics and reports them. Returns `None` when the host never
    /// produced timing data within the poll budget.
    pub async fn collect_initial(&self) -> Option<ReportOutcome> {
        let extractor = &self.inner.extractor;
        let metrics = self
            .inner
            .poller
            .poll(|| extractor.initial_metrics())
            .await
            .into_value()?;
        log::debug!("initial metrics: {metrics:?}");
        Some(self.report_metrics(&metrics).await)
    }

    /// Waits for the page to settle after `change` and reports route-change metrics.
    pub async fn collect_route_change(&self, change: RouteChange) -> Option<ReportOutcome> {
        let host = &self.inner.host;
        let extractor = &self.inner.extractor;
        let metrics = self
            .inner
            .poller
            .poll(|| {
                host.is_already_complete()
                    .then(|| extractor.route_change_metrics(change.started_at_ms))
            })
            .await
            .into_value()?;
        log::debug!("route change metrics for {}: {metrics:?}", change.to);
        Some(self.report_metrics(&metrics).await)
    }

    async fn report_metrics<T: serde::Serialize>(&self, metrics: &T) -> ReportOutcome {
        match to_payload(metrics) {
            Ok(payload) => {
                self.inner
                    .reporter
                    .report(ReportCategory::Performance, payload)
                    .await
            }
            Err(err) => {
                log::error!("{err}");
                ReportOutcome::Dropped(DropReason::Serialization)
            }
        }
    }
}
