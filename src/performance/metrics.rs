use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::monitor::constants::{FIRST_PAINT_MARK, MISSING_PAINT_SENTINEL};
use crate::platform::host::{NavigationTiming, PageHost, PaintMark};

/// Load metrics in whole milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub dns_find_time: i64,
    pub tcp_connect_time: i64,
    /// Start of the `first-paint` mark, or `-1` when the host never painted.
    pub white_screen_time: i64,
    pub dom_completion_time: i64,
    pub page_load_time: i64,
}

impl PerformanceMetrics {
    pub fn from_timing(timing: &NavigationTiming, paint_marks: &[PaintMark]) -> Self {
        let white_screen_time = paint_marks
            .iter()
            .find(|mark| mark.name == FIRST_PAINT_MARK)
            .map(|mark| round_ms(mark.start_time))
            .unwrap_or(MISSING_PAINT_SENTINEL);

        Self {
            dns_find_time: round_ms(timing.domain_lookup_end - timing.domain_lookup_start),
            tcp_connect_time: round_ms(timing.connect_end - timing.connect_start),
            white_screen_time,
            dom_completion_time: round_ms(timing.dom_complete),
            page_load_time: round_ms(timing.load_event_end),
        }
    }
}

/// Metrics measured after an in-page route change. Fields that cannot be re-measured after a
/// soft navigation are omitted rather than zero-filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteChangeMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_find_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_connect_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_screen_time: Option<i64>,
    pub dom_completion_time: i64,
    pub page_load_time: i64,
    pub route_change_time: i64,
}

impl RouteChangeMetrics {
    pub fn new(base: Option<PerformanceMetrics>, elapsed_ms: f64) -> Self {
        let elapsed = round_ms(elapsed_ms);
        Self {
            dns_find_time: base.map(|m| m.dns_find_time),
            tcp_connect_time: base.map(|m| m.tcp_connect_time),
            white_screen_time: base.map(|m| m.white_screen_time),
            dom_completion_time: elapsed,
            page_load_time: elapsed,
            route_change_time: elapsed,
        }
    }
}

/// Reads timing data from the host and turns it into metrics records.
#[derive(Clone)]
pub struct MetricsExtractor {
    host: Arc<dyn PageHost>,
}

impl MetricsExtractor {
    pub fn new(host: Arc<dyn PageHost>) -> Self {
        Self { host }
    }

    fn base_metrics(&self) -> Option<PerformanceMetrics> {
        let timing = self.host.last_navigation_timing()?;
        Some(PerformanceMetrics::from_timing(
            &timing,
            &self.host.paint_marks(),
        ))
    }

    /// Initial-load metrics, or `None` while the host has no navigation timing entry yet.
    ///
    /// Clears the host's timing buffer after a successful read.
    pub fn initial_metrics(&self) -> Option<PerformanceMetrics> {
        let metrics = self.base_metrics()?;
        self.host.clear_timing_buffer();
        Some(metrics)
    }

    /// Route-change metrics for a transition that started at `start_ms` on the host clock.
    pub fn route_change_metrics(&self, start_ms: f64) -> RouteChangeMetrics {
        let elapsed = (self.host.now_ms() - start_ms).max(0.0);
        let metrics = RouteChangeMetrics::new(self.base_metrics(), elapsed);
        self.host.clear_timing_buffer();
        metrics
    }
}

fn round_ms(value: f64) -> i64 {
    value.round() as i64
}
