use std::time::Duration;

pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_SAMPLING_RATE: f64 = 1.0;
pub const DEFAULT_RETRY_CEILING: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(1_000);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 20;

/// Paint mark whose start time is reported as the white screen time.
pub const FIRST_PAINT_MARK: &str = "first-paint";
/// Reported in place of a paint time when the host produced no `first-paint` mark.
pub const MISSING_PAINT_SENTINEL: i64 = -1;

pub const JSON_CONTENT_TYPE: &str = "application/json";
