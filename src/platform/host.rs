//! Narrow observation interface over the page the monitor is embedded in.
//!
//! The monitor never reaches into window/document globals directly. Everything it needs from
//! the page goes through [`PageHost`], which the wasm build implements over `web-sys` and tests
//! implement with an in-memory fake.

/// Callback invoked for every occurrence of a host notification.
pub type HostCallback<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

/// Callback invoked at most once, when the page finishes loading.
pub type LoadCallback = Box<dyn FnOnce() + Send + 'static>;

/// A `paint` entry from the performance timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintMark {
    pub name: String,
    pub start_time: f64,
}

impl PaintMark {
    pub fn new(name: impl Into<String>, start_time: f64) -> Self {
        Self {
            name: name.into(),
            start_time,
        }
    }
}

/// The subset of the last navigation timing entry used to build metrics, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NavigationTiming {
    pub domain_lookup_start: f64,
    pub domain_lookup_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    pub dom_complete: f64,
    pub load_event_end: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeErrorInfo {
    pub message: String,
    pub file_name: Option<String>,
    pub line_no: Option<u32>,
    pub col_no: Option<u32>,
    pub stack_text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RejectionInfo {
    pub message: String,
    pub stack_text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceErrorInfo {
    pub tag_name: String,
    pub source_url: Option<String>,
}

/// Signals and timing data provided by the page.
///
/// Registration methods may be called once per monitor; implementations keep the callbacks
/// alive for the lifetime of the page.
pub trait PageHost: Send + Sync {
    /// Most recent `paint` marks.
    fn paint_marks(&self) -> Vec<PaintMark>;

    /// The last recorded navigation timing entry, if the page has produced one yet.
    fn last_navigation_timing(&self) -> Option<NavigationTiming>;

    /// Drops buffered resource timing entries.
    fn clear_timing_buffer(&self);

    /// High resolution monotonic clock in milliseconds.
    fn now_ms(&self) -> f64;

    /// Whether the page has already finished loading.
    fn is_already_complete(&self) -> bool;

    fn on_load_complete(&self, callback: LoadCallback);

    fn on_runtime_error(&self, callback: HostCallback<RuntimeErrorInfo>);

    fn on_unhandled_rejection(&self, callback: HostCallback<RejectionInfo>);

    fn on_resource_load_error(&self, callback: HostCallback<ResourceErrorInfo>);

    /// Fires whenever the page mutates in a way that may accompany a location change.
    fn on_location_mutated(&self, callback: HostCallback<()>);

    fn current_location(&self) -> String;
}
