#![doc = include_str!("README.md")]
mod instrumentation;
mod metrics;
mod navigation;
mod poller;

#[doc(inline)]
pub use instrumentation::PerformanceCollector;

#[doc(inline)]
pub use metrics::{MetricsExtractor, PerformanceMetrics, RouteChangeMetrics};

#[doc(inline)]
pub use navigation::{NavigationWatcher, RouteChange};

#[doc(inline)]
pub use poller::{PollOutcome, ReadinessPoller};
