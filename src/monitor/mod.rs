#![doc = include_str!("README.md")]
pub(crate) mod api;
pub(crate) mod config;
pub(crate) mod constants;
pub(crate) mod delivery;
pub(crate) mod dispatcher;
pub mod error;
pub(crate) mod transport;
pub(crate) mod types;

#[doc(inline)]
pub use api::{get_monitor, initialize_monitor, Monitor};

#[doc(inline)]
pub use config::{DeployEnv, FailureCallback, MonitorConfig, ReportHook};

#[doc(inline)]
pub use constants::{
    DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_ATTEMPTS, DEFAULT_REPORT_TIMEOUT,
    DEFAULT_RETRY_BACKOFF, DEFAULT_RETRY_CEILING, DEFAULT_SAMPLING_RATE,
};

#[doc(inline)]
pub use delivery::{DeliveryEngine, DeliveryOutcome, RetryPolicy, TransportKind};

#[doc(inline)]
pub use dispatcher::{DropReason, ReportOutcome, Reporter};

#[doc(inline)]
pub use error::{MonitorError, MonitorErrorCode, MonitorResult};

#[doc(inline)]
pub use transport::{BeaconTransport, HostBindings, HttpRequestTransport, RequestTransport};

#[doc(inline)]
pub use types::{
    ClickData, CommonData, ErrorData, ModuleExposeData, PromiseErrorData, ReportCategory,
    ReportEnvelope,
};
