use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::monitor::constants::{
    DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_ATTEMPTS, DEFAULT_REPORT_TIMEOUT,
    DEFAULT_RETRY_BACKOFF, DEFAULT_RETRY_CEILING, DEFAULT_SAMPLING_RATE,
};
use crate::monitor::error::{invalid_argument, MonitorError, MonitorResult};
use crate::platform::environment::default_monitor_config_json;

/// Payload transform applied right before an envelope is built.
///
/// The transform receives the payload and returns the value that will actually be sent; its
/// output is passed through unchecked.
#[derive(Clone)]
pub struct ReportHook(Arc<dyn Fn(Value) -> Value + Send + Sync + 'static>);

impl ReportHook {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(transform))
    }

    pub fn apply(&self, payload: Value) -> Value {
        (self.0)(payload)
    }
}

/// The identity transform.
impl Default for ReportHook {
    fn default() -> Self {
        Self::new(|payload| payload)
    }
}

impl fmt::Debug for ReportHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReportHook(..)")
    }
}

/// Invoked once with the terminal error when a report exhausts its delivery attempts.
#[derive(Clone)]
pub struct FailureCallback(Arc<dyn Fn(&MonitorError) + Send + Sync + 'static>);

impl FailureCallback {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&MonitorError) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    pub fn call(&self, error: &MonitorError) {
        (self.0)(error)
    }
}

impl fmt::Debug for FailureCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FailureCallback(..)")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnv {
    Dev,
    Test,
    Prod,
}

impl DeployEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployEnv::Dev => "dev",
            DeployEnv::Test => "test",
            DeployEnv::Prod => "prod",
        }
    }
}

/// Monitor configuration. Read-only once the monitor is constructed.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Collector endpoint. Required.
    pub report_url: String,
    pub app_id: Option<String>,
    pub page_id: Option<String>,
    pub biz_type: Option<String>,
    pub env: Option<DeployEnv>,
    pub version: Option<String>,
    pub enable_performance: bool,
    pub enable_error: bool,
    /// Per-attempt timeout of the request/response transport.
    pub report_timeout: Duration,
    /// Probability in `[0, 1]` that a report is transmitted.
    pub sampling: f64,
    /// Number of retries after the first failed delivery attempt.
    pub retry_ceiling: u32,
    pub retry_backoff: Duration,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
    pub before_report: Option<ReportHook>,
    pub on_error: Option<FailureCallback>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_url: String::new(),
            app_id: None,
            page_id: None,
            biz_type: None,
            env: None,
            version: None,
            enable_performance: true,
            enable_error: true,
            report_timeout: DEFAULT_REPORT_TIMEOUT,
            sampling: DEFAULT_SAMPLING_RATE,
            retry_ceiling: DEFAULT_RETRY_CEILING,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            before_report: None,
            on_error: None,
        }
    }
}

impl MonitorConfig {
    pub fn new(report_url: impl Into<String>) -> Self {
        Self {
            report_url: report_url.into(),
            ..Default::default()
        }
    }

    /// Builds a configuration from `__MONITOR_DEFAULTS__`, when the variable is set.
    pub fn from_environment() -> MonitorResult<Option<Self>> {
        match default_monitor_config_json() {
            Some(overrides) => Self::default().merge_json(&overrides).map(Some),
            None => Ok(None),
        }
    }

    /// Overlays camelCase JSON overrides on top of this configuration.
    pub fn merge_json(mut self, overrides: &Map<String, Value>) -> MonitorResult<Self> {
        let parsed: ConfigOverrides =
            serde_json::from_value(Value::Object(overrides.clone()))
                .map_err(|err| invalid_argument(format!("invalid monitor configuration: {err}")))?;

        if let Some(report_url) = parsed.report_url {
            self.report_url = report_url;
        }
        self.app_id = parsed.app_id.or(self.app_id);
        self.page_id = parsed.page_id.or(self.page_id);
        self.biz_type = parsed.biz_type.or(self.biz_type);
        self.env = parsed.env.or(self.env);
        self.version = parsed.version.or(self.version);
        if let Some(enabled) = parsed.enable_performance {
            self.enable_performance = enabled;
        }
        if let Some(enabled) = parsed.enable_error {
            self.enable_error = enabled;
        }
        if let Some(ms) = parsed.report_timeout {
            self.report_timeout = Duration::from_millis(ms);
        }
        if let Some(rate) = parsed.sampling {
            self.sampling = rate;
        }
        if let Some(count) = parsed.retry_count {
            self.retry_ceiling = count;
        }
        if let Some(ms) = parsed.retry_delay {
            self.retry_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed.poll_interval {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = parsed.poll_max_attempts {
            self.poll_max_attempts = attempts;
        }
        Ok(self)
    }

    pub fn with_before_report(mut self, hook: ReportHook) -> Self {
        self.before_report = Some(hook);
        self
    }

    pub fn with_on_error(mut self, callback: FailureCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    /// Checks the invariants that must hold before a monitor is constructed.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.report_url.trim().is_empty() {
            return Err(invalid_argument("reportUrl is required"));
        }
        if !self.sampling.is_finite() || !(0.0..=1.0).contains(&self.sampling) {
            return Err(invalid_argument(format!(
                "sampling must be within [0, 1], got {}",
                self.sampling
            )));
        }
        Ok(())
    }

    /// Identity fields merged into host error reports.
    pub(crate) fn identity_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        let entries = [
            ("appId", self.app_id.as_deref()),
            ("pageId", self.page_id.as_deref()),
            ("bizType", self.biz_type.as_deref()),
            ("env", self.env.as_ref().map(DeployEnv::as_str)),
            ("version", self.version.as_deref()),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        fields
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOverrides {
    report_url: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    app_id: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    page_id: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    biz_type: Option<String>,
    env: Option<DeployEnv>,
    #[serde(default, deserialize_with = "text_or_number")]
    version: Option<String>,
    enable_performance: Option<bool>,
    enable_error: Option<bool>,
    report_timeout: Option<u64>,
    sampling: Option<f64>,
    retry_count: Option<u32>,
    retry_delay: Option<u64>,
    poll_interval: Option<u64>,
    poll_max_attempts: Option<u32>,
}

/// Identity values such as `appId=10086` arrive as numbers from `key=value` sources.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        String(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Text>::deserialize(deserializer)?.map(|text| match text {
        Text::String(value) => value,
        Text::Number(value) => value.to_string(),
    }))
}
