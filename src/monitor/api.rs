use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use serde_json::{Map, Value};

use crate::monitor::config::{MonitorConfig, ReportHook};
use crate::monitor::dispatcher::{ReportOutcome, Reporter};
use crate::monitor::error::MonitorResult;
use crate::monitor::transport::HostBindings;
use crate::monitor::types::{
    ClickData, CommonData, ErrorData, ModuleExposeData, PromiseErrorData, ReportCategory,
};
use crate::performance::{PerformanceCollector, ReadinessPoller};
use crate::platform::host::{PageHost, RejectionInfo, ResourceErrorInfo, RuntimeErrorInfo};

static INSTANCE: LazyLock<Mutex<Option<Monitor>>> = LazyLock::new(|| Mutex::new(None));

fn instance_guard() -> MutexGuard<'static, Option<Monitor>> {
    INSTANCE.lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Telemetry agent attached to one page.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    host: Arc<dyn PageHost>,
    reporter: Reporter,
    performance: Option<PerformanceCollector>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("report_url", &self.inner.config.report_url)
            .field("app_id", &self.inner.config.app_id)
            .finish()
    }
}

impl Monitor {
    /// Validates `config`, then builds the monitor and registers its host listeners.
    fn build(config: MonitorConfig, bindings: HostBindings) -> MonitorResult<Self> {
        config.validate()?;

        let reporter = Reporter::new(&config, &bindings);
        let performance = config.enable_performance.then(|| {
            PerformanceCollector::new(
                bindings.host.clone(),
                reporter.clone(),
                ReadinessPoller::from_config(&config),
            )
        });
        let monitor = Self {
            inner: Arc::new(MonitorInner {
                config,
                host: bindings.host,
                reporter,
                performance,
            }),
        };
        monitor.start();
        Ok(monitor)
    }

    fn start(&self) {
        if let Some(performance) = &self.inner.performance {
            performance.install();
        }
        if self.inner.config.enable_error {
            self.install_error_listeners();
        }
    }

    fn install_error_listeners(&self) {
        let host = &self.inner.host;

        let monitor = self.clone();
        host.on_runtime_error(Box::new(move |info| {
            let payload = monitor.runtime_error_payload(info);
            monitor
                .inner
                .reporter
                .report_detached(ReportCategory::Error, payload);
        }));

        let monitor = self.clone();
        host.on_unhandled_rejection(Box::new(move |info| {
            let payload = monitor.rejection_payload(info);
            monitor
                .inner
                .reporter
                .report_detached(ReportCategory::PromiseError, payload);
        }));

        let monitor = self.clone();
        host.on_resource_load_error(Box::new(move |info| {
            let payload = monitor.resource_error_payload(info);
            monitor
                .inner
                .reporter
                .report_detached(ReportCategory::ResourceError, payload);
        }));
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// The performance collector, absent when performance collection is disabled.
    pub fn performance(&self) -> Option<&PerformanceCollector> {
        self.inner.performance.as_ref()
    }

    pub async fn click_report(&self, data: &ClickData, hook: Option<&ReportHook>) -> ReportOutcome {
        self.inner
            .reporter
            .report_data(ReportCategory::Click, data, hook)
            .await
    }

    pub async fn error_report(&self, data: &ErrorData, hook: Option<&ReportHook>) -> ReportOutcome {
        self.inner
            .reporter
            .report_data(ReportCategory::Error, data, hook)
            .await
    }

    pub async fn promise_error_report(
        &self,
        data: &PromiseErrorData,
        hook: Option<&ReportHook>,
    ) -> ReportOutcome {
        self.inner
            .reporter
            .report_data(ReportCategory::PromiseError, data, hook)
            .await
    }

    pub async fn page_view(&self, data: &CommonData, hook: Option<&ReportHook>) -> ReportOutcome {
        self.inner
            .reporter
            .report_data(ReportCategory::PageView, data, hook)
            .await
    }

    pub async fn page_view_out(
        &self,
        data: &CommonData,
        hook: Option<&ReportHook>,
    ) -> ReportOutcome {
        self.inner
            .reporter
            .report_data(ReportCategory::PageViewOut, data, hook)
            .await
    }

    pub async fn module_expose(
        &self,
        data: &ModuleExposeData,
        hook: Option<&ReportHook>,
    ) -> ReportOutcome {
        self.inner
            .reporter
            .report_data(ReportCategory::ModuleExpose, data, hook)
            .await
    }

    /// Reports an arbitrary payload under the category named `category`. Names outside the
    /// known category set are logged and dropped.
    pub async fn report_custom(
        &self,
        category: &str,
        payload: Value,
        hook: Option<&ReportHook>,
    ) -> ReportOutcome {
        self.inner
            .reporter
            .report_named(category, payload, hook)
            .await
    }

    fn runtime_error_payload(&self, info: RuntimeErrorInfo) -> Value {
        let mut fields = self.inner.config.identity_fields();
        fields.insert("message".into(), Value::String(info.message));
        insert_opt(&mut fields, "fileName", info.file_name);
        insert_opt(&mut fields, "lineNo", info.line_no);
        insert_opt(&mut fields, "colNo", info.col_no);
        insert_opt(&mut fields, "error", info.stack_text);
        Value::Object(fields)
    }

    fn rejection_payload(&self, info: RejectionInfo) -> Value {
        let mut fields = self.inner.config.identity_fields();
        fields.insert("message".into(), Value::String(info.message));
        insert_opt(&mut fields, "stack", info.stack_text);
        Value::Object(fields)
    }

    fn resource_error_payload(&self, info: ResourceErrorInfo) -> Value {
        let mut fields = self.inner.config.identity_fields();
        fields.insert("tagName".into(), Value::String(info.tag_name));
        insert_opt(&mut fields, "src", info.source_url);
        Value::Object(fields)
    }
}

fn insert_opt<T: Into<Value>>(fields: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value.into());
    }
}

/// Creates the page's monitor, or returns the existing one.
///
/// The configuration is validated before anything else happens: a missing `report_url` fails
/// without registering listeners or recording an instance. Once a monitor exists, later calls
/// return it unchanged and their arguments are ignored.
pub fn initialize_monitor(config: MonitorConfig, bindings: HostBindings) -> MonitorResult<Monitor> {
    config.validate()?;

    let mut guard = instance_guard();
    if let Some(existing) = guard.as_ref() {
        log::debug!("monitor already initialized; ignoring new configuration");
        return Ok(existing.clone());
    }

    let monitor = Monitor::build(config, bindings)?;
    *guard = Some(monitor.clone());
    Ok(monitor)
}

/// Returns the page's monitor if one has been initialized.
pub fn get_monitor() -> Option<Monitor> {
    instance_guard().clone()
}
