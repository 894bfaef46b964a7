use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::monitor::config::{MonitorConfig, ReportHook};
use crate::monitor::delivery::{DeliveryEngine, DeliveryOutcome};
use crate::monitor::error::{internal_error, MonitorError};
use crate::monitor::transport::HostBindings;
use crate::monitor::types::{ReportCategory, ReportEnvelope};
use crate::platform::runtime;

/// Why a report never reached the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    UnknownCategory,
    Sampled,
    Serialization,
}

/// What happened to a single report.
#[derive(Clone, Debug, PartialEq)]
pub enum ReportOutcome {
    Dropped(DropReason),
    Delivered { attempts: u32 },
    Exhausted { attempts: u32, error: MonitorError },
}

impl ReportOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ReportOutcome::Delivered { .. })
    }
}

impl From<DeliveryOutcome> for ReportOutcome {
    fn from(outcome: DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::Delivered { attempts } => ReportOutcome::Delivered { attempts },
            DeliveryOutcome::Exhausted { attempts, error } => {
                ReportOutcome::Exhausted { attempts, error }
            }
        }
    }
}

/// The single path every report takes before hitting the network: category check, sampling,
/// payload transform, envelope construction and delivery.
#[derive(Clone)]
pub struct Reporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    sampling: f64,
    before_report: Option<ReportHook>,
    delivery: DeliveryEngine,
}

impl Reporter {
    pub fn new(config: &MonitorConfig, bindings: &HostBindings) -> Self {
        Self {
            inner: Arc::new(ReporterInner {
                sampling: config.sampling,
                before_report: config.before_report.clone(),
                delivery: DeliveryEngine::new(config, bindings),
            }),
        }
    }

    pub async fn report(&self, category: ReportCategory, payload: Value) -> ReportOutcome {
        self.report_with(category, payload, None).await
    }

    /// Reports `payload`, applying `hook` instead of the configured transform when provided.
    pub async fn report_with(
        &self,
        category: ReportCategory,
        payload: Value,
        hook: Option<&ReportHook>,
    ) -> ReportOutcome {
        let sampled = should_sample(self.inner.sampling, &mut rand::thread_rng());
        if !sampled {
            return ReportOutcome::Dropped(DropReason::Sampled);
        }

        let payload = match hook.or(self.inner.before_report.as_ref()) {
            Some(hook) => hook.apply(payload),
            None => payload,
        };

        let envelope = ReportEnvelope::now(category, payload);
        log::debug!("report envelope: {envelope:?}");

        let body = match serde_json::to_string(&envelope) {
            Ok(body) => body,
            Err(err) => {
                log::error!("failed to serialize {category} report: {err}");
                return ReportOutcome::Dropped(DropReason::Serialization);
            }
        };

        self.inner.delivery.deliver(&body).await.into()
    }

    /// Reports under a category given by its wire name. Unknown names are dropped.
    pub async fn report_named(
        &self,
        category: &str,
        payload: Value,
        hook: Option<&ReportHook>,
    ) -> ReportOutcome {
        match category.parse::<ReportCategory>() {
            Ok(category) => self.report_with(category, payload, hook).await,
            Err(err) => {
                log::error!("{err}");
                ReportOutcome::Dropped(DropReason::UnknownCategory)
            }
        }
    }

    /// Serializes a typed payload and reports it.
    pub async fn report_data<T>(
        &self,
        category: ReportCategory,
        data: &T,
        hook: Option<&ReportHook>,
    ) -> ReportOutcome
    where
        T: Serialize + ?Sized,
    {
        match to_payload(data) {
            Ok(payload) => self.report_with(category, payload, hook).await,
            Err(err) => {
                log::error!("{err}");
                ReportOutcome::Dropped(DropReason::Serialization)
            }
        }
    }

    /// Reports in the background; used for notifications the host raises synchronously.
    pub fn report_detached(&self, category: ReportCategory, payload: Value) {
        let reporter = self.clone();
        runtime::spawn_detached(async move {
            reporter.report(category, payload).await;
        });
    }
}

pub(crate) fn to_payload<T>(data: &T) -> Result<Value, MonitorError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(data)
        .map_err(|err| internal_error(format!("failed to serialize report payload: {err}")))
}

/// A report survives sampling when a uniform draw from `[0, 1)` falls below `rate`, so a rate of
/// `0` never transmits and a rate of `1` always does.
fn should_sample<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> bool {
    rng.gen::<f64>() < rate
}
