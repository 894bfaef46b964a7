use std::sync::Arc;
use std::time::Duration;

use crate::monitor::config::{FailureCallback, MonitorConfig};
use crate::monitor::error::{network_error, MonitorError};
use crate::monitor::transport::{BeaconTransport, HostBindings, RequestTransport};
use crate::platform::runtime;

/// How many times a failed envelope is retried and how long to wait in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_ceiling: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            retry_ceiling: config.retry_ceiling,
            backoff: config.retry_backoff,
        }
    }
}

/// Transport chosen for one delivery attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    Beacon,
    Request,
}

/// Terminal result of delivering one serialized envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Exhausted { attempts: u32, error: MonitorError },
}

impl DeliveryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } | DeliveryOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

#[derive(Debug)]
enum DeliveryState {
    Attempting(u32),
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32, error: MonitorError },
}

/// Sends envelopes through the beacon channel when the host has one, otherwise through the
/// request/response channel, retrying failures with a fixed backoff.
#[derive(Clone)]
pub struct DeliveryEngine {
    endpoint: String,
    beacon: Option<Arc<dyn BeaconTransport>>,
    request: Arc<dyn RequestTransport>,
    timeout: Duration,
    policy: RetryPolicy,
    on_failure: Option<FailureCallback>,
}

impl DeliveryEngine {
    pub fn new(config: &MonitorConfig, bindings: &HostBindings) -> Self {
        Self {
            endpoint: config.report_url.clone(),
            beacon: bindings.beacon.clone(),
            request: bindings.request.clone(),
            timeout: config.report_timeout,
            policy: RetryPolicy::from_config(config),
            on_failure: config.on_error.clone(),
        }
    }

    pub fn transport_kind(&self) -> TransportKind {
        if self.beacon.is_some() {
            TransportKind::Beacon
        } else {
            TransportKind::Request
        }
    }

    /// Runs the delivery state machine for one serialized envelope.
    ///
    /// The failure callback fires exactly once, when the retry budget is spent. Delivery errors
    /// never propagate to the caller.
    pub async fn deliver(&self, body: &str) -> DeliveryOutcome {
        let mut state = DeliveryState::Attempting(0);
        loop {
            state = match state {
                DeliveryState::Attempting(attempt) => match self.attempt(body).await {
                    Ok(()) => DeliveryState::Succeeded {
                        attempts: attempt + 1,
                    },
                    Err(err) if attempt < self.policy.retry_ceiling => {
                        log::warn!("report attempt {} failed: {err}; retrying", attempt + 1);
                        runtime::sleep(self.policy.backoff).await;
                        DeliveryState::Attempting(attempt + 1)
                    }
                    Err(error) => DeliveryState::Exhausted {
                        attempts: attempt + 1,
                        error,
                    },
                },
                DeliveryState::Succeeded { attempts } => {
                    return DeliveryOutcome::Delivered { attempts };
                }
                DeliveryState::Exhausted { attempts, error } => {
                    log::error!("failed to report after {attempts} attempts: {error}");
                    if let Some(callback) = &self.on_failure {
                        callback.call(&error);
                    }
                    return DeliveryOutcome::Exhausted { attempts, error };
                }
            };
        }
    }

    async fn attempt(&self, body: &str) -> Result<(), MonitorError> {
        match &self.beacon {
            Some(beacon) => {
                if beacon.try_send(&self.endpoint, body) {
                    Ok(())
                } else {
                    Err(network_error("beacon rejected the report"))
                }
            }
            None => {
                self.request
                    .send(&self.endpoint, body.to_string(), self.timeout)
                    .await
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::monitor::error::{timeout_error, MonitorErrorCode};
    use crate::test_support::{FakeHost, ScriptedBeacon, ScriptedRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine(
        config: MonitorConfig,
        beacon: Option<Arc<ScriptedBeacon>>,
        request: Arc<ScriptedRequest>,
    ) -> DeliveryEngine {
        let mut bindings = HostBindings::new(Arc::new(FakeHost::new("https://app.example/")))
            .with_request_transport(request);
        if let Some(beacon) = beacon {
            bindings = bindings.with_beacon(beacon);
        }
        DeliveryEngine::new(&config, &bindings)
    }

    fn counting_callback() -> (FailureCallback, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let callback = FailureCallback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (callback, calls)
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn prefers_beacon_when_available() {
        let beacon = Arc::new(ScriptedBeacon::default());
        let request = Arc::new(ScriptedRequest::default());
        let engine = engine(
            MonitorConfig::new("/collect"),
            Some(beacon.clone()),
            request.clone(),
        );

        assert_eq!(engine.transport_kind(), TransportKind::Beacon);
        let outcome = engine.deliver("{}").await;
        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 1 });
        assert_eq!(beacon.calls(), vec![("/collect".to_string(), "{}".to_string())]);
        assert_eq!(request.call_count(), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn rejected_beacon_counts_as_failed_attempt() {
        let beacon = Arc::new(ScriptedBeacon::with_outcomes([false, true]));
        let engine = engine(
            MonitorConfig::new("/collect"),
            Some(beacon.clone()),
            Arc::new(ScriptedRequest::default()),
        );

        let outcome = engine.deliver("{}").await;
        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 2 });
        assert_eq!(beacon.call_count(), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn falls_back_to_request_transport_with_configured_timeout() {
        let request = Arc::new(ScriptedRequest::default());
        let config = MonitorConfig {
            report_timeout: Duration::from_millis(1_234),
            ..MonitorConfig::new("https://collect.example/report")
        };
        let engine = engine(config, None, request.clone());

        assert_eq!(engine.transport_kind(), TransportKind::Request);
        assert!(engine.deliver("{\"type\":\"click\"}").await.is_delivered());
        assert_eq!(request.timeouts(), vec![Duration::from_millis(1_234)]);
        assert_eq!(request.bodies(), vec!["{\"type\":\"click\"}".to_string()]);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn succeeds_on_third_attempt_without_failure_callback() {
        let request = Arc::new(ScriptedRequest::with_outcomes([
            Err(network_error("HTTP Error: 500")),
            Err(timeout_error("report request timed out after 5000ms")),
            Ok(()),
        ]));
        let (callback, failures) = counting_callback();
        let engine = engine(
            MonitorConfig::new("/collect").with_on_error(callback),
            None,
            request.clone(),
        );

        let outcome = engine.deliver("{}").await;
        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 3 });
        assert_eq!(request.call_count(), 3);
        assert_eq!(failures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn exhausts_after_retry_ceiling_and_notifies_once() {
        let request = Arc::new(ScriptedRequest::with_outcomes([
            Err(network_error("HTTP Error: 502")),
            Err(network_error("HTTP Error: 502")),
            Err(network_error("HTTP Error: 502")),
            Err(network_error("HTTP Error: 503")),
            Ok(()),
        ]));
        let (callback, failures) = counting_callback();
        let engine = engine(
            MonitorConfig::new("/collect").with_on_error(callback),
            None,
            request.clone(),
        );

        let outcome = engine.deliver("{}").await;
        match outcome {
            DeliveryOutcome::Exhausted { attempts, error } => {
                assert_eq!(attempts, 4);
                assert_eq!(error.code, MonitorErrorCode::Network);
                assert!(error.message().contains("503"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(request.call_count(), 4);
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn waits_fixed_backoff_between_attempts() {
        let request = Arc::new(ScriptedRequest::with_outcomes([
            Err(network_error("HTTP Error: 500")),
            Err(network_error("HTTP Error: 500")),
            Ok(()),
        ]));
        let engine = engine(MonitorConfig::new("/collect"), None, request);

        let started = tokio::time::Instant::now();
        engine.deliver("{}").await;
        assert_eq!(started.elapsed(), Duration::from_millis(2_000));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn zero_ceiling_allows_single_attempt() {
        let request = Arc::new(ScriptedRequest::with_outcomes([
            Err(network_error("HTTP Error: 500")),
            Ok(()),
        ]));
        let config = MonitorConfig {
            retry_ceiling: 0,
            ..MonitorConfig::new("/collect")
        };
        let engine = engine(config, None, request.clone());

        assert_eq!(engine.deliver("{}").await.attempts(), 1);
        assert_eq!(request.call_count(), 1);
    }
}
