use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::monitor::error::{MonitorError, MonitorResult};
use crate::monitor::transport::{BeaconTransport, RequestTransport};

/// Beacon that replays scripted results and succeeds once the script runs out.
#[derive(Default)]
pub struct ScriptedBeacon {
    outcomes: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedBeacon {
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl BeaconTransport for ScriptedBeacon {
    fn try_send(&self, endpoint: &str, body: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body.to_string()));
        self.outcomes.lock().unwrap().pop_front().unwrap_or(true)
    }
}

#[derive(Clone, Debug)]
struct RecordedRequest {
    body: String,
    timeout: Duration,
}

/// Request transport that replays scripted results. Once the script runs out it answers with
/// `fallback`, which defaults to success.
#[derive(Default)]
pub struct ScriptedRequest {
    outcomes: Mutex<VecDeque<MonitorResult<()>>>,
    fallback: Option<MonitorError>,
    calls: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedRequest {
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = MonitorResult<()>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn always_failing(error: MonitorError) -> Self {
        Self {
            fallback: Some(error),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.body.clone())
            .collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.timeout)
            .collect()
    }
}

#[async_trait]
impl RequestTransport for ScriptedRequest {
    async fn send(&self, _endpoint: &str, body: String, timeout: Duration) -> MonitorResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedRequest { body, timeout });
        match self.outcomes.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => match &self.fallback {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            },
        }
    }
}
