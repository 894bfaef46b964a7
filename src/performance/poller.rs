use std::time::Duration;

use crate::monitor::config::MonitorConfig;
use crate::platform::runtime;

/// Result of one readiness-poll cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome<T> {
    /// The extractor produced a value on attempt number `attempts`.
    Ready { value: T, attempts: u32 },
    /// Every attempt missed. Not an error: the caller skips this cycle.
    GaveUp { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::GaveUp { attempts } => *attempts,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            PollOutcome::Ready { value, .. } => Some(value),
            PollOutcome::GaveUp { .. } => None,
        }
    }
}

enum PollState<T> {
    Attempting(u32),
    Ready { value: T, attempts: u32 },
    GaveUp { attempts: u32 },
}

/// Samples an extractor until it yields a value or the attempt budget runs out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadinessPoller {
    interval: Duration,
    max_attempts: u32,
}

impl ReadinessPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.poll_interval, config.poll_max_attempts)
    }

    /// Runs one cycle. The first attempt is deferred to the next scheduling turn; later ones
    /// are spaced by the poll interval. Attempts within a cycle never overlap.
    pub async fn poll<T, F>(&self, mut extract: F) -> PollOutcome<T>
    where
        F: FnMut() -> Option<T>,
    {
        if self.max_attempts == 0 {
            return PollOutcome::GaveUp { attempts: 0 };
        }

        runtime::yield_now().await;
        let mut state = PollState::Attempting(0);
        loop {
            state = match state {
                PollState::Attempting(attempt) => match extract() {
                    Some(value) => PollState::Ready {
                        value,
                        attempts: attempt + 1,
                    },
                    None if attempt + 1 < self.max_attempts => {
                        runtime::sleep(self.interval).await;
                        PollState::Attempting(attempt + 1)
                    }
                    None => PollState::GaveUp {
                        attempts: attempt + 1,
                    },
                },
                PollState::Ready { value, attempts } => {
                    return PollOutcome::Ready { value, attempts };
                }
                PollState::GaveUp { attempts } => {
                    log::debug!("readiness poll gave up after {attempts} attempts");
                    return PollOutcome::GaveUp { attempts };
                }
            };
        }
    }
}

impl Default for ReadinessPoller {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}
