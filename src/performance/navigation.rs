use std::sync::Mutex;

/// A location change not caused by a full page load.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteChange {
    pub from: String,
    pub to: String,
    /// Host clock reading when the change was observed.
    pub started_at_ms: f64,
}

/// Turns a stream of page mutation signals into distinct route changes.
#[derive(Debug)]
pub struct NavigationWatcher {
    last_location: Mutex<String>,
}

impl NavigationWatcher {
    pub fn new(initial_location: impl Into<String>) -> Self {
        Self {
            last_location: Mutex::new(initial_location.into()),
        }
    }

    /// Records `current` and returns a route change only when it differs from the last
    /// recorded location. Repeated signals for the same location yield nothing.
    pub fn observe(&self, current: &str, now_ms: f64) -> Option<RouteChange> {
        let mut last = self
            .last_location
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        if *last == current {
            return None;
        }
        let from = std::mem::replace(&mut *last, current.to_string());
        Some(RouteChange {
            from,
            to: current.to_string(),
            started_at_ms: now_ms,
        })
    }

    pub fn last_location(&self) -> String {
        self.last_location
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}
