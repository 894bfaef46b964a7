use std::sync::{Arc, Mutex};

use crate::platform::host::{
    HostCallback, LoadCallback, NavigationTiming, PageHost, PaintMark, RejectionInfo,
    ResourceErrorInfo, RuntimeErrorInfo,
};

type Shared<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// In-memory page whose timing data and notifications are driven by the test.
pub struct FakeHost {
    state: Mutex<FakeHostState>,
}

#[derive(Default)]
struct FakeHostState {
    location: String,
    now_ms: f64,
    complete: bool,
    paint_marks: Vec<PaintMark>,
    navigation: Option<NavigationTiming>,
    // Remaining timing reads that answer "no entry yet" before `navigation` is exposed.
    navigation_delay: u32,
    navigation_reads: u32,
    timing_clears: u32,
    load_callbacks: Vec<LoadCallback>,
    error_callbacks: Vec<Shared<RuntimeErrorInfo>>,
    rejection_callbacks: Vec<Shared<RejectionInfo>>,
    resource_callbacks: Vec<Shared<ResourceErrorInfo>>,
    mutation_callbacks: Vec<Shared<()>>,
}

impl FakeHost {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(FakeHostState {
                location: location.into(),
                ..Default::default()
            }),
        }
    }

    /// A page that already finished loading with the given navigation timing.
    pub fn loaded(location: impl Into<String>, timing: NavigationTiming) -> Self {
        let host = Self::new(location);
        host.set_complete(true);
        host.set_navigation_timing(Some(timing));
        host
    }

    pub fn set_complete(&self, complete: bool) {
        self.state.lock().unwrap().complete = complete;
    }

    pub fn set_now(&self, now_ms: f64) {
        self.state.lock().unwrap().now_ms = now_ms;
    }

    pub fn set_paint_marks(&self, marks: Vec<PaintMark>) {
        self.state.lock().unwrap().paint_marks = marks;
    }

    pub fn set_navigation_timing(&self, timing: Option<NavigationTiming>) {
        self.state.lock().unwrap().navigation = timing;
    }

    /// Hides the navigation entry for the next `reads` timing reads.
    pub fn delay_navigation_timing(&self, reads: u32) {
        self.state.lock().unwrap().navigation_delay = reads;
    }

    pub fn navigation_reads(&self) -> u32 {
        self.state.lock().unwrap().navigation_reads
    }

    pub fn timing_clears(&self) -> u32 {
        self.state.lock().unwrap().timing_clears
    }

    pub fn listener_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.load_callbacks.len()
            + state.error_callbacks.len()
            + state.rejection_callbacks.len()
            + state.resource_callbacks.len()
            + state.mutation_callbacks.len()
    }

    pub fn fire_load(&self) {
        let callbacks = {
            let mut state = self.state.lock().unwrap();
            state.complete = true;
            std::mem::take(&mut state.load_callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    pub fn fire_runtime_error(&self, info: RuntimeErrorInfo) {
        let callbacks = self.state.lock().unwrap().error_callbacks.clone();
        for callback in callbacks {
            callback(info.clone());
        }
    }

    pub fn fire_rejection(&self, info: RejectionInfo) {
        let callbacks = self.state.lock().unwrap().rejection_callbacks.clone();
        for callback in callbacks {
            callback(info.clone());
        }
    }

    pub fn fire_resource_error(&self, info: ResourceErrorInfo) {
        let callbacks = self.state.lock().unwrap().resource_callbacks.clone();
        for callback in callbacks {
            callback(info.clone());
        }
    }

    /// Raises a mutation notification without touching the location.
    pub fn fire_mutation(&self) {
        let callbacks = self.state.lock().unwrap().mutation_callbacks.clone();
        for callback in callbacks {
            callback(());
        }
    }

    /// Moves to `location` and raises a mutation notification.
    pub fn navigate(&self, location: impl Into<String>) {
        self.state.lock().unwrap().location = location.into();
        self.fire_mutation();
    }
}

impl PageHost for FakeHost {
    fn paint_marks(&self) -> Vec<PaintMark> {
        self.state.lock().unwrap().paint_marks.clone()
    }

    fn last_navigation_timing(&self) -> Option<NavigationTiming> {
        let mut state = self.state.lock().unwrap();
        state.navigation_reads += 1;
        if state.navigation_delay > 0 {
            state.navigation_delay -= 1;
            return None;
        }
        state.navigation
    }

    fn clear_timing_buffer(&self) {
        self.state.lock().unwrap().timing_clears += 1;
    }

    fn now_ms(&self) -> f64 {
        self.state.lock().unwrap().now_ms
    }

    fn is_already_complete(&self) -> bool {
        self.state.lock().unwrap().complete
    }

    fn on_load_complete(&self, callback: LoadCallback) {
        self.state.lock().unwrap().load_callbacks.push(callback);
    }

    fn on_runtime_error(&self, callback: HostCallback<RuntimeErrorInfo>) {
        self.state
            .lock()
            .unwrap()
            .error_callbacks
            .push(Arc::from(callback));
    }

    fn on_unhandled_rejection(&self, callback: HostCallback<RejectionInfo>) {
        self.state
            .lock()
            .unwrap()
            .rejection_callbacks
            .push(Arc::from(callback));
    }

    fn on_resource_load_error(&self, callback: HostCallback<ResourceErrorInfo>) {
        self.state
            .lock()
            .unwrap()
            .resource_callbacks
            .push(Arc::from(callback));
    }

    fn on_location_mutated(&self, callback: HostCallback<()>) {
        self.state
            .lock()
            .unwrap()
            .mutation_callbacks
            .push(Arc::from(callback));
    }

    fn current_location(&self) -> String {
        self.state.lock().unwrap().location.clone()
    }
}
