//! [`PageHost`] and beacon bindings for the browser window.

use js_sys::Reflect;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    DocumentReadyState, Element, ErrorEvent, Event, HtmlImageElement, HtmlLinkElement,
    HtmlScriptElement, MutationObserver, MutationObserverInit, PerformanceNavigationTiming,
    PromiseRejectionEvent, Window,
};

use crate::monitor::BeaconTransport;
use crate::platform::host::{
    HostCallback, LoadCallback, NavigationTiming, PageHost, PaintMark, RejectionInfo,
    ResourceErrorInfo, RuntimeErrorInfo,
};

fn window() -> Option<Window> {
    web_sys::window()
}

fn performance() -> Option<web_sys::Performance> {
    window()?.performance()
}

fn string_property(value: &JsValue, key: &str) -> Option<String> {
    if !value.is_object() {
        return None;
    }
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|property| property.as_string())
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| string_property(value, "message"))
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Absolute URL of the resource an element failed to load.
fn resolved_source(element: &Element) -> Option<String> {
    let resolved = if let Some(image) = element.dyn_ref::<HtmlImageElement>() {
        image.src()
    } else if let Some(script) = element.dyn_ref::<HtmlScriptElement>() {
        script.src()
    } else if let Some(link) = element.dyn_ref::<HtmlLinkElement>() {
        link.href()
    } else {
        string_property(element, "src")
            .or_else(|| string_property(element, "href"))
            .unwrap_or_default()
    };
    Some(resolved).filter(|url| !url.is_empty())
}

fn add_listener(event: &str, capture: bool, handler: impl FnMut(Event) + 'static) {
    let Some(window) = window() else {
        log::debug!("window unavailable; `{event}` listener not registered");
        return;
    };
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    if let Err(err) = window.add_event_listener_with_callback_and_bool(
        event,
        closure.as_ref().unchecked_ref(),
        capture,
    ) {
        log::warn!("failed to register `{event}` listener: {err:?}");
        return;
    }
    closure.forget();
}

/// The browser window as seen by the monitor.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserHost;

impl BrowserHost {
    pub fn new() -> Self {
        Self
    }
}

impl PageHost for BrowserHost {
    fn paint_marks(&self) -> Vec<PaintMark> {
        let Some(performance) = performance() else {
            return Vec::new();
        };
        performance
            .get_entries_by_type("paint")
            .iter()
            .filter_map(|entry| entry.dyn_into::<web_sys::PerformanceEntry>().ok())
            .map(|entry| PaintMark::new(entry.name(), entry.start_time()))
            .collect()
    }

    fn last_navigation_timing(&self) -> Option<NavigationTiming> {
        let entries = performance()?.get_entries_by_type("navigation");
        if entries.length() == 0 {
            return None;
        }
        let entry = entries
            .get(entries.length() - 1)
            .dyn_into::<PerformanceNavigationTiming>()
            .ok()?;
        Some(NavigationTiming {
            domain_lookup_start: entry.domain_lookup_start(),
            domain_lookup_end: entry.domain_lookup_end(),
            connect_start: entry.connect_start(),
            connect_end: entry.connect_end(),
            dom_complete: entry.dom_complete(),
            load_event_end: entry.load_event_end(),
        })
    }

    fn clear_timing_buffer(&self) {
        if let Some(performance) = performance() {
            performance.clear_resource_timings();
        }
    }

    fn now_ms(&self) -> f64 {
        performance().map(|performance| performance.now()).unwrap_or(0.0)
    }

    fn is_already_complete(&self) -> bool {
        window()
            .and_then(|window| window.document())
            .map(|document| document.ready_state() == DocumentReadyState::Complete)
            .unwrap_or(false)
    }

    fn on_load_complete(&self, callback: LoadCallback) {
        let Some(window) = window() else {
            return;
        };
        let listener = Closure::once_into_js(move || callback());
        if let Err(err) =
            window.add_event_listener_with_callback("load", listener.unchecked_ref())
        {
            log::warn!("failed to register `load` listener: {err:?}");
        }
    }

    fn on_runtime_error(&self, callback: HostCallback<RuntimeErrorInfo>) {
        add_listener("error", false, move |event| {
            let Ok(event) = event.dyn_into::<ErrorEvent>() else {
                return;
            };
            let error = event.error();
            callback(RuntimeErrorInfo {
                message: event.message(),
                file_name: Some(event.filename()).filter(|name| !name.is_empty()),
                line_no: Some(event.lineno()),
                col_no: Some(event.colno()),
                stack_text: string_property(&error, "stack"),
            });
        });
    }

    fn on_unhandled_rejection(&self, callback: HostCallback<RejectionInfo>) {
        add_listener("unhandledrejection", false, move |event| {
            let Ok(event) = event.dyn_into::<PromiseRejectionEvent>() else {
                return;
            };
            let reason = event.reason();
            callback(RejectionInfo {
                message: describe(&reason),
                stack_text: string_property(&reason, "stack"),
            });
        });
    }

    fn on_resource_load_error(&self, callback: HostCallback<ResourceErrorInfo>) {
        // Resource failures do not bubble, only the capture phase sees them.
        add_listener("error", true, move |event| {
            let Some(element) = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
            else {
                return;
            };
            callback(ResourceErrorInfo {
                tag_name: element.tag_name(),
                source_url: resolved_source(&element),
            });
        });
    }

    fn on_location_mutated(&self, callback: HostCallback<()>) {
        let Some(root) = window()
            .and_then(|window| window.document())
            .and_then(|document| document.document_element())
        else {
            log::debug!("document unavailable; route changes will not be observed");
            return;
        };
        let closure = Closure::wrap(Box::new(move |_: js_sys::Array, _: MutationObserver| {
            callback(())
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);
        let observer = match MutationObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                log::warn!("mutation observer init failed: {err:?}");
                return;
            }
        };
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if let Err(err) = observer.observe_with_options(&root, &init) {
            log::warn!("mutation observer failed to start: {err:?}");
            return;
        }
        closure.forget();
    }

    fn current_location(&self) -> String {
        window()
            .and_then(|window| window.location().href().ok())
            .unwrap_or_default()
    }
}

/// `navigator.sendBeacon`.
#[derive(Clone, Copy, Debug)]
pub struct NavigatorBeacon;

impl NavigatorBeacon {
    /// Returns the beacon only when the current navigator supports it.
    pub fn detect() -> Option<Self> {
        let navigator = window()?.navigator();
        Reflect::has(&navigator, &JsValue::from_str("sendBeacon"))
            .unwrap_or(false)
            .then_some(Self)
    }
}

impl BeaconTransport for NavigatorBeacon {
    fn try_send(&self, endpoint: &str, body: &str) -> bool {
        let Some(window) = window() else {
            return false;
        };
        window
            .navigator()
            .send_beacon_with_opt_str(endpoint, Some(body))
            .unwrap_or(false)
    }
}
