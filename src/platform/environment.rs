//! Environment-provided configuration defaults.

use std::env;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use serde_json::{Map, Value};

pub const DEFAULTS_ENV_VAR: &str = "__MONITOR_DEFAULTS__";

/// Returns the monitor configuration overrides supplied through `__MONITOR_DEFAULTS__`.
///
/// Natively the variable comes from the process environment and may hold a JSON object, a path
/// to a JSON file or `key=value` pairs separated by commas. In the browser a global object of the
/// same name is read instead.
pub fn default_monitor_config_json() -> Option<Map<String, Value>> {
    env::var(DEFAULTS_ENV_VAR)
        .ok()
        .and_then(|raw| parse_config_source(&raw))
        .or_else(defaults_from_global)?
        .as_object()
        .cloned()
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
fn defaults_from_global() -> Option<Value> {
    use wasm_bindgen::JsValue;

    let value = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(DEFAULTS_ENV_VAR)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let serialized = js_sys::JSON::stringify(&value).ok()?.as_string()?;
    json_object(&serialized)
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
fn defaults_from_global() -> Option<Value> {
    None
}

fn parse_config_source(raw: &str) -> Option<Value> {
    json_object(raw)
        .or_else(|| read_config_file(raw))
        .or_else(|| parse_key_value_config(raw))
}

fn json_object(raw: &str) -> Option<Value> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(Value::is_object)
}

#[cfg(not(target_arch = "wasm32"))]
fn read_config_file(raw: &str) -> Option<Value> {
    if raw.contains('=') {
        return None;
    }
    let contents = fs::read_to_string(Path::new(raw.trim())).ok()?;
    json_object(&contents)
}

#[cfg(target_arch = "wasm32")]
fn read_config_file(_raw: &str) -> Option<Value> {
    None
}

// Values are typed loosely: booleans and numbers are recognised, everything else stays a string.
fn parse_key_value_config(raw: &str) -> Option<Value> {
    let mut map = Map::new();
    for entry in raw.split(',') {
        let mut parts = entry.splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        map.insert(key.to_string(), scalar_value(value));
    }
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

fn scalar_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => serde_json::from_str::<serde_json::Number>(raw)
            .ok()
            .filter(|number| number.to_string() == raw)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_configs() {
        let value =
            parse_key_value_config("reportUrl=https://collect.example/r,sampling=0.5,enableError=false")
                .unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.get("reportUrl").unwrap().as_str(), Some("https://collect.example/r"));
        assert_eq!(map.get("sampling").unwrap().as_f64(), Some(0.5));
        assert_eq!(map.get("enableError").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn key_value_numbers_keep_their_original_text() {
        let value = parse_key_value_config("version=1.10,appId=10086,pollInterval=250").unwrap();
        assert_eq!(value["version"], "1.10");
        assert_eq!(value["appId"], 10086);
        assert_eq!(value["pollInterval"], 250);
    }

    #[test]
    fn parse_config_source_accepts_files_and_json() {
        let json = parse_config_source("{\"reportUrl\":\"/collect\"}").unwrap();
        assert_eq!(json["reportUrl"], "/collect");

        let mut path = std::env::temp_dir();
        path.push(format!(
            "web_monitor_rs_test_{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::write(&path, "{\"appId\":\"demo\"}").unwrap();
        let path_str = path.to_string_lossy().to_string();
        let file_json = parse_config_source(&path_str).unwrap();
        assert_eq!(file_json["appId"], "demo");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_sources_without_pairs() {
        assert!(parse_config_source("not a config").is_none());
    }
}
