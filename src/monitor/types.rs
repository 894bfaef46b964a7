use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::monitor::error::{unknown_category, MonitorError};

/// Closed set of report categories understood by the collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCategory {
    #[serde(rename = "performance")]
    Performance,
    #[serde(rename = "click")]
    Click,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "promise_error")]
    PromiseError,
    #[serde(rename = "resource_error")]
    ResourceError,
    #[serde(rename = "pageView")]
    PageView,
    #[serde(rename = "pageViewOut")]
    PageViewOut,
    #[serde(rename = "moduleExpose")]
    ModuleExpose,
}

impl ReportCategory {
    pub const ALL: [ReportCategory; 8] = [
        ReportCategory::Performance,
        ReportCategory::Click,
        ReportCategory::Error,
        ReportCategory::PromiseError,
        ReportCategory::ResourceError,
        ReportCategory::PageView,
        ReportCategory::PageViewOut,
        ReportCategory::ModuleExpose,
    ];

    /// Wire name sent in the envelope `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Performance => "performance",
            ReportCategory::Click => "click",
            ReportCategory::Error => "error",
            ReportCategory::PromiseError => "promise_error",
            ReportCategory::ResourceError => "resource_error",
            ReportCategory::PageView => "pageView",
            ReportCategory::PageViewOut => "pageViewOut",
            ReportCategory::ModuleExpose => "moduleExpose",
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportCategory {
    type Err = MonitorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ReportCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| unknown_category(value))
    }
}

/// One unit of telemetry handed to the delivery engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    #[serde(rename = "type")]
    pub category: ReportCategory,
    #[serde(rename = "data")]
    pub payload: Value,
    /// Creation time in epoch milliseconds.
    #[serde(rename = "currentTime")]
    pub timestamp: i64,
}

impl ReportEnvelope {
    pub fn new(category: ReportCategory, payload: Value, timestamp: i64) -> Self {
        Self {
            category,
            payload,
            timestamp,
        }
    }

    /// Stamps the envelope with the current wall clock time.
    pub fn now(category: ReportCategory, payload: Value) -> Self {
        Self::new(category, payload, chrono::Utc::now().timestamp_millis())
    }
}

/// Fields shared by every business tracking payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonData {
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl CommonData {
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickData {
    #[serde(flatten)]
    pub common: CommonData,
    pub button_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    #[serde(flatten)]
    pub common: CommonData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_no: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_no: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromiseErrorData {
    #[serde(flatten)]
    pub common: CommonData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promise_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleExposeData {
    #[serde(flatten)]
    pub common: CommonData,
    pub module_id: String,
    pub content_id: String,
    pub expose_times: u32,
}
