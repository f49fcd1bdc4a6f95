// Cloud API response types
//
// Fields use `#[serde(default)]` liberally: offline devices report `null`
// for their capability lists and older firmware omits several fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of `GET /v1/devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub last_heard: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Full device description from `GET /v1/devices/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub connected: bool,
    /// Variable name → type tag (`"int32"`, `"double"`, `"string"`, ...).
    #[serde(default)]
    pub variables: Option<BTreeMap<String, String>>,
    /// Function names in the order the device registered them.
    #[serde(default)]
    pub functions: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Result of `GET /v1/devices/{id}/{variable}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableReading {
    pub name: String,
    /// The value exactly as the device reported it.
    pub result: Value,
    #[serde(default, rename = "coreInfo")]
    pub core_info: Option<Value>,
}

/// Result of `POST /v1/devices/{id}/{function}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionReturn {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub connected: Option<bool>,
    pub return_value: Value,
}
