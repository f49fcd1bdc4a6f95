// ── Domain model ──

use std::collections::BTreeMap;

use spark_api::DeviceInfo;

/// What the cloud reports a device can do.
///
/// Immutable once fetched; the only way to refresh it is to connect a new
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    /// Variable name → type tag reported by the device.
    pub variables: BTreeMap<String, String>,
    /// Function names in registration order.
    pub functions: Vec<String>,
    pub connected: bool,
}

impl DeviceDescriptor {
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f == name)
    }

    /// Variable names in sorted order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}

impl From<DeviceInfo> for DeviceDescriptor {
    fn from(info: DeviceInfo) -> Self {
        // Unnamed devices are addressed by id.
        let name = info
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| info.id.clone());
        Self {
            id: info.id,
            name,
            variables: info.variables.unwrap_or_default(),
            functions: info.functions.unwrap_or_default(),
            connected: info.connected,
        }
    }
}
