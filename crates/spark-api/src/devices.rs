// Device endpoints
//
// Enumeration, detail fetch, variable reads and function calls. Every
// endpoint is a single request under `/v1/devices`; ids and names are
// passed as escaped path segments.

use serde_json::json;
use tracing::debug;

use crate::client::{CloudClient, Method};
use crate::error::Error;
use crate::models::{DeviceInfo, DeviceSummary, FunctionReturn, VariableReading};

impl CloudClient {
    /// List every device the token can reach.
    ///
    /// `GET /v1/devices`
    pub async fn list_devices(&self) -> Result<Vec<DeviceSummary>, Error> {
        debug!("listing devices");
        self.request_as(&[], Method::Get, None).await
    }

    /// Fetch one device's description and declared capabilities.
    ///
    /// `GET /v1/devices/{id}`
    pub async fn get_device(&self, id: &str) -> Result<DeviceInfo, Error> {
        debug!(id, "fetching device");
        self.request_as(&[id], Method::Get, None).await
    }

    /// Read a variable's current value from the device.
    ///
    /// `GET /v1/devices/{id}/{name}`
    pub async fn read_variable(&self, id: &str, name: &str) -> Result<VariableReading, Error> {
        debug!(id, name, "reading variable");
        self.request_as(&[id, name], Method::Get, None).await
    }

    /// Call a function on the device with a single string argument.
    ///
    /// `POST /v1/devices/{id}/{name}` with `{"args": "..."}`
    pub async fn call_function(
        &self,
        id: &str,
        name: &str,
        argument: &str,
    ) -> Result<FunctionReturn, Error> {
        debug!(id, name, "calling function");
        let body = json!({ "args": argument });
        self.request_as(&[id, name], Method::Post, Some(&body))
            .await
    }
}
