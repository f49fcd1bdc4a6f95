// spark-api: Async Rust client for the spark device cloud REST API

pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{CloudClient, Method, DEFAULT_BASE_URL, DEVICES_PATH};
pub use error::Error;
pub use models::{DeviceInfo, DeviceSummary, FunctionReturn, VariableReading};
pub use transport::TransportConfig;
