// spark-core: device sessions, variable pollers and collections on top of spark-api.

pub mod cache;
pub mod collection;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod variable;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheEntry, CacheFile, CacheStore};
pub use collection::{DeviceCollection, DeviceFailure};
pub use config::CloudConfig;
pub use error::CoreError;
pub use model::DeviceDescriptor;
pub use session::{DeviceSession, FunctionInvoker, SessionState};
pub use variable::{
    AutoUpdate, DEFAULT_POLL_INTERVAL, PollState, UpdateStream, VariableHandle, VariableUpdate,
};
