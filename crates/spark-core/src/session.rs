// ── Device session ──
//
// One authenticated device. A session starts in `Connecting`, performs a
// single discovery request, and settles in either `Ready` or `Errored`.
// Once ready it exposes an explicit name → invoker map for functions and a
// lazily-filled name → handle map for variables; nothing outside the
// discovered descriptor is ever addressable.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use secrecy::SecretString;
use serde_json::Value;
use spark_api::CloudClient;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::DeviceDescriptor;
use crate::variable::VariableHandle;

// ── SessionState ─────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
///
/// `Ready` and `Errored` are terminal: an errored session is never retried
/// and must be recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Ready,
    Errored { reason: String },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Connecting)
    }
}

// ── FunctionInvoker ──────────────────────────────────────────────

/// A callable handle for one declared device function.
#[derive(Debug, Clone)]
pub struct FunctionInvoker {
    device: String,
    name: String,
    cloud: CloudClient,
}

impl FunctionInvoker {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the function once with `argument` and return the device's
    /// `return_value`. Failures are not retried.
    pub async fn invoke(&self, argument: &str) -> Result<Value, CoreError> {
        debug!(device = %self.device, function = %self.name, "invoking function");
        let ret = self
            .cloud
            .call_function(&self.device, &self.name, argument)
            .await
            .map_err(|source| CoreError::RemoteExecution {
                name: self.name.clone(),
                source,
            })?;
        Ok(ret.return_value)
    }
}

// ── DeviceSession ────────────────────────────────────────────────

/// A connection to a single device.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Variable handles hold only a
/// weak reference back to the session.
#[derive(Clone)]
pub struct DeviceSession {
    inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    id: String,
    cloud: CloudClient,
    state: watch::Sender<SessionState>,
    capabilities: OnceLock<Capabilities>,
    variables: DashMap<String, VariableHandle>,
    connect_lock: Mutex<()>,
}

struct Capabilities {
    descriptor: Arc<DeviceDescriptor>,
    functions: BTreeMap<String, FunctionInvoker>,
}

impl DeviceSession {
    /// Create a session for device `id`. Does NOT connect -- call
    /// [`connect()`](Self::connect) to run discovery.
    pub fn new(cloud: CloudClient, id: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        Self {
            inner: Arc::new(SessionInner {
                id: id.into(),
                cloud,
                state,
                capabilities: OnceLock::new(),
                variables: DashMap::new(),
                connect_lock: Mutex::new(()),
            }),
        }
    }

    /// Create and connect in one step.
    pub async fn open(cloud: CloudClient, id: impl Into<String>) -> Result<Self, CoreError> {
        let session = Self::new(cloud, id);
        session.connect().await?;
        Ok(session)
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Fetch the device description and settle the session state.
    ///
    /// Exactly one discovery request is ever made per session. Later calls
    /// return the settled outcome: the descriptor once ready, or
    /// [`CoreError::SessionFailed`] once errored.
    pub async fn connect(&self) -> Result<Arc<DeviceDescriptor>, CoreError> {
        let _guard = self.inner.connect_lock.lock().await;

        let current = self.inner.state.borrow().clone();
        match current {
            SessionState::Ready => return self.inner.ready().map(|c| Arc::clone(&c.descriptor)),
            SessionState::Errored { reason } => {
                return Err(CoreError::SessionFailed {
                    id: self.inner.id.clone(),
                    reason,
                });
            }
            SessionState::Connecting => {}
        }

        debug!(id = %self.inner.id, "discovering device capabilities");

        match self.inner.cloud.get_device(&self.inner.id).await {
            Ok(info) => {
                let descriptor = Arc::new(DeviceDescriptor::from(info));
                let functions = descriptor
                    .functions
                    .iter()
                    .map(|name| {
                        let invoker = FunctionInvoker {
                            device: self.inner.id.clone(),
                            name: name.clone(),
                            cloud: self.inner.cloud.clone(),
                        };
                        (name.clone(), invoker)
                    })
                    .collect();

                let _ = self.inner.capabilities.set(Capabilities {
                    descriptor: Arc::clone(&descriptor),
                    functions,
                });
                self.inner.state.send_replace(SessionState::Ready);

                info!(
                    id = %descriptor.id,
                    name = %descriptor.name,
                    variables = descriptor.variables.len(),
                    functions = descriptor.functions.len(),
                    "device session ready"
                );
                Ok(descriptor)
            }
            Err(err) => {
                let err = discovery_error(&self.inner.id, err);
                warn!(id = %self.inner.id, error = %err, "device discovery failed");
                self.inner.state.send_replace(SessionState::Errored {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Wait until another task's `connect()` settles the session.
    pub async fn wait_ready(&self) -> Result<Arc<DeviceDescriptor>, CoreError> {
        let mut rx = self.inner.state.subscribe();
        let settled = rx
            .wait_for(SessionState::is_terminal)
            .await
            .map_err(|_| CoreError::SessionClosed {
                id: self.inner.id.clone(),
            })?
            .clone();

        match settled {
            SessionState::Errored { reason } => Err(CoreError::SessionFailed {
                id: self.inner.id.clone(),
                reason,
            }),
            _ => self.inner.ready().map(|c| Arc::clone(&c.descriptor)),
        }
    }

    // ── State observation ────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The device name, once discovery has completed.
    pub fn name(&self) -> Option<&str> {
        self.descriptor().map(|d| d.name.as_str())
    }

    pub fn token(&self) -> &SecretString {
        self.inner.cloud.token()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.inner.capabilities.get().map(|c| c.descriptor.as_ref())
    }

    /// Declared function names, in registration order. Empty until ready.
    pub fn function_names(&self) -> &[String] {
        self.descriptor()
            .map(|d| d.functions.as_slice())
            .unwrap_or_default()
    }

    /// Declared variable names. Empty until ready.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.descriptor().into_iter().flat_map(DeviceDescriptor::variable_names)
    }

    // ── Capabilities ─────────────────────────────────────────────

    /// Look up the invoker for a declared function.
    pub fn function(&self, name: &str) -> Result<FunctionInvoker, CoreError> {
        let caps = self.inner.ready()?;
        caps.functions
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownFunction {
                device: self.inner.id.clone(),
                name: name.to_owned(),
            })
    }

    /// Invoke a declared function. Unknown names fail without a request.
    pub async fn invoke_function(&self, name: &str, argument: &str) -> Result<Value, CoreError> {
        self.function(name)?.invoke(argument).await
    }

    /// Read a declared variable once. Unknown names fail without a request.
    pub async fn read_variable(&self, name: &str) -> Result<Value, CoreError> {
        self.inner.read_variable(name).await
    }

    /// The handle for a declared variable, created on first reference.
    pub fn variable(&self, name: &str) -> Result<VariableHandle, CoreError> {
        let caps = self.inner.ready()?;
        if !caps.descriptor.has_variable(name) {
            return Err(CoreError::UnknownVariable {
                device: self.inner.id.clone(),
                name: name.to_owned(),
            });
        }

        let handle = self
            .inner
            .variables
            .entry(name.to_owned())
            .or_insert_with(|| {
                debug!(device = %self.inner.id, variable = name, "creating variable handle");
                VariableHandle::new(
                    self.inner.id.clone(),
                    name.to_owned(),
                    Arc::downgrade(&self.inner),
                )
            })
            .value()
            .clone();
        Ok(handle)
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("id", &self.inner.id)
            .field("name", &self.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionInner {
    fn ready(&self) -> Result<&Capabilities, CoreError> {
        self.capabilities.get().ok_or_else(|| match &*self.state.borrow() {
            SessionState::Errored { reason } => CoreError::SessionFailed {
                id: self.id.clone(),
                reason: reason.clone(),
            },
            _ => CoreError::NotReady {
                id: self.id.clone(),
            },
        })
    }

    pub(crate) async fn read_variable(&self, name: &str) -> Result<Value, CoreError> {
        let caps = self.ready()?;
        if !caps.descriptor.has_variable(name) {
            return Err(CoreError::UnknownVariable {
                device: self.id.clone(),
                name: name.to_owned(),
            });
        }

        let reading = self
            .cloud
            .read_variable(&self.id, name)
            .await
            .map_err(|source| CoreError::RemoteRead {
                name: name.to_owned(),
                source,
            })?;
        Ok(reading.result)
    }
}

/// Map a discovery failure, pinning not-found to the requested id.
fn discovery_error(id: &str, err: spark_api::Error) -> CoreError {
    if err.is_not_found() {
        CoreError::DeviceNotFound { id: id.to_owned() }
    } else {
        CoreError::from(err)
    }
}

pub(crate) type WeakSession = Weak<SessionInner>;
