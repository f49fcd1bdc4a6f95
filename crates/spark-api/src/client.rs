// Cloud API HTTP client
//
// Wraps `reqwest::Client` with bearer-token auth, URL construction under the
// fixed `/v1/devices` base path, and response classification. Endpoint
// helpers (list/get device, read variable, call function) live in
// `devices.rs` as inherent methods so this module stays focused on
// transport mechanics.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Production cloud host.
pub const DEFAULT_BASE_URL: &str = "https://api.spark.io";

/// Base path every request path is appended to.
pub const DEVICES_PATH: &str = "/v1/devices";

/// HTTP methods accepted by the cloud API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl Method {
    /// Only POST, PUT and PATCH send a request body.
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Raw HTTP client for the device cloud.
///
/// Stateless apart from the token it authenticates with: one call is one
/// request, nothing is retried. Cheap to clone (the inner `reqwest::Client`
/// is reference counted).
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl CloudClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// Fails with [`Error::MissingToken`] when `token` is empty; no request
    /// is ever attempted without one.
    pub fn new(
        base_url: Url,
        token: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, token)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        token: SecretString,
    ) -> Result<Self, Error> {
        if token.expose_secret().trim().is_empty() {
            return Err(Error::MissingToken);
        }
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// The bearer token this client authenticates with.
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/v1/devices{path}`.
    pub(crate) fn devices_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            DEVICES_PATH,
            path
        );
        Ok(Url::parse(&full)?)
    }

    /// Build `{base}/v1/devices/{segment}/...` with each segment escaped,
    /// so an id or name can never reach a different endpoint.
    pub(crate) fn device_url(&self, segments: &[&str]) -> Result<Url, Error> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(Error::InvalidSegment {
                segment: (*bad).to_owned(),
            });
        }

        let mut url = self.devices_url("")?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| {
                    Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
                })?
                .extend(segments);
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Issue one request and return the parsed JSON payload.
    ///
    /// `path` is appended to the fixed base path. `body` is only sent for
    /// methods that carry one, as JSON.
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.devices_url(path)?;
        self.send(url, method, headers, body).await
    }

    /// Endpoint helper: escaped segments in, typed model out.
    pub(crate) async fn request_as<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        method: Method,
        body: Option<&Value>,
    ) -> Result<T, Error> {
        let url = self.device_url(segments)?;
        let value = self.send(url, method, HeaderMap::new(), body).await?;
        decode(value)
    }

    async fn send(
        &self,
        url: Url,
        method: Method,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        debug!(method = ?method, %url, "cloud request");

        let mut req = self
            .http
            .request(method.as_reqwest(), url.clone())
            .bearer_auth(self.token.expose_secret())
            .headers(headers);

        if method.carries_body() {
            if let Some(body) = body {
                req = req.json(body);
            }
        }

        let resp = req.send().await.map_err(Error::Transport)?;
        parse_response(url.path(), resp).await
    }
}

/// Classify a response: auth and not-found statuses first, then empty
/// bodies, then `{ok: false}` envelopes and other non-2xx statuses.
async fn parse_response(path: &str, resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: error_message(&body).unwrap_or_else(|| "invalid access token".into()),
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound {
            path: path.to_owned(),
            message: error_message(&body).unwrap_or_default(),
        });
    }

    if body.trim().is_empty() {
        return Err(Error::EmptyResponse);
    }

    let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.clone(),
    })?;

    let rejected = value.get("ok").and_then(Value::as_bool) == Some(false);
    if !status.is_success() || rejected {
        return Err(Error::Api {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| status.to_string()),
        });
    }

    Ok(value)
}

/// Pull a human-readable message out of a cloud error body.
///
/// The cloud uses `error` for most failures and `error_description` for
/// OAuth ones; `info` shows up on some device-side errors.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error_description", "error", "info"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_owned)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}
