//! The shared request adapter every admin call goes through.
//!
//! # Design
//! Split the way the rest of the crate is: [`build_request`] turns a path and
//! [`RequestOptions`] into a plain-data [`HttpRequest`], [`parse_response`]
//! turns a plain-data [`HttpResponse`] into the caller's value or an
//! [`ApiError`]. [`ApiClient`] glues the two together through a
//! [`Transport`] and holds nothing between calls except its configuration.
//!
//! Two success policies exist because callers consume the envelope in two
//! ways: some read `message` next to `result`, most only want `result`.

use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError, TransportError, FALLBACK_MESSAGE};
use crate::http::{set_header, HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::transport::{ReqwestTransport, Transport};

/// What to hand back from a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnwrapPolicy {
    /// The whole parsed body.
    FullEnvelope,
    /// The body's `result` field when present, else the whole body.
    #[default]
    Result,
}

/// Per-call options. Everything defaults: GET, no body, no extra headers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `value` and use it as a JSON body.
    pub fn json<T: serde::Serialize + ?Sized>(self, value: &T) -> Result<Self, ClientError> {
        let body = RequestBody::json(value).map_err(ClientError::Encode)?;
        Ok(self.body(body))
    }

    /// Add a header that overrides the adapter default of the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Build the request for `path` against `base_url`.
///
/// Non-multipart requests get `Content-Type: application/json` unless the
/// caller overrides it. Multipart requests get no `Content-Type` at all; the
/// transport writes it together with the boundary.
pub fn build_request(base_url: &str, path: &str, options: RequestOptions) -> HttpRequest {
    let mut headers = Vec::new();
    let multipart = options.body.as_ref().is_some_and(RequestBody::is_multipart);
    if !multipart {
        headers.push(("content-type".to_string(), "application/json".to_string()));
    }
    for (name, value) in &options.headers {
        set_header(&mut headers, name, value);
    }

    HttpRequest {
        method: options.method,
        url: join_url(base_url, path),
        headers,
        body: options.body,
    }
}

/// Interpret a response under `policy`.
///
/// An empty or non-JSON body parses as `null`. Any status outside 200–299 is
/// an [`ApiError`] whose message is the body's `message`, else its `detail`,
/// else [`FALLBACK_MESSAGE`].
pub fn parse_response(response: &HttpResponse, policy: UnwrapPolicy) -> Result<Value, ApiError> {
    let parsed: Value = serde_json::from_str(&response.body).unwrap_or(Value::Null);

    if !response.is_success() {
        return Err(ApiError::new(error_message(&parsed)));
    }

    Ok(match policy {
        UnwrapPolicy::FullEnvelope => parsed,
        UnwrapPolicy::Result => unwrap_result(parsed),
    })
}

fn error_message(parsed: &Value) -> &str {
    ["message", "detail"]
        .iter()
        .find_map(|key| {
            parsed
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(FALLBACK_MESSAGE)
}

/// `result` when it is present and non-null; otherwise the whole value.
fn unwrap_result(parsed: Value) -> Value {
    match parsed.get("result") {
        Some(result) if !result.is_null() => result.clone(),
        _ => parsed,
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

/// Credentialed JSON/multipart client for the admin API.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    config: ClientConfig,
    transport: T,
}

impl ApiClient<ReqwestTransport> {
    /// A client with a fresh cookie jar.
    pub fn from_config(config: ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(config, ReqwestTransport::new()?))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_request(&self, path: &str, options: RequestOptions) -> HttpRequest {
        build_request(&self.config.base_url, path, options)
    }

    /// Issue a request and return the envelope's `result`.
    pub async fn send(&self, path: &str, options: RequestOptions) -> Result<Value, ClientError> {
        self.send_with(path, options, UnwrapPolicy::Result).await
    }

    /// Issue a request and return the whole parsed envelope.
    pub async fn send_envelope(&self, path: &str, options: RequestOptions) -> Result<Value, ClientError> {
        self.send_with(path, options, UnwrapPolicy::FullEnvelope).await
    }

    pub async fn send_with(
        &self,
        path: &str,
        options: RequestOptions,
        policy: UnwrapPolicy,
    ) -> Result<Value, ClientError> {
        let request = self.build_request(path, options);
        let method = request.method;
        debug!(method = method.as_str(), path, "sending admin api request");

        let response = self.transport.execute(request).await?;
        debug!(method = method.as_str(), path, status = response.status, "admin api response");

        Ok(parse_response(&response, policy)?)
    }
}
