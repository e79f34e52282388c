//! API client core for the ad admin backend.
//!
//! # Overview
//! Every admin call goes through one adapter: it attaches the session
//! cookie, picks JSON or multipart encoding, unwraps the `{message, result}`
//! envelope and turns any non-2xx response into an [`ApiError`] carrying the
//! server's message.
//!
//! # Design
//! - [`adapter`] is split into `build_request` (produces a plain-data
//!   request) and `parse_response` (consumes a plain-data response), so the
//!   envelope contract is testable without a network.
//! - [`Transport`] is the only place that performs I/O and the only holder
//!   of state (the cookie jar). [`ReqwestTransport`] is the default.
//! - [`AdminClient`] exposes the admin screens' operations with typed
//!   payloads ([`Ad`], [`AdPage`], ...). DTOs are defined independently from
//!   the mock-server crate; integration tests catch schema drift.

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use adapter::{build_request, parse_response, ApiClient, RequestOptions, UnwrapPolicy};
pub use client::AdminClient;
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, TransportError, FALLBACK_MESSAGE};
pub use http::{FormPart, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Ad, AdKind, AdPage, AdUpdate, AdminProfile, ImageUpload, LoginOutcome, LoginRequest,
    NewIframeAd, NewImageAd, SessionState,
};
