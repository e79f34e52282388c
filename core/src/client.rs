//! Typed admin operations on top of the shared adapter.
//!
//! # Design
//! `AdminClient` owns one [`ApiClient`] and maps each admin screen's needs
//! onto a route: session handling, ad listing, detail, create, edit and
//! delete. Every call goes through the same adapter, so credentials, body
//! encoding and error messages behave identically everywhere. Login and
//! logout read the whole envelope because the server's `message` is shown to
//! the admin; everything else only needs `result`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::adapter::{ApiClient, RequestOptions};
use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};
use crate::http::{HttpMethod, RequestBody};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    Ad, AdPage, AdUpdate, AdminProfile, LoginOutcome, LoginRequest, NewIframeAd, NewImageAd,
    SessionState,
};

pub const LOGIN_PATH: &str = "/api/admin/login";
pub const ME_PATH: &str = "/api/admin/me";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const ADS_PATH: &str = "/api/admin/ads";
pub const IFRAME_ADS_PATH: &str = "/api/admin/ads/iframe";

/// Query string of the ad list.
#[derive(Debug, Clone, Serialize)]
struct AdListQuery<'a> {
    page: u32,
    size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyword: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct AdminClient<T> {
    api: ApiClient<T>,
}

impl AdminClient<ReqwestTransport> {
    pub fn from_config(config: ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(ApiClient::from_config(config)?))
    }
}

impl<T: Transport> AdminClient<T> {
    pub fn new(api: ApiClient<T>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    /// Log in; on success the transport's jar holds the session cookie.
    pub async fn login(&self, login_id: &str, password: &str) -> Result<LoginOutcome, ClientError> {
        let body = LoginRequest {
            login_id: login_id.to_string(),
            password: password.to_string(),
        };
        let options = RequestOptions::new().method(HttpMethod::Post).json(&body)?;
        let envelope = self.api.send_envelope(LOGIN_PATH, options).await?;

        Ok(LoginOutcome {
            message: string_at(&envelope, "/message"),
            username: string_at(&envelope, "/result/username"),
        })
    }

    pub async fn me(&self) -> Result<AdminProfile, ClientError> {
        let result = self.api.send(ME_PATH, RequestOptions::new()).await?;
        if result.is_null() {
            return Ok(AdminProfile::default());
        }
        decode(result)
    }

    /// Session check for page chrome. Any failure means "not logged in".
    pub async fn session(&self) -> SessionState {
        match self.me().await {
            Ok(profile) => SessionState::Authenticated(profile),
            Err(err) => {
                debug!(error = %err, "no active admin session");
                SessionState::Anonymous
            }
        }
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let options = RequestOptions::new().method(HttpMethod::Post);
        self.api.send_envelope(LOGOUT_PATH, options).await?;
        Ok(())
    }

    /// List active ads, newest first. `page` is zero-based.
    pub async fn list_ads(&self, page: u32, size: u32, keyword: Option<&str>) -> Result<AdPage, ClientError> {
        let query = serde_urlencoded::to_string(AdListQuery {
            page,
            size,
            keyword: keyword.filter(|k| !k.is_empty()),
        })?;
        let result = self
            .api
            .send(&format!("{ADS_PATH}?{query}"), RequestOptions::new())
            .await?;
        decode(result)
    }

    pub async fn get_ad(&self, id: i64) -> Result<Ad, ClientError> {
        let result = self.api.send(&ad_path(id), RequestOptions::new()).await?;
        decode(result)
    }

    pub async fn create_image_ad(&self, ad: NewImageAd) -> Result<Ad, ClientError> {
        let options = RequestOptions::new()
            .method(HttpMethod::Post)
            .body(RequestBody::Multipart(ad.into_form()));
        let result = self.api.send(ADS_PATH, options).await?;
        decode(result)
    }

    pub async fn create_iframe_ad(&self, ad: &NewIframeAd) -> Result<Ad, ClientError> {
        let options = RequestOptions::new().method(HttpMethod::Post).json(ad)?;
        let result = self.api.send(IFRAME_ADS_PATH, options).await?;
        decode(result)
    }

    pub async fn update_ad(&self, id: i64, update: &AdUpdate) -> Result<Ad, ClientError> {
        let options = RequestOptions::new().method(HttpMethod::Patch).json(update)?;
        let result = self.api.send(&ad_path(id), options).await?;
        decode(result)
    }

    /// Delete an ad. An empty `204` counts as success.
    pub async fn delete_ad(&self, id: i64) -> Result<(), ClientError> {
        let options = RequestOptions::new().method(HttpMethod::Delete);
        self.api.send(&ad_path(id), options).await?;
        Ok(())
    }
}

fn ad_path(id: i64) -> String {
    format!("{ADS_PATH}/{id}")
}

fn decode<D: DeserializeOwned>(value: Value) -> Result<D, ClientError> {
    serde_json::from_value(value).map_err(ClientError::Decode)
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}
