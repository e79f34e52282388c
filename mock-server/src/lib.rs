//! In-memory stand-in for the ad admin backend.
//!
//! Speaks the same envelope as the real service: successes are
//! `{code, message, result}`, failures are `{detail}` with a 4xx status.
//! Admin routes require the `admin_session` cookie handed out by login.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "admin_session";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ad_type")]
pub enum AdKind {
    #[serde(rename = "IMAGE")]
    Image {
        image_url: Option<String>,
        target_url: Option<String>,
        short_url: Option<String>,
    },
    #[serde(rename = "IFRAME")]
    Iframe {
        embed_src: String,
        embed_width: u32,
        embed_height: u32,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ad {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: AdKind,
    pub created_at: String,
}

#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub result: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(message: &str, result: T) -> Json<Self> {
        Json(Self {
            code: 200,
            message: message.to_string(),
            result: Some(result),
        })
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "loginId")]
    pub login_id: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct AdminMe {
    #[serde(rename = "loginId")]
    pub login_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    pub keyword: Option<String>,
}

fn default_page_size() -> u32 {
    10
}

#[derive(Serialize, Deserialize)]
pub struct AdPage {
    pub content: Vec<Ad>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

#[derive(Deserialize)]
pub struct CreateIframeAd {
    pub title: String,
    pub description: Option<String>,
    pub embed_src: String,
    pub embed_width: u32,
    pub embed_height: u32,
}

#[derive(Deserialize)]
pub struct UpdateAd {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_url: Option<String>,
    pub embed_src: Option<String>,
    pub embed_width: Option<u32>,
    pub embed_height: Option<u32>,
}

/// Seeded admin account and session lifetime.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub login_id: String,
    pub password: String,
    pub session_ttl: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            login_id: "admin".to_string(),
            password: "1234".to_string(),
            session_ttl: Duration::from_secs(86_400),
        }
    }
}

impl BackendConfig {
    /// Read `ADMIN_LOGIN_ID`, `ADMIN_PASSWORD` and `SESSION_TTL` (seconds),
    /// keeping the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            login_id: std::env::var("ADMIN_LOGIN_ID").unwrap_or(defaults.login_id),
            password: std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.password),
            session_ttl: std::env::var("SESSION_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("UNAUTHORIZED")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("ad not found")]
    NotFound,
    #[error("{0}")]
    Invalid(String),
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = match self {
            BackendError::Unauthorized | BackendError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            BackendError::NotFound => StatusCode::NOT_FOUND,
            BackendError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

struct Session {
    login_id: String,
    expires_at: Instant,
}

struct StoredImage {
    content_type: String,
    bytes: Vec<u8>,
}

/// Deleting an ad only clears `active`; the row and its image stay.
struct StoredAd {
    ad: Ad,
    active: bool,
}

#[derive(Default)]
struct Store {
    ads: BTreeMap<i64, StoredAd>,
    next_id: i64,
    sessions: HashMap<String, Session>,
    images: HashMap<String, StoredImage>,
}

impl Store {
    fn active_ads(&self) -> impl DoubleEndedIterator<Item = &Ad> {
        self.ads.values().filter(|row| row.active).map(|row| &row.ad)
    }

    fn active_ad_mut(&mut self, id: i64) -> Option<&mut StoredAd> {
        self.ads.get_mut(&id).filter(|row| row.active)
    }

    fn insert_ad(&mut self, ad: Ad) {
        self.ads.insert(ad.id, StoredAd { ad, active: true });
    }

    fn prune_sessions(&mut self, now: Instant) {
        self.sessions.retain(|_, session| session.expires_at > now);
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<BackendConfig>,
    store: Arc<RwLock<Store>>,
}

pub fn app() -> Router {
    app_with(BackendConfig::default())
}

pub fn app_with(config: BackendConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/admin/ads", get(list_ads).post(create_image_ad))
        .route("/api/admin/ads/iframe", post(create_iframe_ad))
        .route("/api/admin/ads/{id}", get(get_ad).patch(update_ad).delete(delete_ad))
        .route("/static/ads/{file}", get(get_image))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, BackendConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: BackendConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Treat blank form/JSON strings as absent, the way the admin forms send them.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

async fn current_admin(state: &AppState, headers: &HeaderMap) -> Result<String, BackendError> {
    let id = session_id(headers).ok_or(BackendError::Unauthorized)?;
    let mut store = state.store.write().await;
    match store.sessions.get(id) {
        Some(session) if session.expires_at > Instant::now() => Ok(session.login_id.clone()),
        Some(_) => {
            store.sessions.remove(id);
            Err(BackendError::Unauthorized)
        }
        None => Err(BackendError::Unauthorized),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<impl IntoResponse, BackendError> {
    if input.login_id != state.config.login_id || input.password != state.config.password {
        warn!(login_id = %input.login_id, "admin login rejected");
        return Err(BackendError::InvalidCredentials);
    }

    let id = Uuid::new_v4().simple().to_string();
    let ttl = state.config.session_ttl;
    let now = Instant::now();
    let mut store = state.store.write().await;
    store.prune_sessions(now);
    store.sessions.insert(
        id.clone(),
        Session {
            login_id: input.login_id.clone(),
            expires_at: now + ttl,
        },
    );
    drop(store);
    info!(login_id = %input.login_id, "admin logged in");

    let cookie = format!(
        "{SESSION_COOKIE}={id}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ttl.as_secs()
    );
    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::ok("login ok", json!({ "username": input.login_id })),
    ))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(id) = session_id(&headers) {
        state.store.write().await.sessions.remove(id);
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    ([(SET_COOKIE, cookie)], ApiResponse::ok("logged out", Value::Null))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<AdminMe>>, BackendError> {
    let login_id = current_admin(&state, &headers).await?;
    Ok(ApiResponse::ok(
        "current admin",
        AdminMe {
            login_id,
            created_at: now_timestamp(),
        },
    ))
}

async fn list_ads(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<AdPage>>, BackendError> {
    current_admin(&state, &headers).await?;
    let store = state.store.read().await;

    let keyword = non_blank(params.keyword);
    let matching: Vec<&Ad> = store
        .active_ads()
        .rev()
        .filter(|ad| match &keyword {
            Some(k) => {
                ad.title.contains(k.as_str())
                    || ad.description.as_deref().is_some_and(|d| d.contains(k.as_str()))
            }
            None => true,
        })
        .collect();

    let total = matching.len() as u64;
    let total_pages = if params.size > 0 {
        total.div_ceil(params.size as u64) as u32
    } else {
        1
    };
    let content = matching
        .into_iter()
        .skip(params.page as usize * params.size as usize)
        .take(params.size as usize)
        .cloned()
        .collect();

    Ok(ApiResponse::ok(
        "ad list",
        AdPage {
            content,
            page: params.page,
            size: params.size,
            total_elements: total,
            total_pages,
        },
    ))
}

async fn get_ad(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Ad>>, BackendError> {
    current_admin(&state, &headers).await?;
    let store = state.store.read().await;
    let ad = store
        .ads
        .get(&id)
        .filter(|row| row.active)
        .map(|row| row.ad.clone())
        .ok_or(BackendError::NotFound)?;
    Ok(ApiResponse::ok("ad detail", ad))
}

async fn create_image_ad(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Ad>>, BackendError> {
    current_admin(&state, &headers).await?;

    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image: Option<(String, StoredImage)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BackendError::Invalid(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field
                .file_name()
                .and_then(|f| f.rsplit(['/', '\\']).next())
                .unwrap_or("upload")
                .to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| BackendError::Invalid(e.body_text()))?;
            image = Some((
                file_name,
                StoredImage {
                    content_type,
                    bytes: bytes.to_vec(),
                },
            ));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| BackendError::Invalid(e.body_text()))?;
            fields.insert(name, text);
        }
    }

    let title = non_blank(fields.remove("title"))
        .ok_or_else(|| BackendError::Invalid("title is required".to_string()))?;
    let (file_name, stored) =
        image.ok_or_else(|| BackendError::Invalid("image is required".to_string()))?;

    let mut store = state.store.write().await;
    let stored_name = format!("{}_{file_name}", chrono::Utc::now().timestamp_millis());
    let image_url = format!("/static/ads/{stored_name}");
    store.images.insert(stored_name, stored);

    store.next_id += 1;
    let ad = Ad {
        id: store.next_id,
        title,
        description: non_blank(fields.remove("description")),
        kind: AdKind::Image {
            image_url: Some(image_url),
            target_url: non_blank(fields.remove("target_url")),
            short_url: None,
        },
        created_at: now_timestamp(),
    };
    store.insert_ad(ad.clone());
    info!(id = ad.id, "image ad created");
    Ok(ApiResponse::ok("ad created", ad))
}

async fn create_iframe_ad(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateIframeAd>,
) -> Result<Json<ApiResponse<Ad>>, BackendError> {
    current_admin(&state, &headers).await?;
    if input.title.trim().is_empty() {
        return Err(BackendError::Invalid("title is required".to_string()));
    }
    if input.embed_src.trim().is_empty() || input.embed_width == 0 || input.embed_height == 0 {
        return Err(BackendError::Invalid(
            "embed_src, embed_width and embed_height are required".to_string(),
        ));
    }

    let mut store = state.store.write().await;
    store.next_id += 1;
    let ad = Ad {
        id: store.next_id,
        title: input.title,
        description: non_blank(input.description),
        kind: AdKind::Iframe {
            embed_src: input.embed_src,
            embed_width: input.embed_width,
            embed_height: input.embed_height,
        },
        created_at: now_timestamp(),
    };
    store.insert_ad(ad.clone());
    info!(id = ad.id, "iframe ad created");
    Ok(ApiResponse::ok("ad created", ad))
}

async fn update_ad(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<UpdateAd>,
) -> Result<Json<ApiResponse<Ad>>, BackendError> {
    current_admin(&state, &headers).await?;
    let mut store = state.store.write().await;
    let ad = &mut store.active_ad_mut(id).ok_or(BackendError::NotFound)?.ad;

    match &mut ad.kind {
        AdKind::Image { target_url, .. } => {
            if input.embed_src.is_some() || input.embed_width.is_some() || input.embed_height.is_some() {
                return Err(BackendError::Invalid("embed fields do not apply to IMAGE ads".to_string()));
            }
            if let Some(url) = input.target_url {
                *target_url = non_blank(Some(url));
            }
        }
        AdKind::Iframe {
            embed_src,
            embed_width,
            embed_height,
        } => {
            if input.target_url.is_some() {
                return Err(BackendError::Invalid("target_url does not apply to IFRAME ads".to_string()));
            }
            if let Some(src) = input.embed_src {
                *embed_src = src;
            }
            if let Some(width) = input.embed_width {
                *embed_width = width;
            }
            if let Some(height) = input.embed_height {
                *embed_height = height;
            }
        }
    }
    if let Some(title) = input.title {
        ad.title = title;
    }
    if let Some(description) = input.description {
        ad.description = non_blank(Some(description));
    }
    debug!(id, "ad updated");
    Ok(ApiResponse::ok("ad updated", ad.clone()))
}

async fn delete_ad(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, BackendError> {
    current_admin(&state, &headers).await?;
    let mut store = state.store.write().await;
    store.active_ad_mut(id).ok_or(BackendError::NotFound)?.active = false;
    info!(id, "ad deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, BackendError> {
    let store = state.store.read().await;
    let image = store.images.get(&file).ok_or(BackendError::NotFound)?;
    Ok(([(CONTENT_TYPE, image.content_type.clone())], image.bytes.clone()).into_response())
}
