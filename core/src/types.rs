//! Domain DTOs for the ad admin API.
//!
//! # Design
//! These types mirror the backend's JSON but are defined independently of
//! the mock-server crate; integration tests catch schema drift.
//!
//! An ad is one of two kinds, distinguished by `ad_type`. The shared fields
//! live on [`Ad`] and the kind-specific ones on [`AdKind`], so code that
//! needs the specifics matches on the kind instead of probing for fields.

use serde::{Deserialize, Serialize};

use crate::http::MultipartForm;

/// Kind-specific part of an ad, tagged by `ad_type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ad_type")]
pub enum AdKind {
    #[serde(rename = "IMAGE")]
    Image {
        target_url: Option<String>,
        image_url: Option<String>,
        short_url: Option<String>,
    },
    #[serde(rename = "IFRAME")]
    Iframe {
        embed_src: String,
        embed_width: u32,
        embed_height: u32,
    },
}

/// A single ad as returned by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AdWire", into = "AdWire")]
pub struct Ad {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Creation timestamp exactly as the backend formatted it.
    pub created: Option<String>,
    pub kind: AdKind,
}

impl Ad {
    pub fn ad_type(&self) -> &'static str {
        match self.kind {
            AdKind::Image { .. } => "IMAGE",
            AdKind::Iframe { .. } => "IFRAME",
        }
    }

    /// Where the ad sends (or embeds) the viewer.
    pub fn destination(&self) -> Option<&str> {
        match &self.kind {
            AdKind::Image { target_url, .. } => target_url.as_deref(),
            AdKind::Iframe { embed_src, .. } => Some(embed_src),
        }
    }
}

/// Wire shape of [`Ad`]. The timestamp has shown up under three names;
/// `created_at` wins over `createdAt`, which wins over `created`.
#[derive(Serialize, Deserialize)]
struct AdWire {
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, rename = "createdAt", skip_serializing)]
    created_at_camel: Option<String>,
    #[serde(default, skip_serializing)]
    created: Option<String>,
    #[serde(flatten)]
    kind: AdKind,
}

impl From<AdWire> for Ad {
    fn from(wire: AdWire) -> Self {
        Self {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            created: wire.created_at.or(wire.created_at_camel).or(wire.created),
            kind: wire.kind,
        }
    }
}

impl From<Ad> for AdWire {
    fn from(ad: Ad) -> Self {
        Self {
            id: ad.id,
            title: ad.title,
            description: ad.description,
            created_at: ad.created,
            created_at_camel: None,
            created: None,
            kind: ad.kind,
        }
    }
}

/// One page of the ad list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdPage {
    #[serde(default)]
    pub content: Vec<Ad>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
}

/// The logged-in admin, from `GET /api/admin/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    #[serde(rename = "loginId", default)]
    pub login_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

impl AdminProfile {
    pub fn display_name(&self) -> &str {
        [&self.login_id, &self.username]
            .into_iter()
            .find_map(|name| name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("admin")
    }
}

/// Whether the cookie jar currently holds a live admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(AdminProfile),
    Anonymous,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Request payload for `POST /api/admin/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "loginId")]
    pub login_id: String,
    pub password: String,
}

/// What a successful login reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub message: Option<String>,
    pub username: Option<String>,
}

/// Image file attached to a new image ad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A banner image ad to create. Sent as multipart because of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImageAd {
    pub title: String,
    pub description: Option<String>,
    pub target_url: Option<String>,
    pub image: ImageUpload,
}

impl NewImageAd {
    pub fn into_form(self) -> MultipartForm {
        let mut form = MultipartForm::new().text("title", self.title);
        if let Some(description) = self.description {
            form = form.text("description", description);
        }
        if let Some(target_url) = self.target_url {
            form = form.text("target_url", target_url);
        }
        form.file(
            "image",
            &self.image.file_name,
            &self.image.content_type,
            self.image.bytes,
        )
    }
}

/// An iframe embed ad to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIframeAd {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub embed_src: String,
    pub embed_width: u32,
    pub embed_height: u32,
}

/// Partial update for `PATCH /api/admin/ads/{id}`. Only the fields that are
/// set are sent; the rest stay unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_height: Option<u32>,
}
