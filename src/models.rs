use serde::{Deserialize, Serialize};

// ── Inbound ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub client_version: String,
    pub source_url: String,
    pub post_id: String,
    pub show_variant_selector: bool,
}

/// The `selector` form field carries a JSON object of its own.
#[derive(Debug, Deserialize)]
pub struct SelectorOption {
    #[serde(default)]
    pub selector: Option<bool>,
}

// ── Upstream payload ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TweetPayload {
    pub detail: Option<String>,
    pub errors: Option<Vec<ApiError>>,
    pub data: Option<TweetData>,
    pub includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TweetData {
    pub attachments: Option<Attachments>,
}

#[derive(Debug, Deserialize)]
pub struct Attachments {
    #[serde(default)]
    pub media_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    pub media_key: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub bit_rate: Option<u64>,
    pub url: Option<String>,
}

// ── Outbound ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum MediaDescriptor {
    #[serde(rename = "photo")]
    Photo { link: String },
    #[serde(rename = "video")]
    Video { link: String },
    #[serde(rename = "animated_gif")]
    AnimatedGif {
        link: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<u64>,
    },
    #[serde(rename = "selector")]
    Selector { link: QualitySelector },
}

/// Up to three ascending-quality renditions of one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualitySelector {
    pub low: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Error { error: String },
    Media { media: Vec<MediaDescriptor> },
}

impl ResponseEnvelope {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}
