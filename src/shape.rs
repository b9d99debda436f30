use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{
    Media, MediaDescriptor, QualitySelector, ResponseEnvelope, TweetPayload, Variant,
};

// ── Messages ─────────────────────────────────────────────────────────────────

pub const UNAVAILABLE_MESSAGE: &str =
    "Twitter's API does not seem to be working right now, please try again later";
pub const NO_MEDIA_MESSAGE: &str = "Media not found for inputted URL";
const RATE_LIMITED_DETAIL: &str = "Too Many Requests";

static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.([a-z]+)$").unwrap());

// ── Classification ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum Outcome {
    Unavailable,
    Rejected(String),
    NoMedia,
    Success(Vec<Media>),
}

/// Decodes the upstream body. Anything that does not decode is `None`.
pub fn parse_payload(raw: &str) -> Option<TweetPayload> {
    match serde_json::from_str::<TweetPayload>(raw) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!(error = %e, "upstream payload did not decode");
            None
        }
    }
}

pub fn classify(payload: Option<TweetPayload>) -> Outcome {
    let Some(payload) = payload else {
        return Outcome::Unavailable;
    };
    if payload.detail.as_deref() == Some(RATE_LIMITED_DETAIL) {
        return Outcome::Unavailable;
    }

    if let Some(errors) = payload.errors {
        let first = errors
            .into_iter()
            .next()
            .and_then(|e| e.message.filter(|m| !m.is_empty()).or(e.detail));
        return match first {
            Some(message) => Outcome::Rejected(message.replacen('.', "", 1)),
            None => Outcome::Unavailable,
        };
    }

    match payload.data.and_then(|data| data.attachments) {
        Some(attachments) => {
            tracing::debug!(media_keys = attachments.media_keys.len(), "tweet has attachments");
        }
        None => return Outcome::NoMedia,
    }

    match payload.includes {
        Some(includes) if !includes.media.is_empty() => Outcome::Success(includes.media),
        _ => Outcome::NoMedia,
    }
}

// ── Public API ───────────────────────────────────────────────────────────────

pub fn shape(raw: &str, show_selector: bool) -> ResponseEnvelope {
    match classify(parse_payload(raw)) {
        Outcome::Unavailable => ResponseEnvelope::error(UNAVAILABLE_MESSAGE),
        Outcome::Rejected(message) => ResponseEnvelope::error(message),
        Outcome::NoMedia => ResponseEnvelope::error(NO_MEDIA_MESSAGE),
        Outcome::Success(media) => ResponseEnvelope::Media {
            media: media
                .iter()
                .filter_map(|item| describe(item, show_selector))
                .collect(),
        },
    }
}

/// Builds the client-facing descriptor for one attachment. Items that cannot
/// be described (unknown type, no usable URL) are dropped.
pub fn describe(media: &Media, show_selector: bool) -> Option<MediaDescriptor> {
    let descriptor = match media.kind.as_str() {
        "video" | "animated_gif" => describe_variants(media, show_selector),
        "photo" => media
            .url
            .as_deref()
            .and_then(original_photo_link)
            .map(|link| MediaDescriptor::Photo { link }),
        _ => None,
    };

    if descriptor.is_none() {
        tracing::warn!(
            kind = %media.kind,
            media_key = media.media_key.as_deref().unwrap_or(""),
            "dropping media item"
        );
    }
    descriptor
}

fn describe_variants(media: &Media, show_selector: bool) -> Option<MediaDescriptor> {
    let ranked = ranked_variants(&media.variants);

    if show_selector && media.kind == "video" {
        let tier = |i: usize| ranked.get(i).and_then(|v| v.url.clone());
        return Some(MediaDescriptor::Selector {
            link: QualitySelector {
                low: tier(0)?,
                medium: tier(1),
                high: tier(2),
            },
        });
    }

    let link = ranked.last()?.url.clone()?;
    if media.kind == "animated_gif" {
        Some(MediaDescriptor::AnimatedGif {
            link,
            width: media.width,
            height: media.height,
        })
    } else {
        Some(MediaDescriptor::Video { link })
    }
}

/// Bitrate-tagged variants in ascending bitrate order.
fn ranked_variants(variants: &[Variant]) -> Vec<&Variant> {
    let mut ranked: Vec<&Variant> = variants.iter().filter(|v| v.bit_rate.is_some()).collect();
    ranked.sort_by_key(|v| v.bit_rate);
    ranked
}

/// `https://x.com/img.jpg` -> `https://x.com/img?format=jpg&name=orig`
pub fn original_photo_link(url: &str) -> Option<String> {
    let caps = EXTENSION_RE.captures(url)?;
    let whole = caps.get(0)?;
    let extension = caps.get(1)?.as_str();
    Some(format!(
        "{}?format={}&name=orig",
        &url[..whole.start()],
        extension
    ))
}
