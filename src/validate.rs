use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::models::{SelectorOption, ValidatedRequest};

static POST_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{18,}").unwrap());

// ── Rejection reasons ────────────────────────────────────────────────────────

/// Why a submission was refused. `Display` is the message shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Download the latest update on {update_url}")]
    ClientOutOfDate { update_url: String },
    #[error("URL not supported by {shortcut_name}")]
    UnsupportedSource { shortcut_name: String },
    #[error("The Tweet URL contains invalid parameters")]
    MalformedReference,
    #[error("The selector option could not be read")]
    MalformedSelector,
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Checks the submitted form fields in order, stopping at the first failure.
pub fn validate(
    fields: &HashMap<String, String>,
    config: &Config,
) -> Result<ValidatedRequest, Rejection> {
    let field = |name: &str| fields.get(name).map(String::as_str).filter(|v| !v.is_empty());

    let client_version = field("version")
        .filter(|v| config.supports_version(v))
        .ok_or_else(|| Rejection::ClientOutOfDate {
            update_url: config.update_url(),
        })?;

    let source_url = field("url")
        .filter(|u| u.contains(config.platform_domain.as_str()))
        .ok_or_else(|| Rejection::UnsupportedSource {
            shortcut_name: config.shortcut_name.clone(),
        })?;

    let post_id = POST_ID_RE
        .find(source_url)
        .ok_or(Rejection::MalformedReference)?
        .as_str();

    let show_variant_selector = match field("selector") {
        Some(raw) => parse_selector(raw)?,
        None => false,
    };

    Ok(ValidatedRequest {
        client_version: client_version.to_string(),
        source_url: source_url.to_string(),
        post_id: post_id.to_string(),
        show_variant_selector,
    })
}

/// Only text that is not JSON at all is refused. Any other shape without a
/// boolean `selector` key leaves the selector off.
fn parse_selector(raw: &str) -> Result<bool, Rejection> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| Rejection::MalformedSelector)?;
    Ok(serde_json::from_value::<SelectorOption>(value)
        .ok()
        .and_then(|opt| opt.selector)
        .unwrap_or(false))
}
