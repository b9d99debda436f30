use std::net::SocketAddr;

// ── Defaults ─────────────────────────────────────────────────────────────────

const DEFAULT_SUPPORTED_VERSIONS: &str = "3.1.0";
const DEFAULT_PLATFORM_DOMAIN: &str = "twitter.com";
const DEFAULT_SHORTCUT_ID: &str = "6166";
const DEFAULT_SHORTCUT_NAME: &str = "DTwitter";
const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DTWITTER_BEARER_TOKEN is not set")]
    MissingToken,
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
    #[error("no supported client versions configured")]
    EmptyVersionList,
}

// ── Config ───────────────────────────────────────────────────────────────────

/// Deployment-time settings. Loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub bearer_token: String,
    pub supported_versions: Vec<String>,
    pub platform_domain: String,
    pub shortcut_id: String,
    pub shortcut_name: String,
    pub api_base: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bearer_token = get("DTWITTER_BEARER_TOKEN")
            .or_else(|| get("TOKEN"))
            .ok_or(ConfigError::MissingToken)?;

        let supported_versions: Vec<String> = get("DTWITTER_SUPPORTED_VERSIONS")
            .unwrap_or_else(|| DEFAULT_SUPPORTED_VERSIONS.to_string())
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if supported_versions.is_empty() {
            return Err(ConfigError::EmptyVersionList);
        }

        let bind_raw = get("DTWITTER_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        Ok(Self {
            bearer_token,
            supported_versions,
            platform_domain: get("DTWITTER_PLATFORM_DOMAIN")
                .unwrap_or_else(|| DEFAULT_PLATFORM_DOMAIN.to_string()),
            shortcut_id: get("DTWITTER_SHORTCUT_ID")
                .unwrap_or_else(|| DEFAULT_SHORTCUT_ID.to_string()),
            shortcut_name: get("DTWITTER_SHORTCUT_NAME")
                .unwrap_or_else(|| DEFAULT_SHORTCUT_NAME.to_string()),
            api_base: get("DTWITTER_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            bind_addr,
        })
    }

    /// Distribution page where out-of-date clients fetch the latest release.
    pub fn update_url(&self) -> String {
        format!("https://routinehub.co/shortcut/{}/", self.shortcut_id)
    }

    pub fn supports_version(&self, version: &str) -> bool {
        self.supported_versions.iter().any(|v| v == version)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DTWITTER_BEARER_TOKEN" => Some("test-token".to_string()),
        _ => None,
    })
    .expect("test config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = test_config();
        assert_eq!(config.supported_versions, vec!["3.1.0"]);
        assert_eq!(config.platform_domain, "twitter.com");
        assert_eq!(config.shortcut_name, "DTwitter");
        assert_eq!(config.api_base, "https://api.twitter.com");
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.update_url(), "https://routinehub.co/shortcut/6166/");
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));

        let err = Config::from_lookup(lookup_from(&[("DTWITTER_BEARER_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn legacy_token_variable_is_accepted() {
        let config = Config::from_lookup(lookup_from(&[("TOKEN", "abc")])).unwrap();
        assert_eq!(config.bearer_token, "abc");
    }

    #[test]
    fn version_list_is_split_and_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            ("TOKEN", "abc"),
            ("DTWITTER_SUPPORTED_VERSIONS", "3.1.0, 3.2.0,,"),
        ]))
        .unwrap();
        assert!(config.supports_version("3.1.0"));
        assert!(config.supports_version("3.2.0"));
        assert!(!config.supports_version("3.0.0"));
    }

    #[test]
    fn separators_only_version_list_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("TOKEN", "abc"),
            ("DTWITTER_SUPPORTED_VERSIONS", ",,"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyVersionList));
    }

    #[test]
    fn bad_bind_addr_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("TOKEN", "abc"),
            ("DTWITTER_BIND_ADDR", "not-an-addr"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr(addr) if addr == "not-an-addr"));
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            ("TOKEN", "abc"),
            ("DTWITTER_API_BASE", "http://127.0.0.1:9000/"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
    }
}
