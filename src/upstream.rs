use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use url::Url;

use crate::config::Config;

const USER_AGENT: &str = "dtwitter-api/1.0";
const EXPANSIONS: &str = "attachments.media_keys";
const MEDIA_FIELDS: &str = "width,height,type,url,variants";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),
    #[error("invalid bearer token")]
    InvalidToken,
    #[error("{0}")]
    Request(String),
}

/// Thin client for the Tweet lookup endpoint of the v2 API.
#[derive(Clone)]
pub struct TwitterClient {
    client: reqwest::Client,
    api_base: String,
}

impl TwitterClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.bearer_token))
            .map_err(|_| UpstreamError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
        })
    }

    pub fn tweet_url(&self, post_id: &str) -> Result<Url, UpstreamError> {
        let raw = format!("{}/2/tweets/{}", self.api_base, post_id);
        let mut url = Url::parse(&raw).map_err(|_| UpstreamError::InvalidUrl(raw))?;
        url.query_pairs_mut()
            .append_pair("expansions", EXPANSIONS)
            .append_pair("media.fields", MEDIA_FIELDS);
        Ok(url)
    }

    /// Returns the raw body. Non-2xx answers still carry the error document
    /// the shaper needs, so only transport failures are errors here.
    pub async fn fetch_tweet(&self, post_id: &str) -> Result<String, UpstreamError> {
        let url = self.tweet_url(post_id)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Request(format!("TimeoutError: {}", e))
            } else if e.is_connect() {
                UpstreamError::Request(format!("ConnectError: {}", e))
            } else {
                UpstreamError::Request(format!("RequestError: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, post_id, "upstream returned non-success status");
        }

        response
            .text()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))
    }
}

/// Base URL of a loopback port that was bound and released, so connecting fails.
#[cfg(test)]
pub(crate) fn unreachable_api_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn tweet_url_requests_media_expansion() {
        let client = TwitterClient::new(&test_config()).unwrap();
        let url = client.tweet_url("1234567890123456789").unwrap();
        assert_eq!(url.path(), "/2/tweets/1234567890123456789");
        assert_eq!(url.host_str(), Some("api.twitter.com"));

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("expansions".to_string(), "attachments.media_keys".to_string()),
                ("media.fields".to_string(), "width,height,type,url,variants".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_token_with_control_characters() {
        let mut config = test_config();
        config.bearer_token = "bad\ntoken".to_string();
        assert!(matches!(
            TwitterClient::new(&config),
            Err(UpstreamError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_request_error() {
        let mut config = test_config();
        config.api_base = unreachable_api_base();
        let client = TwitterClient::new(&config).unwrap();
        let err = client.fetch_tweet("1234567890123456789").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Request(_)));
    }
}
