use std::collections::HashMap;

use axum::{
    async_trait,
    body::to_bytes,
    extract::{FromRequest, Multipart, Request},
    http::header,
    response::Response,
};

use crate::models::ResponseEnvelope;

const MAX_FORM_BYTES: usize = 64 * 1024;
pub const UNREADABLE_FORM_MESSAGE: &str = "The submitted form could not be read";

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("multipart: {0}")]
    Multipart(String),
    #[error("body: {0}")]
    Body(String),
}

/// Submitted form fields, read from either a multipart or a url-encoded body.
/// A body without a content type is read as url-encoded. A later field with
/// the same name replaces an earlier one.
#[derive(Debug, Default)]
pub struct SubmittedForm(pub HashMap<String, String>);

#[async_trait]
impl<S> FromRequest<S> for SubmittedForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        read_fields(req, state).await.map(SubmittedForm).map_err(|e| {
            tracing::info!(error = %e, "unreadable submission");
            crate::json_response(&ResponseEnvelope::error(UNREADABLE_FORM_MESSAGE))
        })
    }
}

async fn read_fields<S>(req: Request, state: &S) -> Result<HashMap<String, String>, FormError>
where
    S: Send + Sync,
{
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| FormError::Multipart(e.to_string()))?;
        let mut fields = HashMap::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| FormError::Multipart(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field
                .text()
                .await
                .map_err(|e| FormError::Multipart(e.to_string()))?;
            fields.insert(name, value);
        }
        return Ok(fields);
    }

    let body = to_bytes(req.into_body(), MAX_FORM_BYTES)
        .await
        .map_err(|e| FormError::Body(e.to_string()))?;
    Ok(url::form_urlencoded::parse(&body).into_owned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http};

    async fn extract(req: Request) -> Result<HashMap<String, String>, FormError> {
        read_fields(req, &()).await
    }

    #[tokio::test]
    async fn reads_url_encoded_body() {
        let req = http::Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("version=3.1.0&url=https%3A%2F%2Ftwitter.com%2Fa"))
            .unwrap();
        let fields = extract(req).await.unwrap();
        assert_eq!(fields.get("version").map(String::as_str), Some("3.1.0"));
        assert_eq!(fields.get("url").map(String::as_str), Some("https://twitter.com/a"));
    }

    #[tokio::test]
    async fn reads_body_without_content_type_as_url_encoded() {
        let req = http::Request::post("/")
            .body(Body::from("version=3.1.0&version=3.2.0"))
            .unwrap();
        let fields = extract(req).await.unwrap();
        assert_eq!(fields.get("version").map(String::as_str), Some("3.2.0"));
    }

    #[tokio::test]
    async fn reads_multipart_body() {
        let body = "--XX\r\n\
            Content-Disposition: form-data; name=\"version\"\r\n\r\n\
            3.1.0\r\n\
            --XX\r\n\
            Content-Disposition: form-data; name=\"selector\"\r\n\r\n\
            {\"selector\":true}\r\n\
            --XX--\r\n";
        let req = http::Request::post("/")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XX")
            .body(Body::from(body))
            .unwrap();
        let fields = extract(req).await.unwrap();
        assert_eq!(fields.get("version").map(String::as_str), Some("3.1.0"));
        assert_eq!(
            fields.get("selector").map(String::as_str),
            Some("{\"selector\":true}")
        );
    }

    #[tokio::test]
    async fn oversized_body_is_an_error() {
        let req = http::Request::post("/")
            .body(Body::from("a".repeat(MAX_FORM_BYTES + 1)))
            .unwrap();
        assert!(matches!(extract(req).await, Err(FormError::Body(_))));
    }
}
