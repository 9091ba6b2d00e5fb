//! HTTP utilities for OCI REST API calls

use super::auth::{OciSigner, CONTENT_TYPE_JSON};
use crate::error::{Error, Result, ServiceFailure};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Error body returned by OCI services
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Decoded response plus the headers the callers care about
#[derive(Debug, Clone)]
pub struct OciResponse {
    pub body: Value,
    pub etag: Option<String>,
    pub next_page: Option<String>,
}

/// Signed HTTP client for OCI API calls
#[derive(Clone)]
pub struct OciHttpClient {
    client: Client,
    signer: OciSigner,
}

impl OciHttpClient {
    pub fn new(signer: OciSigner) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("lpgctl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, signer })
    }

    pub async fn get(&self, url: &Url) -> Result<OciResponse> {
        self.send(Method::GET, url, None, &[]).await
    }

    /// POST with an optional `opc-retry-token` so a replayed create is a no-op
    pub async fn post(
        &self,
        url: &Url,
        body: &Value,
        retry_token: Option<&str>,
    ) -> Result<OciResponse> {
        let headers: Vec<(&str, &str)> = retry_token
            .map(|token| vec![("opc-retry-token", token)])
            .unwrap_or_default();
        self.send(Method::POST, url, Some(body), &headers).await
    }

    /// PUT guarded by `if-match` when an etag is known
    pub async fn put(&self, url: &Url, body: &Value, if_match: Option<&str>) -> Result<OciResponse> {
        let headers: Vec<(&str, &str)> = if_match
            .map(|etag| vec![("if-match", etag)])
            .unwrap_or_default();
        self.send(Method::PUT, url, Some(body), &headers).await
    }

    pub async fn delete(&self, url: &Url) -> Result<OciResponse> {
        self.send(Method::DELETE, url, None, &[]).await
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<OciResponse> {
        tracing::debug!("{} {}", method, url);

        let payload = body.map(serde_json::to_vec).transpose()?;
        let signed = self
            .signer
            .sign(method.as_str(), url, payload.as_deref())?;
        let request_id = uuid::Uuid::new_v4().simple().to_string();

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header("accept", CONTENT_TYPE_JSON)
            .header("date", &signed.date)
            .header("authorization", &signed.authorization)
            .header("opc-request-id", &request_id);

        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }

        if let Some(payload) = payload {
            request = request.header("content-type", CONTENT_TYPE_JSON);
            if let Some(sha) = &signed.content_sha256 {
                request = request.header("x-content-sha256", sha);
            }
            request = request.body(payload);
        }

        let response = request.send().await?;

        let status = response.status();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        let etag = header("etag");
        let next_page = header("opc-next-page");
        let response_request_id = header("opc-request-id").unwrap_or(request_id);

        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(
                "{} {} failed: {} - {}",
                method,
                url.path(),
                status,
                sanitize_for_log(&text)
            );
            let mut failure = decode_failure(status, &text);
            failure.request_id = Some(response_request_id);
            return Err(Error::Service(failure));
        }

        // Handle empty response
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(OciResponse {
            body,
            etag,
            next_page,
        })
    }
}

/// Turn an error response into a [`ServiceFailure`]
fn decode_failure(status: StatusCode, text: &str) -> ServiceFailure {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => ServiceFailure::new(status.as_u16(), body.code, body.message),
        Err(_) => ServiceFailure::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            sanitize_for_log(text),
        ),
    }
}
