// Device registry HTTP client
//
// Wraps `reqwest::Client` with base-URL handling, bearer credential
// injection, cancellation and uniform error classification. Endpoint
// groups (auth, devices) are implemented as inherent methods in separate
// files to keep this module focused on transport mechanics.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Fallback when a failed response carries no readable message.
pub const GENERIC_SERVER_ERROR: &str = "server error";

const UNAUTHORIZED_FALLBACK: &str = "session expired or invalid credentials";

// ── Error response shape ─────────────────────────────────────────────

/// FastAPI-style error body: `{"detail": "..."}` or
/// `{"detail": [{"msg": "...", ...}]}` for validation failures.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Items(Vec<ValidationItem>),
    Other(serde_json::Value),
}

#[derive(serde::Deserialize)]
struct ValidationItem {
    #[serde(default)]
    msg: Option<String>,
}

/// Pull a human-readable message out of an error body.
///
/// JSON bodies yield their `detail` (or `message`) field; anything that is
/// not JSON is returned verbatim. `None` means nothing usable was found.
pub(crate) fn extract_message(raw: &str) -> Option<String> {
    match serde_json::from_str::<ErrorResponse>(raw) {
        Ok(body) => {
            let detail = match body.detail {
                Some(ErrorDetail::Text(text)) => Some(text),
                Some(ErrorDetail::Items(items)) => {
                    let joined = items
                        .into_iter()
                        .filter_map(|item| item.msg)
                        .collect::<Vec<_>>()
                        .join("; ");
                    Some(joined)
                }
                Some(ErrorDetail::Other(_)) | None => None,
            };
            detail
                .filter(|m| !m.trim().is_empty())
                .or_else(|| body.message.filter(|m| !m.trim().is_empty()))
        }
        Err(_) => {
            let text = raw.trim();
            (!text.is_empty()).then(|| text.to_owned())
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Raw HTTP client for the device registry backend.
///
/// Holds the bearer credential for the current session. The client never
/// decides what a failure means for the session: a 401 is reported as
/// [`Error::Unauthorized`] and the credential stays untouched until the
/// owner clears it.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    /// Bearer token attached to every JSON request while present.
    token: RwLock<Option<SecretString>>,
    /// Cancelled when the owning application context shuts down.
    cancel: CancellationToken,
}

impl ApiClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root (e.g. `https://svr.example.org`); a
    /// path prefix is preserved.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            token: RwLock::new(None),
            cancel: CancellationToken::new(),
        })
    }

    /// Tie every request to `cancel`: once it fires, in-flight and future
    /// requests resolve to [`Error::Cancelled`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The backend base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The cancellation token guarding this client's requests.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    // ── Credential management ────────────────────────────────────────

    /// Store the bearer credential used for subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        debug!("storing bearer credential");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Drop the bearer credential. Returns `true` if one was held.
    pub fn clear_token(&self) -> bool {
        let previous = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("bearer credential cleared");
        }
        previous.is_some()
    }

    /// Whether a bearer credential is currently held.
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Attach `Authorization: Bearer <token>` when a credential is held.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authorized request builder carrying the JSON content type.
    fn json_request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.authorize(builder)
    }

    /// Race `fut` against the cancellation token.
    async fn run<T>(&self, fut: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!("request cancelled");
                Err(Error::Cancelled)
            }
            result = fut => result,
        }
    }

    /// Send a GET request and deserialize the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let builder = self.json_request(Method::GET, url);
        self.run(async move { handle_response(builder.send().await?).await })
            .await
    }

    /// Send a GET request with query parameters.
    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");
        let builder = self.json_request(Method::GET, url).query(params);
        self.run(async move { handle_response(builder.send().await?).await })
            .await
    }

    /// Send a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {url}");
        let builder = self.json_request(Method::POST, url).json(body);
        self.run(async move { handle_response(builder.send().await?).await })
            .await
    }

    /// Send a form-url-encoded POST without any credential.
    ///
    /// Only the token exchange uses this: it must not leak a stale bearer
    /// token from a previous session.
    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &[(&str, &str)],
    ) -> Result<T, Error> {
        debug!("POST {url} (form)");
        let builder = self.http.post(url).form(form);
        self.run(async move { handle_response(builder.send().await?).await })
            .await
    }

    /// Send a PUT request with a JSON body.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PUT {url}");
        let builder = self.json_request(Method::PUT, url).json(body);
        self.run(async move { handle_response(builder.send().await?).await })
            .await
    }

    /// Send a PUT request whose response body is irrelevant.
    pub(crate) async fn put_no_response(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        debug!("PUT {url}");
        let builder = self.json_request(Method::PUT, url).json(body);
        self.run(async move { handle_empty(builder.send().await?).await })
            .await
    }

    /// Send a DELETE request.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");
        let builder = self.json_request(Method::DELETE, url);
        self.run(async move { handle_empty(builder.send().await?).await })
            .await
    }

    /// Generic authenticated call: `method path [body] -> JSON`.
    ///
    /// `path` is resolved against the base URL and may carry a query
    /// string. A successful response with an empty body yields `true`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, Error> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        debug!("{method} {url}");

        let mut builder = self.json_request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        self.run(async move {
            let resp = builder.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(parse_error(status, resp).await);
            }
            let text = resp.text().await?;
            if text.trim().is_empty() {
                return Ok(serde_json::Value::Bool(true));
            }
            serde_json::from_str(&text).map_err(|e| deserialization_error(&e, text))
        })
        .await
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(status, resp).await);
    }
    let body = resp.text().await?;
    trace!(len = body.len(), "response body received");
    serde_json::from_str(&body).map_err(|e| deserialization_error(&e, body))
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

/// Classify a non-2xx response. 401 is reported separately so the owner
/// can invalidate its session; everything else is a server error.
async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();
    let message = extract_message(&raw);
    debug!(status = status.as_u16(), ?message, "request failed");

    if status == StatusCode::UNAUTHORIZED {
        Error::Unauthorized {
            message: message.unwrap_or_else(|| UNAUTHORIZED_FALLBACK.into()),
        }
    } else {
        Error::Server {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| GENERIC_SERVER_ERROR.into()),
        }
    }
}

fn deserialization_error(err: &serde_json::Error, body: String) -> Error {
    let preview: String = body.chars().take(200).collect();
    Error::Deserialization {
        message: format!("{err} (body preview: {preview:?})"),
        body,
    }
}

fn normalize_base_url(mut url: Url) -> Result<Url, Error> {
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl(
            url::ParseError::RelativeUrlWithCannotBeABaseBase,
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn extracts_detail_string() {
        assert_eq!(
            extract_message(r#"{"detail":"Device not found"}"#).as_deref(),
            Some("Device not found")
        );
    }

    #[test]
    fn joins_validation_messages() {
        let raw = r#"{"detail":[{"loc":["body","mac"],"msg":"bad mac"},{"msg":"bad power"}]}"#;
        assert_eq!(
            extract_message(raw).as_deref(),
            Some("bad mac; bad power")
        );
    }

    #[test]
    fn falls_back_to_message_field() {
        assert_eq!(
            extract_message(r#"{"message":"quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
    }

    #[test]
    fn non_json_body_is_used_verbatim() {
        assert_eq!(
            extract_message("Bad Gateway\n").as_deref(),
            Some("Bad Gateway")
        );
    }

    #[test]
    fn empty_or_fieldless_body_has_no_message() {
        assert_eq!(extract_message(""), None);
        assert_eq!(extract_message(r#"{"error":true}"#), None);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://svr.example.org/backend").unwrap(),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://svr.example.org/backend/");
        assert_eq!(
            client.endpoint(&["api", "v1", "user", "devices", "42"]).unwrap().as_str(),
            "https://svr.example.org/backend/api/v1/user/devices/42"
        );
    }

    #[test]
    fn token_lifecycle() {
        let client = ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://svr.example.org").unwrap(),
        )
        .unwrap();
        assert!(!client.has_token());
        client.set_token(SecretString::from("T".to_owned()));
        assert!(client.has_token());
        assert!(client.clear_token());
        assert!(!client.clear_token());
    }
}
