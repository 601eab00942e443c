use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{Result, UploadError};
use crate::options::UploadOptions;
use crate::resource::ResourceRoute;

pub const FHIR_JSON: &str = "application/fhir+json";

// Longest slice of a non-FHIR error body kept for reporting.
const MAX_BODY_EXCERPT: usize = 500;

/// Server acknowledgement of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub status: u16,
    pub location: Option<String>,
}

/// Why a single upload did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The server answered with a non-2xx status.
    Http { status: u16, message: String },
    /// No usable response (connection refused, timeout).
    Transport { message: String },
}

impl FailureKind {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }

    /// 422 means the server understood the request but rejected the content.
    pub fn is_unprocessable(&self) -> bool {
        self.status() == Some(422)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { status, message } if message.is_empty() => write!(f, "HTTP {status}"),
            Self::Http { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Transport { message } => write!(f, "request failed: {message}"),
        }
    }
}

/// Thin REST client for one FHIR base URL.
pub struct FhirClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl FhirClient {
    pub fn new(target: &str, options: &UploadOptions) -> Result<Self> {
        let base_url = parse_base_url(target)?;

        let mut builder =
            reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(UploadError::HttpClient)?;

        Ok(Self {
            http,
            base_url,
            token: options.access_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, route: &ResourceRoute) -> Url {
        route.endpoint(&self.base_url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.header(ACCEPT, FHIR_JSON)
    }

    /// Send `body` unchanged to the endpoint for `route`.
    pub async fn upload(
        &self,
        route: &ResourceRoute,
        body: Vec<u8>,
    ) -> std::result::Result<Accepted, FailureKind> {
        let url = self.endpoint(route);
        let resp = self
            .request(route.method().as_http(), url)
            .header(CONTENT_TYPE, FHIR_JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| FailureKind::Transport {
                message: e.to_string(),
            })?;

        let status = resp.status();
        if status.is_success() {
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Ok(Accepted {
                status: status.as_u16(),
                location,
            });
        }

        let body = resp.text().await.unwrap_or_default();
        Err(FailureKind::Http {
            status: status.as_u16(),
            message: failure_message(&body),
        })
    }
}

/// Validate the target and make sure it can take path segments.
pub fn parse_base_url(target: &str) -> Result<Url> {
    let url = Url::parse(target.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UploadError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.cannot_be_a_base() {
        return Err(UploadError::NotABase(target.to_string()));
    }
    Ok(url)
}

/// Reduce an error body to something printable: the diagnostics of an
/// `OperationOutcome` when there is one, otherwise the start of the body.
fn failure_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body)
        && json.get("resourceType").and_then(|v| v.as_str()) == Some("OperationOutcome")
        && let Some(issues) = json.get("issue").and_then(|v| v.as_array())
    {
        let msgs: Vec<&str> = issues
            .iter()
            .filter_map(|i| i.get("diagnostics").and_then(|d| d.as_str()))
            .collect();
        if !msgs.is_empty() {
            return msgs.join("; ");
        }
    }

    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url() {
        let url = parse_base_url("http://localhost:8080/r4").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/r4");

        assert!(matches!(
            parse_base_url("ftp://example.org/fhir"),
            Err(UploadError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            parse_base_url("not a url"),
            Err(UploadError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_failure_message_from_operation_outcome() {
        let body = r#"{
            "resourceType": "OperationOutcome",
            "issue": [
                {"severity": "error", "code": "invalid", "diagnostics": "Unknown element 'foo'"},
                {"severity": "error", "code": "invalid", "diagnostics": "Missing 'status'"}
            ]
        }"#;
        assert_eq!(
            failure_message(body),
            "Unknown element 'foo'; Missing 'status'"
        );
    }

    #[test]
    fn test_failure_message_plain_body() {
        assert_eq!(failure_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(failure_message(""), "");

        let long = "x".repeat(MAX_BODY_EXCERPT + 10);
        let message = failure_message(&long);
        assert_eq!(message.len(), MAX_BODY_EXCERPT + 3);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_failure_kind_display() {
        let http = FailureKind::Http {
            status: 404,
            message: String::new(),
        };
        assert_eq!(http.to_string(), "HTTP 404");
        assert!(!http.is_unprocessable());

        let rejected = FailureKind::Http {
            status: 422,
            message: "invalid".into(),
        };
        assert_eq!(rejected.to_string(), "HTTP 422: invalid");
        assert!(rejected.is_unprocessable());

        let transport = FailureKind::Transport {
            message: "connection refused".into(),
        };
        assert_eq!(transport.status(), None);
    }
}
