pub mod rewrite;

use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use reqwest::Url;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use rewrite::ContentKind;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Upstream headers copied onto the relayed response.
pub const PASSTHROUGH_HEADERS: [&str; 3] = ["last-modified", "etag", "expires"];

/// Why an outbound fetch never produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    Dns,
    Refused,
    ConnectTimeout,
    Tls,
    Network,
}

impl FetchFailure {
    pub fn message(self) -> &'static str {
        match self {
            FetchFailure::Dns => {
                "The site address could not be found. The domain may not exist or DNS failed."
            }
            FetchFailure::Refused => {
                "The site refused the connection. The server may be down or behind a firewall."
            }
            FetchFailure::ConnectTimeout => {
                "Connecting to the site timed out. The server is not responding."
            }
            FetchFailure::Tls => "The site's security certificate is not valid.",
            FetchFailure::Network => "Could not connect to the site.",
        }
    }

    pub fn details(self) -> &'static str {
        match self {
            FetchFailure::Dns => "DNS resolution failed",
            FetchFailure::Refused => "Connection refused",
            FetchFailure::ConnectTimeout => "Connection timeout",
            FetchFailure::Tls => "SSL certificate error",
            FetchFailure::Network => "Network error",
        }
    }
}

/// Classify a transport error by the text of its source chain.
pub fn classify_message(message: &str) -> FetchFailure {
    let lower = message.to_ascii_lowercase();
    if lower.contains("dns error")
        || lower.contains("failed to lookup")
        || lower.contains("name or service not known")
    {
        FetchFailure::Dns
    } else if lower.contains("connection refused") {
        FetchFailure::Refused
    } else if lower.contains("timed out") {
        FetchFailure::ConnectTimeout
    } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
        FetchFailure::Tls
    } else {
        FetchFailure::Network
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("URL parameter is required")]
    MissingUrl,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Invalid protocol")]
    InvalidProtocol,
    #[error("upstream timed out: {url}")]
    Timeout { url: String },
    #[error("upstream fetch failed ({failure:?}): {url}")]
    Fetch { failure: FetchFailure, url: String },
    #[error("upstream returned {status}: {url}")]
    Upstream {
        status: u16,
        reason: String,
        url: String,
    },
}

/// User-facing message for a non-success upstream status.
pub fn upstream_message(status: u16) -> String {
    match status {
        404 => "The page could not be found. The address may have changed or been removed."
            .to_string(),
        403 => "Access was denied. The site blocks external access.".to_string(),
        500 | 502 | 503 | 504 => {
            "The site's server has a temporary problem. Please try again later.".to_string()
        }
        code => format!("Could not reach the site (error code: {code})"),
    }
}

impl ProxyError {
    /// The message shown to the caller.
    pub fn message(&self) -> String {
        match self {
            ProxyError::Timeout { .. } => {
                "The site took too long to respond. It may be slow or temporarily unavailable."
                    .to_string()
            }
            ProxyError::Fetch { failure, .. } => failure.message().to_string(),
            ProxyError::Upstream { status, .. } => upstream_message(*status),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl | ProxyError::InvalidProtocol => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            ProxyError::Fetch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl | ProxyError::InvalidProtocol => {
                json!({ "error": self.to_string() })
            }
            ProxyError::Timeout { url } => json!({
                "error": self.message(),
                "details": "Request timeout",
                "originalUrl": url,
            }),
            ProxyError::Fetch { failure, url } => json!({
                "error": self.message(),
                "details": failure.details(),
                "originalUrl": url,
            }),
            ProxyError::Upstream {
                status,
                reason,
                url,
            } => json!({
                "error": self.message(),
                "details": format!("{status} {reason}").trim_end().to_string(),
                "originalUrl": url,
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Parse the `url` query value; only absolute http(s) targets are relayed.
pub fn parse_target(raw: Option<&str>) -> Result<Url, ProxyError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or(ProxyError::MissingUrl)?;
    let url = Url::parse(raw).map_err(|_| ProxyError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ProxyError::InvalidProtocol),
    }
}

/// A fetched and, for HTML and CSS, rewritten upstream response.
#[derive(Debug)]
pub struct Relayed {
    pub content_type: String,
    pub kind: ContentKind,
    pub body: Vec<u8>,
    pub passthrough: Vec<(&'static str, String)>,
}

#[derive(Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
}

impl ProxyClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9,ko;q=0.8"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    fn fetch_error(&self, err: reqwest::Error, url: &Url) -> ProxyError {
        if err.is_timeout() {
            warn!("Proxy fetch timed out: {}", url);
            return ProxyError::Timeout {
                url: url.to_string(),
            };
        }
        let chain = error_chain(&err);
        let failure = classify_message(&chain);
        warn!("Proxy fetch failed for {}: {} ({:?})", url, chain, failure);
        ProxyError::Fetch {
            failure,
            url: url.to_string(),
        }
    }

    /// Fetch `target` and rewrite it for relaying.
    pub async fn relay(&self, target: &Url) -> Result<Relayed, ProxyError> {
        debug!("Proxying {}", target);

        let response = self
            .client
            .get(target.clone())
            .send()
            .await
            .map_err(|e| self.fetch_error(e, target))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                url: target.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        let passthrough = PASSTHROUGH_HEADERS
            .iter()
            .filter_map(|name| {
                response
                    .headers()
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| (*name, v.to_string()))
            })
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.fetch_error(e, target))?;

        let kind = ContentKind::from_content_type(&content_type);
        let body = match kind {
            ContentKind::Other => bytes.to_vec(),
            _ => rewrite::rewrite_body(kind, &String::from_utf8_lossy(&bytes), target).into_bytes(),
        };

        Ok(Relayed {
            content_type,
            kind,
            body,
            passthrough,
        })
    }
}
