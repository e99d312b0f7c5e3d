// src/core/dispatch.rs

//! The transport capability boundary and its default HTTP implementation.

use crate::config::{HttpConfig, SecurityConfig};
use crate::core::errors::BatchError;
use crate::core::model::{Request, Response};
use async_trait::async_trait;
use reqwest::Method;
use reqwest::redirect::Policy;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;
use wildmatch::WildMatch;

/// Sends one fully-resolved request and returns its response.
///
/// Any transport-level failure is fatal to the batch that issued the
/// request. Timeouts and cancellation are the dispatcher's concern; the
/// engine only awaits.
#[async_trait]
pub trait RequestDispatcher: Send + Sync {
    async fn dispatch(&self, request: &Request) -> Result<Response, BatchError>;
}

/// The default dispatcher, backed by a pre-built `reqwest` client.
pub struct HttpDispatcher {
    client: reqwest::Client,
    allowed_domains: Vec<String>,
}

impl HttpDispatcher {
    pub fn new(http: &HttpConfig, security: &SecurityConfig) -> Result<Self, BatchError> {
        let redirect = if http.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(http.max_redirects)
        };
        let client = reqwest::Client::builder()
            .timeout(http.request_timeout)
            .connect_timeout(http.connect_timeout)
            .user_agent(http.user_agent.clone())
            .redirect(redirect)
            .build()?;
        Ok(Self {
            client,
            allowed_domains: security.allowed_domains.clone(),
        })
    }

    /// Rejects non-HTTP URLs and, when an allowlist is configured, domains
    /// outside it.
    fn validate_url(&self, url_str: &str) -> Result<(), BatchError> {
        let url = Url::parse(url_str)
            .map_err(|_| BatchError::InvalidRequest(format!("Invalid URL format: {url_str}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(BatchError::InvalidRequest(format!(
                "Unsupported URL scheme \"{}\"",
                url.scheme()
            )));
        }

        let domain = url
            .host_str()
            .ok_or_else(|| BatchError::InvalidRequest("URL must have a valid domain".to_string()))?;

        if !self.allowed_domains.is_empty() {
            let allowed = self
                .allowed_domains
                .iter()
                .any(|pattern| WildMatch::new(pattern).matches(domain));
            if !allowed {
                return Err(BatchError::InvalidRequest(format!(
                    "URL domain \"{domain}\" is not in the list of allowed domains"
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl RequestDispatcher for HttpDispatcher {
    async fn dispatch(&self, request: &Request) -> Result<Response, BatchError> {
        self.validate_url(&request.url)?;

        let method = Method::from_bytes(request.http_method.as_bytes()).map_err(|_| {
            BatchError::InvalidRequest(format!("Invalid HTTP method: {}", request.http_method))
        })?;

        let mut builder = self.client.request(method, &request.url);
        if let Some(Value::Object(headers)) = &request.headers {
            for (name, value) in headers {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                builder = builder.header(name.as_str(), text);
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let res = builder.send().await?;
        let status = res.status().as_u16();

        let mut headers = Map::new();
        for (name, value) in res.headers() {
            let text = String::from_utf8_lossy(value.as_bytes()).to_string();
            match headers.get_mut(name.as_str()) {
                // Repeated headers are joined the way proxies render them.
                Some(Value::String(existing)) => {
                    existing.push_str(", ");
                    existing.push_str(&text);
                }
                _ => {
                    headers.insert(name.as_str().to_string(), Value::String(text));
                }
            }
        }

        let text = res.text().await?;
        debug!(status, bytes = text.len(), "received response");

        // Bodies that are not valid JSON are carried as plain strings.
        let body = if text.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };

        Ok(Response {
            status: Some(status),
            headers: Some(Value::Object(headers)),
            body,
        })
    }
}
