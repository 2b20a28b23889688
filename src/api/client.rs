use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use yansi::Paint;

use crate::config::sanitize_base_url;
use crate::error::ExportError;
use crate::utils::build_query_string;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

static SILENT: AtomicBool = AtomicBool::new(false);

pub fn set_silent(silent: bool) {
    SILENT.store(silent, Ordering::Relaxed);
}

pub fn is_silent() -> bool {
    SILENT.load(Ordering::Relaxed)
}

fn log_output(msg: String) {
    if !is_silent() {
        println!("{}", msg);
    }
}

/// Authenticated HTTP client for the Rackbeat API.
pub struct RackbeatClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl RackbeatClient {
    /// Create a client that sends `token` as a bearer credential.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, ExportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("rackbeat-units/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ExportError::Client(e.to_string()))?;

        Ok(Self {
            base_url: sanitize_base_url(base_url),
            token: token.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint` and decode the body as JSON.
    ///
    /// # Errors
    ///
    /// `ExportError::Network` when no response arrives, `ExportError::Fetch`
    /// for any status other than 200 and `ExportError::Parse` for a body that is
    /// not JSON. All of them carry `product`.
    pub async fn get_json(
        &self,
        product: &str,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ExportError> {
        let url = format!("{}{}", self.base_url, endpoint);
        log_request("GET", &url, params);

        let network_error = |e: reqwest::Error| ExportError::Network {
            product: product.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let text = response.text().await.map_err(network_error)?;
        tracing::debug!(%status, product, "Received response");

        if status != StatusCode::OK {
            log_output(format!(
                "Response:\n{}",
                Paint::new(format!("HTTP {}: {}", status, text)).fg(yansi::Color::Red)
            ));
            return Err(ExportError::Fetch {
                product: product.to_string(),
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        // Grayed out so the request line stands out
        log_output(format!("Response:\n{}", Paint::new(&text).rgb(100, 100, 100)));

        serde_json::from_str(&text).map_err(|e| ExportError::Parse {
            product: product.to_string(),
            reason: e.to_string(),
        })
    }
}

fn log_request(method: &str, url: &str, params: &[(&str, &str)]) {
    if is_silent() {
        return;
    }
    let url_for_log = if params.is_empty() {
        url.to_string()
    } else {
        format!("{}?{}", url, build_query_string(params))
    };

    let parts = [
        Paint::new("curl").fg(yansi::Color::Green).bold().to_string(),
        format!("-X {}", Paint::new(method).fg(yansi::Color::Yellow).bold()),
        format!("'{}'", Paint::new(&url_for_log).fg(yansi::Color::Cyan)),
        format!(
            "{} {}",
            Paint::new("-H").fg(yansi::Color::Magenta),
            Paint::new("'Authorization: Bearer ***'").fg(yansi::Color::Magenta)
        ),
    ];
    log_output(format!("Request:\n{}", parts.join(" ")));
}

fn truncate_body(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{}...", cut)
}
