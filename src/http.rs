use std::time::Duration;

use anyhow::Context as _;
use reqwest::StatusCode;

/// A failed exchange with an external API. Callers treat it as a per-item
/// failure and keep going.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {message}")]
    Status {
        url: String,
        status: StatusCode,
        message: String,
    },

    #[error("malformed response from {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    pub fn body(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Body {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")
}

/// Sends `request` and decodes a successful JSON body.
pub fn send_json(
    request: reqwest::blocking::RequestBuilder,
    url: &str,
) -> Result<serde_json::Value, FetchError> {
    let response = request.send().map_err(|source| FetchError::Transport {
        url: url.to_owned(),
        source,
    })?;

    let status = response.status();
    let raw = response.text().map_err(|source| FetchError::Transport {
        url: url.to_owned(),
        source,
    })?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or(raw);
        return Err(FetchError::Status {
            url: url.to_owned(),
            status,
            message,
        });
    }

    serde_json::from_str(&raw).map_err(|err| FetchError::body(url, err))
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let error = value.get("error")?;
    let message = error
        .get("message")
        .and_then(|v| v.as_str())
        .or_else(|| error.as_str())?;
    Some(message.to_owned())
}
