use std::time::Duration;

use crate::catalog::{Book, Niche};
use crate::generate::{self, BookGenerator, GenerateError};
use crate::http::{self, FetchError};

pub fn chat_completions_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/chat/completions")
}

/// Sends a single user message constrained to a JSON object reply and
/// returns the raw message content.
pub fn chat_json_object(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, FetchError> {
    let body = serde_json::json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "response_format": { "type": "json_object" },
    });

    let request = client.post(endpoint).bearer_auth(api_key).json(&body);
    let value = http::send_json(request, endpoint)?;
    extract_message_content(&value).map_err(|message| FetchError::body(endpoint, message))
}

fn extract_message_content(value: &serde_json::Value) -> Result<String, String> {
    let content = value
        .pointer("/choices/0/message/content")
        .ok_or_else(|| "missing `choices[0].message.content` in response".to_owned())?
        .as_str()
        .ok_or_else(|| "message content is not a string".to_owned())?;

    if content.trim().is_empty() {
        return Err("message content is empty".to_owned());
    }
    Ok(content.to_owned())
}

pub struct OpenAiGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    affiliate_tag: String,
}

impl OpenAiGenerator {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: &str,
        affiliate_tag: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::build_client(timeout)?,
            endpoint: chat_completions_endpoint(base_url),
            api_key,
            model: model.to_owned(),
            affiliate_tag: affiliate_tag.to_owned(),
        })
    }

    /// `None` when `OPENAI_API_KEY` is unset or blank.
    pub fn from_env(
        base_url: &str,
        model: &str,
        affiliate_tag: &str,
        timeout: Duration,
    ) -> anyhow::Result<Option<Self>> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => return Ok(None),
        };
        Self::new(api_key, base_url, model, affiliate_tag, timeout).map(Some)
    }
}

impl BookGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(&self, niche: &Niche) -> Result<Vec<Book>, GenerateError> {
        tracing::info!(model = %self.model, niche = %niche.slug, "requesting recommendations");
        let prompt = generate::build_prompt(niche, &self.affiliate_tag);
        let content = chat_json_object(
            &self.client,
            &self.endpoint,
            &self.api_key,
            &self.model,
            &prompt,
        )?;
        tracing::debug!(response = %content, "openai response");
        generate::parse_books(&content)
    }
}
