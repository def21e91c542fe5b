//! Anthropic messages-API adapter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use ultra_core::{HealthStatus, ModelOutput, OutputStatus, ProviderHealth, ProviderKind, redact::redact_credentials};
use url::Url;

use crate::error::AttemptError;
use crate::provider::Provider;
use crate::retry::{RetryFailure, execute_with_retry};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

pub struct AnthropicAdapter {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl AnthropicAdapter {
    #[must_use]
    pub fn new(name: String, api_key: Option<SecretString>, max_retries: u32) -> Self {
        Self::with_base_url(name, api_key, max_retries, None)
    }

    /// Construct an adapter pointed at a non-default vendor base URL.
    ///
    /// `base_url` overrides the real vendor endpoint; used to point the
    /// adapter at a mock server in tests, or at a compatible self-hosted
    /// gateway in deployment.
    #[must_use]
    pub fn with_base_url(name: String, api_key: Option<SecretString>, max_retries: u32, base_url: Option<Url>) -> Self {
        Self {
            name,
            client: Client::new(),
            base_url: base_url.unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL")),
            api_key,
            max_retries,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url.as_str().trim_end_matches('/'))
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url.as_str().trim_end_matches('/'))
    }

    fn redact(&self, message: &str) -> String {
        let key = self.api_key.as_ref().map(ExposeSecret::expose_secret).unwrap_or_default();
        redact_credentials(message, &[key])
    }

    async fn attempt(&self, vendor_model_name: &str, prompt: &str) -> Result<String, AttemptError> {
        let Some(api_key) = &self.api_key else {
            return Err(AttemptError::MissingCredential(self.name.clone()));
        };

        let body = MessagesRequest {
            model: vendor_model_name,
            max_tokens: DEFAULT_MAX_TOKENS,
            messages: vec![Message { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptError::VendorStatus { status, body: self.redact(&text) });
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| AttemptError::Parse(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| AttemptError::Parse("empty content array".to_owned()))
    }
}

#[async_trait]
impl Provider for AnthropicAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, vendor_model_name: &str, prompt: &str, deadline: Instant) -> ModelOutput {
        let started = Instant::now();
        let result = execute_with_retry(self.max_retries, deadline, || self.attempt(vendor_model_name, prompt)).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(text) => ModelOutput {
                model_id: vendor_model_name.to_owned(),
                text,
                status: OutputStatus::Success,
                latency_ms,
                error_detail: None,
            },
            Err(RetryFailure::Failed(detail)) => ModelOutput {
                model_id: vendor_model_name.to_owned(),
                text: String::new(),
                status: OutputStatus::Failed,
                latency_ms,
                error_detail: Some(self.redact(&detail)),
            },
            Err(RetryFailure::TimedOut) => ModelOutput {
                model_id: vendor_model_name.to_owned(),
                text: String::new(),
                status: OutputStatus::TimedOut,
                latency_ms,
                error_detail: Some("deadline exceeded".to_owned()),
            },
        }
    }

    async fn probe(&self) -> ProviderHealth {
        let now = OffsetDateTime::now_utc();
        let Some(api_key) = &self.api_key else {
            return ProviderHealth {
                provider: ProviderKind::Anthropic,
                status: HealthStatus::Unavailable,
                last_checked_at: now,
                detail: Some("missing credential".to_owned()),
            };
        };

        let response = tokio::time::timeout(
            PROBE_TIMEOUT,
            self.client
                .get(self.models_url())
                .header("x-api-key", api_key.expose_secret())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .send(),
        )
        .await;

        match response {
            Ok(Ok(resp)) if resp.status().is_success() => ProviderHealth {
                provider: ProviderKind::Anthropic,
                status: HealthStatus::Healthy,
                last_checked_at: now,
                detail: None,
            },
            Ok(Ok(resp)) if resp.status().as_u16() == 429 => ProviderHealth {
                provider: ProviderKind::Anthropic,
                status: HealthStatus::Degraded,
                last_checked_at: now,
                detail: Some("rate limited".to_owned()),
            },
            Ok(Ok(resp)) => ProviderHealth {
                provider: ProviderKind::Anthropic,
                status: HealthStatus::Unavailable,
                last_checked_at: now,
                detail: Some(format!("status {}", resp.status())),
            },
            Ok(Err(e)) => ProviderHealth {
                provider: ProviderKind::Anthropic,
                status: HealthStatus::Unavailable,
                last_checked_at: now,
                detail: Some(self.redact(&e.to_string())),
            },
            Err(_elapsed) => ProviderHealth {
                provider: ProviderKind::Anthropic,
                status: HealthStatus::Unavailable,
                last_checked_at: now,
                detail: Some("probe timed out".to_owned()),
            },
        }
    }
}
