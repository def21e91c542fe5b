//! Google Generative Language (Gemini) adapter.

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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

pub struct GoogleAdapter {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl GoogleAdapter {
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

    fn generate_url(&self, vendor_model_name: &str, api_key: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{vendor_model_name}:generateContent?key={api_key}")
    }

    fn models_url(&self, api_key: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models?key={api_key}")
    }

    fn redact(&self, message: &str) -> String {
        let key = self.api_key.as_ref().map(ExposeSecret::expose_secret).unwrap_or_default();
        redact_credentials(message, &[key])
    }

    async fn attempt(&self, vendor_model_name: &str, prompt: &str) -> Result<String, AttemptError> {
        let Some(api_key) = &self.api_key else {
            return Err(AttemptError::MissingCredential(self.name.clone()));
        };

        let body = GenerateContentRequest { contents: vec![Content { parts: vec![Part { text: prompt }] }] };

        let response = self
            .client
            .post(self.generate_url(vendor_model_name, api_key.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(AttemptError::VendorStatus { status, body: self.redact(&text) });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| AttemptError::Parse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| AttemptError::Parse("empty candidates array".to_owned()))
    }
}

#[async_trait]
impl Provider for GoogleAdapter {
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
                provider: ProviderKind::Google,
                status: HealthStatus::Unavailable,
                last_checked_at: now,
                detail: Some("missing credential".to_owned()),
            };
        };

        let response =
            tokio::time::timeout(PROBE_TIMEOUT, self.client.get(self.models_url(api_key.expose_secret())).send())
                .await;

        match response {
            Ok(Ok(resp)) if resp.status().is_success() => ProviderHealth {
                provider: ProviderKind::Google,
                status: HealthStatus::Healthy,
                last_checked_at: now,
                detail: None,
            },
            Ok(Ok(resp)) if resp.status().as_u16() == 429 => ProviderHealth {
                provider: ProviderKind::Google,
                status: HealthStatus::Degraded,
                last_checked_at: now,
                detail: Some("rate limited".to_owned()),
            },
            Ok(Ok(resp)) => ProviderHealth {
                provider: ProviderKind::Google,
                status: HealthStatus::Unavailable,
                last_checked_at: now,
                detail: Some(format!("status {}", resp.status())),
            },
            Ok(Err(e)) => ProviderHealth {
                provider: ProviderKind::Google,
                status: HealthStatus::Unavailable,
                last_checked_at: now,
                detail: Some(self.redact(&e.to_string())),
            },
            Err(_elapsed) => ProviderHealth {
                provider: ProviderKind::Google,
                status: HealthStatus::Unavailable,
                last_checked_at: now,
                detail: Some("probe timed out".to_owned()),
            },
        }
    }
}
