use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Settings;
use crate::llm::client::{GenerationInput, TextGenerator};
use crate::llm::params::ModelPreset;

const DEFAULT_REPLICATE_ENDPOINT: &str = "https://api.replicate.com/v1";

pub struct ReplicateClient {
    http: Client,
    api_token: String,
    endpoint: String,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn from_settings(settings: &Settings, token_override: Option<&str>) -> Result<Self> {
        let api_token = token_override
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| settings.api_token())
            .map(str::to_string)
            .context(
                "Replicate API token is missing. Set llm.api_token in config or REPLICATE_API_TOKEN.",
            )?;

        let endpoint = if settings.llm.endpoint.trim().is_empty() {
            DEFAULT_REPLICATE_ENDPOINT.to_string()
        } else {
            settings
                .llm
                .endpoint
                .trim()
                .trim_end_matches('/')
                .to_string()
        };

        Ok(Self {
            http: Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .context("Failed to build Replicate HTTP client")?,
            api_token,
            endpoint,
            poll_interval: Duration::from_millis(settings.llm.poll_interval_ms),
        })
    }

    fn predictions_url(&self) -> String {
        format!("{}/predictions", self.endpoint)
    }

    fn prediction_url(&self, prediction: &Prediction) -> String {
        prediction
            .urls
            .as_ref()
            .and_then(|urls| urls.get.clone())
            .unwrap_or_else(|| format!("{}/predictions/{}", self.endpoint, prediction.id))
    }

    async fn fetch(&self, url: &str) -> Result<Prediction> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("Replicate status request failed")?
            .error_for_status()
            .context("Replicate returned an error status")?;

        response
            .json()
            .await
            .context("Failed to parse Replicate prediction")
    }
}

/// Version hash from an `owner/name:version` identifier.
fn version_of(model_id: &str) -> &str {
    model_id
        .split_once(':')
        .map(|(_, version)| version)
        .unwrap_or(model_id)
}

#[async_trait]
impl TextGenerator for ReplicateClient {
    async fn generate(&self, model: ModelPreset, input: &GenerationInput) -> Result<Vec<String>> {
        let body = CreatePredictionRequest {
            version: version_of(model.model_id()),
            input,
        };

        let response = self
            .http
            .post(self.predictions_url())
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .context("Replicate request failed")?;

        let response = response
            .error_for_status()
            .context("Replicate returned an error status")?;

        let mut prediction: Prediction = response
            .json()
            .await
            .context("Failed to parse Replicate prediction")?;

        while prediction.status.is_pending() {
            tracing::debug!(id = %prediction.id, status = ?prediction.status, "Prediction pending");
            tokio::time::sleep(self.poll_interval).await;
            let url = self.prediction_url(&prediction);
            prediction = self.fetch(&url).await?;
        }

        match prediction.status {
            PredictionStatus::Succeeded => prediction.into_fragments(),
            status => anyhow::bail!(
                "Replicate prediction {} ended with status {:?}: {}",
                prediction.id,
                status,
                prediction
                    .error
                    .as_ref()
                    .map(describe_error)
                    .unwrap_or_else(|| "no error message".to_string())
            ),
        }
    }
}

fn describe_error(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct CreatePredictionRequest<'a> {
    version: &'a str,
    input: &'a GenerationInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    fn is_pending(&self) -> bool {
        matches!(self, Self::Starting | Self::Processing)
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: serde_json::Value,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

impl Prediction {
    fn into_fragments(self) -> Result<Vec<String>> {
        match self.output {
            serde_json::Value::Null => Ok(Vec::new()),
            serde_json::Value::String(text) => Ok(vec![text]),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(text) => Ok(text),
                    other => anyhow::bail!("Unexpected output fragment from Replicate: {}", other),
                })
                .collect(),
            other => anyhow::bail!("Unexpected output from Replicate: {}", other),
        }
    }
}
