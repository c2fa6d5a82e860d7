use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::config::Settings;
use crate::llm::params::{ModelPreset, SamplingParams};
use crate::llm::prompts::build_notice_prompt;
use crate::llm::replicate::ReplicateClient;
use crate::notice::MeetingRequest;

/// Repetition penalty sent with every request.
pub const REPETITION_PENALTY: f32 = 1.0;

/// Input payload for a single text generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationInput {
    pub prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_length: u32,
    pub repetition_penalty: f32,
}

impl GenerationInput {
    pub fn new(prompt: String, params: SamplingParams) -> Self {
        Self {
            prompt,
            temperature: params.temperature,
            top_p: params.top_p,
            max_length: params.max_length,
            repetition_penalty: REPETITION_PENALTY,
        }
    }
}

/// A hosted text-generation capability.
///
/// Output may arrive as several fragments; callers join them in order.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: ModelPreset, input: &GenerationInput) -> Result<Vec<String>>;
}

/// Build the prompt for `request`, run it, and join the fragments.
///
/// Failures from the generator are returned as-is; there is no retry.
pub async fn compose_and_generate(
    generator: &dyn TextGenerator,
    request: &MeetingRequest,
    params: SamplingParams,
    model: ModelPreset,
) -> Result<String> {
    let input = GenerationInput::new(build_notice_prompt(request), params);

    tracing::info!(
        model = %model,
        temperature = input.temperature,
        top_p = input.top_p,
        max_length = input.max_length,
        "Requesting notice draft"
    );

    let fragments = generator.generate(model, &input).await?;
    tracing::debug!(fragments = fragments.len(), "Received model output");

    Ok(fragments.concat())
}

/// Build a text generator from runtime settings.
///
/// `token_override` takes precedence over the configured token.
pub fn build_provider(
    settings: &Settings,
    token_override: Option<&str>,
) -> Result<Box<dyn TextGenerator>> {
    match settings.llm.provider.to_lowercase().as_str() {
        "replicate" => Ok(Box::new(ReplicateClient::from_settings(
            settings,
            token_override,
        )?)),
        other => anyhow::bail!(
            "Unsupported llm.provider '{}'. Supported providers: replicate",
            other
        ),
    }
}
