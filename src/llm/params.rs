//! Model presets and sampling parameters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MIN_PROBABILITY: f32 = 0.01;
const MAX_PROBABILITY: f32 = 1.0;
const MIN_MAX_LENGTH: u32 = 32;
const MAX_MAX_LENGTH: u32 = 128;
const MAX_LENGTH_STEP: u32 = 8;

/// Hosted Llama 2 chat models selectable from the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelPreset {
    #[default]
    #[serde(rename = "Llama2-7B")]
    Llama2_7B,
    #[serde(rename = "Llama2-13B")]
    Llama2_13B,
}

impl ModelPreset {
    pub const ALL: [ModelPreset; 2] = [ModelPreset::Llama2_7B, ModelPreset::Llama2_13B];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Llama2_7B => "Llama2-7B",
            Self::Llama2_13B => "Llama2-13B",
        }
    }

    /// Full `owner/name:version` identifier on Replicate.
    pub fn model_id(&self) -> &'static str {
        match self {
            Self::Llama2_7B => "a16z-infra/llama7b-v2-chat:4f0a4744c7295c024a1de15e1a63c880d3da035fa1f49bfd344fe076074c8eea",
            Self::Llama2_13B => "a16z-infra/llama13b-v2-chat:df7690f1994d94e96ad9d568eac121aecf50684a0b0963b25a41cc40061269e5",
        }
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llama2-7b" | "7b" => Ok(Self::Llama2_7B),
            "llama2-13b" | "13b" => Ok(Self::Llama2_13B),
            other => Err(format!(
                "Unknown model '{}'. Supported models: Llama2-7B, Llama2-13B",
                other
            )),
        }
    }
}

/// Tunable sampling parameters sent with every generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_length: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_length: 120,
        }
    }
}

impl SamplingParams {
    /// Snap every parameter onto the slider grid the model accepts.
    ///
    /// temperature and top_p land in [0.01, 1.0] at 0.01 steps; max_length
    /// lands in [32, 128] at steps of 8. Non-finite values fall back to the
    /// defaults.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        Self {
            temperature: clamp_probability(self.temperature, defaults.temperature),
            top_p: clamp_probability(self.top_p, defaults.top_p),
            max_length: clamp_max_length(self.max_length),
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        (MIN_PROBABILITY..=MAX_PROBABILITY).contains(&self.temperature)
            && (MIN_PROBABILITY..=MAX_PROBABILITY).contains(&self.top_p)
            && (MIN_MAX_LENGTH..=MAX_MAX_LENGTH).contains(&self.max_length)
            && (self.max_length - MIN_MAX_LENGTH) % MAX_LENGTH_STEP == 0
    }
}

fn clamp_probability(value: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    let stepped = (value.clamp(MIN_PROBABILITY, MAX_PROBABILITY) * 100.0).round() / 100.0;
    stepped.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

fn clamp_max_length(value: u32) -> u32 {
    let value = value.clamp(MIN_MAX_LENGTH, MAX_MAX_LENGTH);
    let steps = (value - MIN_MAX_LENGTH + MAX_LENGTH_STEP / 2) / MAX_LENGTH_STEP;
    (MIN_MAX_LENGTH + steps * MAX_LENGTH_STEP).min(MAX_MAX_LENGTH)
}
