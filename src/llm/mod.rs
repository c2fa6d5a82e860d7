//! LLM module for noticegen
//!
//! Builds the notice prompt and runs it against a hosted Llama 2 model.

mod client;
mod params;
mod prompts;
mod replicate;

pub use client::{
    build_provider, compose_and_generate, GenerationInput, TextGenerator, REPETITION_PENALTY,
};
pub use params::{ModelPreset, SamplingParams};
pub use prompts::build_notice_prompt;
pub use replicate::ReplicateClient;
