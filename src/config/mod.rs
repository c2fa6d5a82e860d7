//! Configuration module for noticegen
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{GenerationSettings, LlmSettings, ServerSettings, Settings};
