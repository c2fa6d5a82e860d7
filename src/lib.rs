//! noticegen - Generate formal notice-of-meeting PDFs with a hosted Llama 2 model
//!
//! A short form (purpose, invitees, calling office, date) is turned into a
//! prompt, the model drafts an agenda and a letter body, and the result is
//! laid out as a paginated PDF.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod llm;
pub mod notice;
pub mod pdf;
pub mod server;

use thiserror::Error;

pub use notice::{format_notice, MeetingRequest, ParseError};
pub use pdf::{RenderError, RenderedArtifact};

/// Main error type for noticegen
#[derive(Error, Debug)]
pub enum NoticeError {
    #[error("Malformed AI response: {0}")]
    Parse(#[from] ParseError),

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, NoticeError>;

/// Application name
pub const APP_NAME: &str = "noticegen";
