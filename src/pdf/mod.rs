//! PDF rendering for notices
//!
//! Lays notice text out as a centered title followed by body paragraphs and
//! writes it with the standard Helvetica fonts. No timestamps or random
//! identifiers are embedded, so rendering is reproducible.

mod layout;
mod metrics;
mod writer;

use base64::Engine;
use std::io::Cursor;
use thiserror::Error;

pub use layout::{
    build_story, escape_markup, paginate, Flowable, Page, Paragraph, PlacedText, Run,
};
pub use metrics::Font;

/// Filename offered for download.
pub const FILE_NAME: &str = "notice_of_meeting.pdf";

/// MIME type of rendered artifacts.
pub const MIME_TYPE: &str = "application/pdf";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("the notice has no text to render")]
    EmptyDocument,
}

/// A fully buffered PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    bytes: Vec<u8>,
}

impl RenderedArtifact {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Seekable reader positioned at the start of the document.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.bytes)
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:` URI for embedding the PDF inline.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", MIME_TYPE, self.to_base64())
    }
}

/// Render notice text into a PDF.
pub fn render_document(text: &str) -> Result<RenderedArtifact, RenderError> {
    let story = build_story(text)?;
    let pages = paginate(story);
    tracing::debug!(pages = pages.len(), "Laid out notice");

    Ok(RenderedArtifact {
        bytes: writer::write_pdf(&pages),
    })
}
