//! Notice formatting
//!
//! Turns a raw model reply plus the meeting request into a rendered PDF.

mod parser;
mod request;
mod template;

pub use parser::{parse_reply, ParseError, ParsedReply, AGENDA_LABEL, LETTER_BODY_MARKER};
pub use request::MeetingRequest;
pub use template::{assemble_notice, NoticeDocument, NOTICE_TITLE, SALUTATION};

use crate::pdf::{render_document, RenderedArtifact};

/// Parse `reply`, fill the notice template, and render it to PDF.
///
/// Identical inputs produce byte-identical artifacts.
pub fn format_notice(reply: &str, request: &MeetingRequest) -> crate::Result<RenderedArtifact> {
    let parsed = parse_reply(reply)?;
    let notice = assemble_notice(request, &parsed);
    tracing::debug!(
        agenda_lines = parsed.agenda.lines().count(),
        body_chars = parsed.letter_body.len(),
        "Assembled notice"
    );
    Ok(render_document(notice.text())?)
}
