//! Splitting the model reply into agenda and letter body

use thiserror::Error;

/// Marker separating the agenda from the letter body.
pub const LETTER_BODY_MARKER: &str = "LETTER BODY:";

/// Label the model puts in front of the agenda.
pub const AGENDA_LABEL: &str = "AGENDA:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("the response has no \"LETTER BODY:\" section")]
    MissingDelimiter,
}

/// Agenda and letter body extracted from a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub agenda: String,
    pub letter_body: String,
}

/// Split `reply` on the first `LETTER BODY:` marker.
///
/// Any later marker stays in the letter body text.
pub fn parse_reply(reply: &str) -> Result<ParsedReply, ParseError> {
    let (agenda, letter_body) = reply
        .split_once(LETTER_BODY_MARKER)
        .ok_or(ParseError::MissingDelimiter)?;

    let agenda = agenda.trim();
    let agenda = agenda.strip_prefix(AGENDA_LABEL).unwrap_or(agenda).trim();

    Ok(ParsedReply {
        agenda: agenda.to_string(),
        letter_body: letter_body.trim().to_string(),
    })
}
