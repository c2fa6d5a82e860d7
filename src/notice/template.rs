//! Notice text assembly

use std::fmt;

use crate::notice::parser::ParsedReply;
use crate::notice::request::MeetingRequest;
use crate::pdf::escape_markup;

pub const NOTICE_TITLE: &str = "Notice of Meeting";
pub const SALUTATION: &str = "Dear Sir/Madam,";

/// Full notice text, one paragraph per non-blank line.
///
/// The first line is the title; `**...**` marks bold runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeDocument {
    text: String,
}

impl NoticeDocument {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for NoticeDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Fill the notice template with the request fields and parsed reply.
///
/// Only the template's own labels are bold; markup characters in the
/// fields and the reply are escaped.
pub fn assemble_notice(request: &MeetingRequest, parsed: &ParsedReply) -> NoticeDocument {
    let text = format!(
        "**{title}**\n\
\n\
**To:** {invitees}\n\
\n\
**From:** {office}\n\
\n\
**Date:** {date}\n\
\n\
{salutation}\n\
\n\
{body}\n\
\n\
**Agenda:**\n\
{agenda}\n\
\n\
We look forward to your participation.\n\
\n\
Best regards,\n\
\n\
[Your Name]\n\
[Your Position]\n\
[Your Contact Information]\n",
        title = NOTICE_TITLE,
        invitees = escape_markup(&request.invitees),
        office = escape_markup(&request.calling_office),
        date = request.date_label(),
        salutation = SALUTATION,
        body = escape_markup(&parsed.letter_body),
        agenda = escape_markup(&parsed.agenda),
    );

    NoticeDocument { text }
}
