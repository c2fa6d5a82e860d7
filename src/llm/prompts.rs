use crate::notice::MeetingRequest;

/// Build a deterministic prompt asking for an agenda and a letter body.
///
/// Field values are embedded verbatim.
pub fn build_notice_prompt(request: &MeetingRequest) -> String {
    format!(
        "Generate a formal agenda and letter body for a notice of meeting with the following details:\n\
- Purpose: {purpose}\n\
- Invitees: {invitees}\n\
- Calling Office: {office}\n\
- Date: {date}\n\
\n\
The response should include:\n\
1. A list of 3-5 specific agenda items related to the purpose.\n\
2. A formal letter body inviting the attendees, explaining the purpose, and encouraging participation.\n\
\n\
Format the response as follows:\n\
AGENDA:\n\
1. [Agenda item 1]\n\
2. [Agenda item 2]\n\
3. [Agenda item 3]\n\
...\n\
\n\
LETTER BODY:\n\
[Full letter body here]",
        purpose = request.purpose,
        invitees = request.invitees,
        office = request.calling_office,
        date = request.date_label(),
    )
}
