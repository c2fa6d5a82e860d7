//! Meeting request captured from the form

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The four fields a notice is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRequest {
    /// What the meeting is for
    pub purpose: String,

    /// Who is invited
    pub invitees: String,

    /// Office calling the meeting
    pub calling_office: String,

    /// Date of the meeting
    pub date: NaiveDate,
}

impl MeetingRequest {
    pub fn new(
        purpose: impl Into<String>,
        invitees: impl Into<String>,
        calling_office: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            purpose: purpose.into(),
            invitees: invitees.into(),
            calling_office: calling_office.into(),
            date,
        }
    }

    /// Date as it appears in prompts and notices (YYYY-MM-DD).
    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
