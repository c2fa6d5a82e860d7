//! Request handlers for the notice form.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::session::{session_cookie, session_id, SessionDocument};
use super::templates::{form_page, Flash, FormValues, PageView};
use super::AppState;
use crate::credentials::{check_token, TokenStatus};
use crate::llm::{build_provider, compose_and_generate, ModelPreset, SamplingParams, TextGenerator};
use crate::notice::{format_notice, MeetingRequest};
use crate::pdf::{RenderedArtifact, FILE_NAME, MIME_TYPE};
use crate::NoticeError;

/// Fields posted by the form. Numbers arrive as text and are parsed leniently.
#[derive(Debug, Deserialize)]
pub struct NoticeForm {
    #[serde(default)]
    pub invitees: String,
    #[serde(default)]
    pub office: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub purpose: String,
    pub model: Option<String>,
    pub temperature: Option<String>,
    pub top_p: Option<String>,
    pub max_length: Option<String>,
    pub api_token: Option<String>,
}

impl NoticeForm {
    fn meeting_request(&self) -> Option<MeetingRequest> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()?;
        Some(MeetingRequest::new(
            self.purpose.as_str(),
            self.invitees.as_str(),
            self.office.as_str(),
            date,
        ))
    }

    /// Slider values, falling back to `defaults` and clamped to model bounds.
    fn sampling(&self, defaults: SamplingParams) -> SamplingParams {
        let number = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        SamplingParams {
            temperature: number(&self.temperature)
                .map(|v| v as f32)
                .unwrap_or(defaults.temperature),
            top_p: number(&self.top_p)
                .map(|v| v as f32)
                .unwrap_or(defaults.top_p),
            max_length: number(&self.max_length)
                .map(|v| v.round().clamp(0.0, f64::from(u32::MAX)) as u32)
                .unwrap_or(defaults.max_length),
        }
        .clamped()
    }

    fn values(&self) -> FormValues {
        FormValues {
            invitees: self.invitees.clone(),
            office: self.office.clone(),
            date: self.date.clone(),
            purpose: self.purpose.clone(),
            api_token: self.api_token.clone().unwrap_or_default(),
        }
    }

    fn model(&self, default: ModelPreset) -> ModelPreset {
        self.model
            .as_deref()
            .and_then(|m| m.parse().ok())
            .unwrap_or(default)
    }
}

/// Why a submission produced no notice.
#[derive(Error, Debug)]
enum SubmissionError {
    #[error("{0}")]
    Credentials(anyhow::Error),

    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),

    #[error(transparent)]
    Notice(#[from] NoticeError),
}

impl SubmissionError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Credentials(_) => StatusCode::BAD_REQUEST,
            Self::Inference(_) => StatusCode::BAD_GATEWAY,
            Self::Notice(NoticeError::Parse(_)) => StatusCode::BAD_GATEWAY,
            Self::Notice(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Credentials(e) => e.to_string(),
            Self::Inference(_) => {
                "Failed to generate the meeting notice. Please try again.".to_string()
            }
            Self::Notice(NoticeError::Parse(_)) => {
                "Malformed AI response (no \"LETTER BODY:\" section), please retry.".to_string()
            }
            Self::Notice(_) => "The meeting notice could not be rendered.".to_string(),
        }
    }
}

struct PageContext {
    values: FormValues,
    token_status: Option<TokenStatus>,
    model: ModelPreset,
    defaults: SamplingParams,
}

fn page_response(
    state: &AppState,
    session: Uuid,
    status: StatusCode,
    context: PageContext,
    flash: Option<Flash>,
    document: &SessionDocument,
) -> Response {
    let view = PageView {
        values: context.values,
        defaults: context.defaults,
        model: context.model,
        token_status: context.token_status.filter(|_| state.generator.is_none()),
        flash,
        document: document.artifact(),
    };

    (
        status,
        [(header::SET_COOKIE, session_cookie(session))],
        Html(form_page(&view)),
    )
        .into_response()
}

fn default_context(state: &AppState) -> PageContext {
    PageContext {
        values: FormValues::default(),
        token_status: Some(check_token(state.settings.api_token())),
        model: state.settings.llm.model,
        defaults: state.settings.generation.sampling(),
    }
}

/// Render the form, with the session's notice if one exists.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = session_id(&headers);
    let document = state.sessions.document(session);
    page_response(
        &state,
        session,
        StatusCode::OK,
        default_context(&state),
        None,
        &document,
    )
}

/// Generate a notice from the submitted form.
pub async fn generate_notice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<NoticeForm>,
) -> Response {
    let session = session_id(&headers);

    let submitted_token = form.api_token.as_deref().filter(|t| !t.trim().is_empty());
    let context = PageContext {
        values: form.values(),
        token_status: Some(check_token(submitted_token.or(state.settings.api_token()))),
        model: form.model(state.settings.llm.model),
        defaults: form.sampling(state.settings.generation.sampling()),
    };

    let Some(request) = form.meeting_request() else {
        let document = state.sessions.document(session);
        return page_response(
            &state,
            session,
            StatusCode::BAD_REQUEST,
            context,
            Some(Flash::Error(
                "Please provide the meeting date as YYYY-MM-DD.".to_string(),
            )),
            &document,
        );
    };

    if state.generator.is_none() && !context.token_status.is_some_and(|s| s.is_valid()) {
        tracing::warn!("Replicate API token is missing or malformed");
    }

    let Some(in_flight) = state.sessions.begin(session) else {
        let document = state.sessions.document(session);
        return page_response(
            &state,
            session,
            StatusCode::CONFLICT,
            context,
            Some(Flash::Error(
                "A notice is already being generated for this session.".to_string(),
            )),
            &document,
        );
    };

    let outcome = run_submission(
        &state,
        &request,
        context.defaults,
        context.model,
        submitted_token,
    )
    .await;

    in_flight.finish(outcome.as_ref().ok().cloned());
    let document = state.sessions.document(session);

    match outcome {
        Ok(artifact) => {
            tracing::info!(session = %session, bytes = artifact.len(), "Notice generated");
            page_response(
                &state,
                session,
                StatusCode::OK,
                context,
                Some(Flash::Success(
                    "Notice of Meeting generated successfully!".to_string(),
                )),
                &document,
            )
        }
        Err(err) => {
            tracing::error!(session = %session, "Notice generation failed: {}", err);
            page_response(
                &state,
                session,
                err.status(),
                context,
                Some(Flash::Error(err.user_message())),
                &document,
            )
        }
    }
}

async fn run_submission(
    state: &AppState,
    request: &MeetingRequest,
    params: SamplingParams,
    model: ModelPreset,
    submitted_token: Option<&str>,
) -> Result<RenderedArtifact, SubmissionError> {
    let generator: Arc<dyn TextGenerator> = match &state.generator {
        Some(generator) => Arc::clone(generator),
        None => Arc::from(
            build_provider(&state.settings, submitted_token)
                .map_err(SubmissionError::Credentials)?,
        ),
    };

    let reply = compose_and_generate(generator.as_ref(), request, params, model)
        .await
        .map_err(SubmissionError::Inference)?;

    Ok(format_notice(&reply, request)?)
}

/// Download the session's notice.
pub async fn download_notice(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = session_id(&headers);
    match state.sessions.document(session) {
        SessionDocument::Ready(artifact) => (
            [
                (header::CONTENT_TYPE, MIME_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", FILE_NAME),
                ),
            ],
            artifact.into_bytes(),
        )
            .into_response(),
        SessionDocument::Empty => {
            (StatusCode::NOT_FOUND, "No notice has been generated yet").into_response()
        }
    }
}
