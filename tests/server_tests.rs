use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use noticegen::config::Settings;
use noticegen::llm::{GenerationInput, ModelPreset, TextGenerator};
use noticegen::server::{create_router, AppState, SESSION_COOKIE};

const EXAMPLE_REPLY: &str =
    "AGENDA:\n1. Review budget\n2. Approve funds\nLETTER BODY:\nWe invite you to attend.";

/// Replays scripted replies in order and records every call.
#[derive(Default)]
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<(ModelPreset, GenerationInput)>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(ModelPreset, GenerationInput)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, model: ModelPreset, input: &GenerationInput) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push((model, input.clone()));
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => {
                // Split into fragments the way a streamed response arrives.
                let mid = reply.len() / 2;
                let split = (mid..reply.len())
                    .find(|i| reply.is_char_boundary(*i))
                    .unwrap_or(reply.len());
                Ok(vec![reply[..split].to_string(), reply[split..].to_string()])
            }
            Some(Err(message)) => anyhow::bail!(message),
            None => anyhow::bail!("no scripted reply left"),
        }
    }
}

/// Never answers its first call; later calls reply normally.
#[derive(Default)]
struct StallsOnce {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for StallsOnce {
    async fn generate(&self, _model: ModelPreset, _input: &GenerationInput) -> Result<Vec<String>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(vec![EXAMPLE_REPLY.to_string()])
    }
}

fn app(generator: Arc<ScriptedGenerator>) -> Router {
    create_router(AppState::with_generator(Settings::default(), generator))
}

fn form_body(extra: &str) -> String {
    let base = "invitees=Dept+Heads&office=Mayor%27s+Office&date=2024-06-01&purpose=Budget+review";
    if extra.is_empty() {
        base.to_string()
    } else {
        format!("{}&{}", base, extra)
    }
}

fn post_generate(body: String, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response sets session cookie")
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap().to_string();
    assert!(pair.starts_with(SESSION_COOKIE));
    pair
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn index_renders_form() {
    let app = app(ScriptedGenerator::new(vec![]));

    let response = app.oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("Generate Notice"));
    assert!(!html.contains("<embed"));
}

#[tokio::test]
async fn download_before_generation_is_not_found() {
    let app = app(ScriptedGenerator::new(vec![]));

    let response = app
        .oneshot(get("/notice_of_meeting.pdf", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_generates_downloadable_pdf() {
    let generator = ScriptedGenerator::new(vec![Ok(EXAMPLE_REPLY)]);
    let app = app(generator.clone());

    let response = app
        .clone()
        .oneshot(post_generate(form_body(""), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Notice of Meeting generated successfully!"));
    assert!(html.contains("data:application/pdf;base64,"));

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.prompt.contains("- Purpose: Budget review"));
    assert!(calls[0].1.prompt.contains("- Calling Office: Mayor's Office"));

    let download = app
        .oneshot(get("/notice_of_meeting.pdf", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(
        download.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        download.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"notice_of_meeting.pdf\""
    );
    let pdf = body_bytes(download).await;
    assert!(pdf.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn out_of_range_parameters_never_reach_generator() {
    let generator = ScriptedGenerator::new(vec![Ok(EXAMPLE_REPLY), Ok(EXAMPLE_REPLY)]);
    let app = app(generator.clone());

    let high = form_body("model=Llama2-13B&temperature=7.5&top_p=2&max_length=4096");
    let response = app.clone().oneshot(post_generate(high, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let low = form_body("temperature=-1&top_p=0&max_length=1");
    let response = app.oneshot(post_generate(low, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = generator.calls();
    assert_eq!(calls.len(), 2);

    let (model, input) = &calls[0];
    assert_eq!(*model, ModelPreset::Llama2_13B);
    assert_eq!(input.temperature, 1.0);
    assert_eq!(input.top_p, 1.0);
    assert_eq!(input.max_length, 128);
    assert_eq!(input.repetition_penalty, 1.0);

    let (model, input) = &calls[1];
    assert_eq!(*model, ModelPreset::Llama2_7B);
    assert_eq!(input.temperature, 0.01);
    assert_eq!(input.top_p, 0.01);
    assert_eq!(input.max_length, 32);
}

#[tokio::test]
async fn malformed_reply_keeps_previous_notice() {
    let generator = ScriptedGenerator::new(vec![
        Ok(EXAMPLE_REPLY),
        Ok("AGENDA:\n1. Review budget\nDear all, please attend."),
    ]);
    let app = app(generator);

    let first = app
        .clone()
        .oneshot(post_generate(form_body(""), None))
        .await
        .unwrap();
    let cookie = session_cookie(&first);
    let first_pdf = body_bytes(
        app.clone()
            .oneshot(get("/notice_of_meeting.pdf", Some(&cookie)))
            .await
            .unwrap(),
    )
    .await;

    let second = app
        .clone()
        .oneshot(post_generate(form_body(""), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_GATEWAY);
    let html = String::from_utf8(body_bytes(second).await).unwrap();
    assert!(html.contains("Malformed AI response"));
    assert!(html.contains("<embed"));
    assert!(html.contains(r#"value="Dept Heads""#));
    assert!(html.contains(r#"value="Mayor's Office""#));
    assert!(html.contains(r#"value="2024-06-01""#));
    assert!(html.contains(">Budget review</textarea>"));

    let after = app
        .oneshot(get("/notice_of_meeting.pdf", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::OK);
    assert_eq!(body_bytes(after).await, first_pdf);
}

#[tokio::test]
async fn inference_failure_shows_generic_error() {
    let generator = ScriptedGenerator::new(vec![Err("connection reset")]);
    let app = app(generator);

    let response = app
        .clone()
        .oneshot(post_generate(form_body(""), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let cookie = session_cookie(&response);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Failed to generate the meeting notice"));
    assert!(!html.contains("connection reset"));

    let download = app
        .oneshot(get("/notice_of_meeting.pdf", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let generator = ScriptedGenerator::new(vec![Ok(EXAMPLE_REPLY)]);
    let app = app(generator);

    let response = app
        .clone()
        .oneshot(post_generate(form_body(""), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let other = format!("{}={}", SESSION_COOKIE, uuid::Uuid::new_v4());
    let download = app
        .oneshot(get("/notice_of_meeting.pdf", Some(&other)))
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_date_is_rejected_before_generation() {
    let generator = ScriptedGenerator::new(vec![Ok(EXAMPLE_REPLY)]);
    let app = app(generator.clone());

    let body = "invitees=A&office=B&date=tomorrow&purpose=C".to_string();
    let response = app.oneshot(post_generate(body, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn missing_token_is_reported_without_configured_generator() {
    let app = create_router(AppState::new(Settings::default()));

    let index = app.clone().oneshot(get("/", None)).await.unwrap();
    let html = String::from_utf8(body_bytes(index).await).unwrap();
    assert!(html.contains(r#"name="api_token""#));
    assert!(html.contains("Please enter your credentials!"));

    let response = app
        .oneshot(post_generate(form_body(""), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Replicate API token is missing"));
}

#[tokio::test]
async fn abandoned_submission_does_not_block_the_session() {
    let generator = Arc::new(StallsOnce::default());
    let app = create_router(AppState::with_generator(
        Settings::default(),
        generator.clone(),
    ));
    let cookie = format!("{}={}", SESSION_COOKIE, uuid::Uuid::new_v4());

    let abandoned = tokio::time::timeout(
        Duration::from_millis(100),
        app.clone()
            .oneshot(post_generate(form_body(""), Some(&cookie))),
    )
    .await;
    assert!(abandoned.is_err());

    let retry = app
        .clone()
        .oneshot(post_generate(form_body(""), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(retry.status(), StatusCode::OK);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);

    let download = app
        .oneshot(get("/notice_of_meeting.pdf", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_submission_keeps_entered_token() {
    let mut settings = Settings::default();
    settings.llm.endpoint = "http://127.0.0.1:1/v1".to_string();
    let app = create_router(AppState::new(settings));

    let response = app
        .oneshot(post_generate(form_body("api_token=r8_short"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains(r#"value="r8_short""#));
    assert!(html.contains("Please enter your credentials!"));
}
