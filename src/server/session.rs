//! Per-session document state

use axum::http::{header, HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use crate::pdf::RenderedArtifact;

pub const SESSION_COOKIE: &str = "noticegen_session";

/// The generated notice held for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionDocument {
    /// Nothing generated yet
    #[default]
    Empty,

    /// Latest successfully generated notice
    Ready(RenderedArtifact),
}

impl SessionDocument {
    pub fn artifact(&self) -> Option<&RenderedArtifact> {
        match self {
            Self::Empty => None,
            Self::Ready(artifact) => Some(artifact),
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    document: SessionDocument,
    in_flight: bool,
}

/// Thread-safe map of session id to session state.
///
/// Locks are never held across an await.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, id: Uuid) -> SessionDocument {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|session| session.document.clone())
            .unwrap_or_default()
    }

    /// Mark a submission as in flight, or `None` if one already is.
    ///
    /// The mark is held by the returned guard and cleared when it drops,
    /// including when the request is abandoned mid-generation.
    pub fn begin(&self, id: Uuid) -> Option<InFlight> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions.entry(id).or_default();
        if session.in_flight {
            return None;
        }
        session.in_flight = true;
        Some(InFlight {
            store: self.clone(),
            id,
        })
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut Session)) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        f(sessions.entry(id).or_default());
    }
}

/// A running submission for one session.
#[derive(Debug)]
pub struct InFlight {
    store: SessionStore,
    id: Uuid,
}

impl InFlight {
    /// End the submission, replacing the document when one was produced.
    pub fn finish(self, artifact: Option<RenderedArtifact>) {
        if let Some(artifact) = artifact {
            self.store.update(self.id, |session| {
                session.document = SessionDocument::Ready(artifact)
            });
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.store
            .update(self.id, |session| session.in_flight = false);
    }
}

/// Session id from the request cookie, or a fresh one.
pub fn session_id(headers: &HeaderMap) -> Uuid {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
}

pub fn session_cookie(id: Uuid) -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, id
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::render_document;

    #[test]
    fn unknown_session_is_empty() {
        let store = SessionStore::new();
        assert_eq!(store.document(Uuid::new_v4()), SessionDocument::Empty);
    }

    #[test]
    fn successful_finish_replaces_document() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        let first = render_document("First").unwrap();
        let second = render_document("Second").unwrap();

        store.begin(id).unwrap().finish(Some(first));
        store.begin(id).unwrap().finish(Some(second.clone()));

        assert_eq!(store.document(id), SessionDocument::Ready(second));
    }

    #[test]
    fn failed_finish_keeps_previous_document() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        let artifact = render_document("Kept").unwrap();

        store.begin(id).unwrap().finish(Some(artifact.clone()));
        store.begin(id).unwrap().finish(None);

        assert_eq!(store.document(id).artifact(), Some(&artifact));
    }

    #[test]
    fn second_submission_is_rejected_while_in_flight() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        let running = store.begin(id).unwrap();
        assert!(store.begin(id).is_none());
        assert!(store.begin(Uuid::new_v4()).is_some());
        running.finish(None);
        assert!(store.begin(id).is_some());
    }

    #[test]
    fn dropped_submission_releases_session() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        let artifact = render_document("Kept").unwrap();
        store.begin(id).unwrap().finish(Some(artifact.clone()));

        let abandoned = store.begin(id).unwrap();
        drop(abandoned);

        assert!(store.begin(id).is_some());
        assert_eq!(store.document(id).artifact(), Some(&artifact));
    }

    #[test]
    fn session_id_is_read_from_cookie() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );
        assert_eq!(session_id(&headers), id);
    }

    #[test]
    fn invalid_cookie_gets_fresh_session() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("noticegen_session=not-a-uuid"),
        );
        let first = session_id(&headers);
        let second = session_id(&headers);
        assert_ne!(first, second);
    }

    #[test]
    fn cookie_round_trips_through_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        let set_cookie = session_cookie(id);
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
        headers.insert(header::COOKIE, HeaderValue::from_str(&pair).unwrap());
        assert_eq!(session_id(&headers), id);
    }
}
