use crate::models::{ApplicantInput, RiskAssessment, Speaker, Transcript};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur with session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Per-session state: last scoring result and chat transcript
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub last_input: Option<ApplicantInput>,
    pub last_assessment: Option<RiskAssessment>,
    pub transcript: Transcript,
    pub api_key: Option<String>,
}

impl SessionState {
    /// Form values the chat context is built from
    pub fn current_input(&self) -> ApplicantInput {
        self.last_input.clone().unwrap_or_default()
    }
}

/// In-memory session store
///
/// Sessions expire after the configured idle time. Each session sits behind
/// its own lock so concurrent requests for one session apply in order.
pub struct SessionStore {
    sessions: moka::future::Cache<String, Arc<Mutex<SessionState>>>,
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle_ttl_secs: u64) -> Self {
        let sessions = moka::future::CacheBuilder::new(max_sessions)
            .time_to_idle(Duration::from_secs(idle_ttl_secs))
            .build();

        Self { sessions }
    }

    /// Create a session with a greeting-seeded transcript, returning its id
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions
            .insert(id.clone(), Arc::new(Mutex::new(SessionState::default())))
            .await;
        tracing::debug!("Created session {}", id);
        id
    }

    async fn handle(&self, id: &str) -> Result<Arc<Mutex<SessionState>>, SessionError> {
        self.sessions
            .get(id)
            .await
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Snapshot of a session
    pub async fn get(&self, id: &str) -> Result<SessionState, SessionError> {
        let handle = self.handle(id).await?;
        let state = handle.lock().await;
        Ok(state.clone())
    }

    /// Store the latest form input and its assessment
    pub async fn record_assessment(
        &self,
        id: &str,
        input: ApplicantInput,
        assessment: RiskAssessment,
    ) -> Result<(), SessionError> {
        let handle = self.handle(id).await?;
        let mut state = handle.lock().await;
        state.last_input = Some(input);
        state.last_assessment = Some(assessment);
        Ok(())
    }

    pub async fn append_turn(
        &self,
        id: &str,
        speaker: Speaker,
        message: impl Into<String>,
    ) -> Result<(), SessionError> {
        let handle = self.handle(id).await?;
        let mut state = handle.lock().await;
        state.transcript.push(speaker, message);
        Ok(())
    }

    /// Append a user turn and return the state the reply is built from
    pub async fn begin_exchange(&self, id: &str, message: &str) -> Result<SessionState, SessionError> {
        let handle = self.handle(id).await?;
        let mut state = handle.lock().await;
        state.transcript.push(Speaker::You, message);
        Ok(state.clone())
    }

    pub async fn set_api_key(&self, id: &str, key: String) -> Result<(), SessionError> {
        let handle = self.handle(id).await?;
        let mut state = handle.lock().await;
        state.api_key = Some(key);
        Ok(())
    }

    pub fn session_count(&self) -> u64 {
        self.sessions.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskRating, GREETING};

    #[tokio::test]
    async fn test_create_seeds_greeting() {
        let store = SessionStore::new(100, 60);
        let id = store.create().await;

        let state = store.get(&id).await.unwrap();
        assert_eq!(state.transcript.len(), 1);
        assert_eq!(state.transcript.turns()[0].message, GREETING);
        assert!(state.last_assessment.is_none());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = SessionStore::new(100, 60);
        assert!(matches!(store.get("missing").await, Err(SessionError::NotFound(_))));
        assert!(store.append_turn("missing", Speaker::You, "hi").await.is_err());
    }

    #[tokio::test]
    async fn test_record_assessment() {
        let store = SessionStore::new(100, 60);
        let id = store.create().await;
        let assessment = RiskAssessment {
            probability: 0.2,
            credit_score: 780,
            rating: RiskRating::Excellent,
        };

        store
            .record_assessment(&id, ApplicantInput::default(), assessment)
            .await
            .unwrap();

        let state = store.get(&id).await.unwrap();
        assert_eq!(state.last_assessment, Some(assessment));
        assert_eq!(state.current_input(), ApplicantInput::default());
    }

    #[tokio::test]
    async fn test_turns_keep_insertion_order() {
        let store = SessionStore::new(100, 60);
        let id = store.create().await;

        store.begin_exchange(&id, "How do I improve?").await.unwrap();
        store.append_turn(&id, Speaker::Bot, "Pay on time.").await.unwrap();
        store.begin_exchange(&id, "Thanks").await.unwrap();

        let state = store.get(&id).await.unwrap();
        let speakers: Vec<Speaker> = state.transcript.turns().iter().map(|t| t.speaker).collect();
        assert_eq!(speakers, vec![Speaker::Bot, Speaker::You, Speaker::Bot, Speaker::You]);
        assert_eq!(state.transcript.turns()[3].message, "Thanks");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(100, 60);
        let a = store.create().await;
        let b = store.create().await;

        store.set_api_key(&a, "gsk_a".to_string()).await.unwrap();
        store.begin_exchange(&a, "hello").await.unwrap();

        let b_state = store.get(&b).await.unwrap();
        assert!(b_state.api_key.is_none());
        assert_eq!(b_state.transcript.len(), 1);
    }
}
