//! Test doubles for the AI provider and the chat transport.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::core_state::CoreState;
use crate::models::UserId;
use crate::transport::{DeliveryError, Keyboard, Transport};
use crate::triage::{AiClient, AiError};

/// Scripted AI provider. Responses are consumed in order; once the script
/// runs out every call fails with `EmptyResponse`.
pub struct MockAiClient {
    responses: Mutex<VecDeque<Result<String, AiError>>>,
    hang: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockAiClient {
    pub fn with_responses(responses: Vec<Result<String, AiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            hang: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Never answers; exercises the timeout path.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::with_responses(Vec::new())
        }
    }

    pub fn failing() -> Self {
        Self::with_responses(vec![Err(AiError::Connection("mock".into()))])
    }

    /// (system, user) prompt pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiClient for MockAiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AiError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        if self.hang {
            return std::future::pending::<Result<String, AiError>>().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AiError::EmptyResponse))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub user_id: UserId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Captures everything the core sends.
#[derive(Default)]
pub struct RecordingTransport {
    messages: Mutex<Vec<SentMessage>>,
    documents: Mutex<Vec<(UserId, PathBuf, Option<String>)>>,
    unreachable: Mutex<HashSet<UserId>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later delivery to `user_id` fails as if the bot was blocked.
    pub fn set_unreachable(&self, user_id: UserId) {
        self.unreachable.lock().unwrap().insert(user_id);
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn texts_to(&self, user_id: UserId) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.text)
            .collect()
    }

    pub fn last_to(&self, user_id: UserId) -> Option<SentMessage> {
        self.messages().into_iter().rev().find(|m| m.user_id == user_id)
    }

    pub fn documents(&self) -> Vec<(UserId, PathBuf, Option<String>)> {
        self.documents.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
        self.documents.lock().unwrap().clear();
    }

    fn check(&self, user_id: UserId) -> Result<(), DeliveryError> {
        if self.unreachable.lock().unwrap().contains(&user_id) {
            return Err(DeliveryError::Unreachable(user_id));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        user_id: UserId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), DeliveryError> {
        self.check(user_id)?;
        self.messages.lock().unwrap().push(SentMessage {
            user_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn send_document(
        &self,
        user_id: UserId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        self.check(user_id)?;
        self.documents.lock().unwrap().push((
            user_id,
            path.to_path_buf(),
            caption.map(str::to_string),
        ));
        Ok(())
    }
}

/// Core wired to a temp-dir database, the given AI script and a recorder.
pub struct TestCore {
    pub core: Arc<CoreState>,
    pub ai: Arc<MockAiClient>,
    pub transport: Arc<RecordingTransport>,
    _dir: TempDir,
}

impl TestCore {
    pub fn new(ai: MockAiClient) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let ai = Arc::new(ai);
        let transport = Arc::new(RecordingTransport::new());
        let core = CoreState::new(
            dir.path().join("test.db"),
            dir.path().join("reports"),
            ai.clone(),
            transport.clone(),
        )
        .with_ai_timeout(Duration::from_millis(200));
        crate::db::open_database(core.db_path()).unwrap();
        Self {
            core: Arc::new(core),
            ai,
            transport,
            _dir: dir,
        }
    }

    pub fn quiet() -> Self {
        Self::new(MockAiClient::with_responses(Vec::new()))
    }
}
