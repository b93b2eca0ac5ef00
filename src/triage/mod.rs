//! Symptom triage: prompt assembly, provider call and the clarification policy.

pub mod openrouter;
pub mod prompt;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{CLARIFICATION_MAX_LEN, MAX_CLARIFICATION_ROUNDS};
use crate::models::UserProfile;

pub use openrouter::OpenRouterClient;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI provider unreachable at {0}")]
    Connection(String),

    #[error("AI request timed out after {0}s")]
    Timeout(u64),

    #[error("AI provider returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("AI provider returned an empty answer")]
    EmptyResponse,
}

/// Chat-completion provider.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AiError>;
}

/// Symptom text to analyse and the number of clarifications already asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageRequest {
    pub symptoms: String,
    pub round: u8,
}

impl TriageRequest {
    pub fn new(symptoms: &str) -> Self {
        Self {
            symptoms: symptoms.to_string(),
            round: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageOutcome {
    /// Short follow-up question; the user's answer re-enters triage.
    Clarify(String),
    /// Final answer, disclaimer guaranteed.
    Final(String),
}

impl TriageOutcome {
    pub fn text(&self) -> &str {
        match self {
            TriageOutcome::Clarify(t) | TriageOutcome::Final(t) => t,
        }
    }
}

/// A short response containing a question mark is a clarifying question.
pub fn is_clarifying_question(response: &str) -> bool {
    response.contains('?') && response.chars().count() < CLARIFICATION_MAX_LEN
}

/// Applies the clarification policy. After the round bound every answer is final.
pub fn classify(response: &str, round: u8) -> TriageOutcome {
    let response = response.trim();
    if round < MAX_CLARIFICATION_ROUNDS && is_clarifying_question(response) {
        TriageOutcome::Clarify(response.to_string())
    } else {
        TriageOutcome::Final(prompt::ensure_disclaimer(response))
    }
}

/// The exact prompt pair sent for a request. Also what gets logged.
pub struct TriagePrompt {
    pub system: String,
    pub user: String,
}

impl TriagePrompt {
    pub fn build(profile: Option<&UserProfile>, request: &TriageRequest) -> Self {
        Self {
            system: prompt::system_prompt(profile),
            user: prompt::user_prompt(profile, &request.symptoms),
        }
    }
}

/// Calls the provider under a hard timeout.
pub async fn ask(
    client: &dyn AiClient,
    prompt: &TriagePrompt,
    timeout: Duration,
) -> Result<String, AiError> {
    let response = tokio::time::timeout(timeout, client.complete(&prompt.system, &prompt.user))
        .await
        .map_err(|_| AiError::Timeout(timeout.as_secs()))??;

    if response.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAiClient;

    #[test]
    fn short_question_clarifies() {
        let outcome = classify("Як довго триває біль?", 0);
        assert_eq!(outcome, TriageOutcome::Clarify("Як довго триває біль?".into()));
    }

    #[test]
    fn long_answer_with_question_is_final() {
        let long = format!("{}?", "а".repeat(CLARIFICATION_MAX_LEN));
        assert!(matches!(classify(&long, 0), TriageOutcome::Final(_)));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 200 Cyrillic chars are 400 bytes but still a short question.
        let q = format!("{}?", "б".repeat(200));
        assert!(is_clarifying_question(&q));
    }

    #[test]
    fn answer_without_question_mark_is_final_with_disclaimer() {
        let outcome = classify("Відпочиньте та пийте воду.", 0);
        let TriageOutcome::Final(text) = outcome else {
            panic!("expected final");
        };
        assert!(text.ends_with(prompt::DISCLAIMER));
    }

    #[test]
    fn round_bound_forces_final() {
        let q = "Чи є температура?";
        assert!(matches!(classify(q, MAX_CLARIFICATION_ROUNDS - 1), TriageOutcome::Clarify(_)));
        assert!(matches!(classify(q, MAX_CLARIFICATION_ROUNDS), TriageOutcome::Final(_)));
    }

    #[tokio::test]
    async fn ask_times_out() {
        let client = MockAiClient::hanging();
        let prompt = TriagePrompt::build(None, &TriageRequest::new("біль"));
        let result = ask(&client, &prompt, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(AiError::Timeout(_))));
    }

    #[tokio::test]
    async fn ask_rejects_blank_response() {
        let client = MockAiClient::with_responses(vec![Ok("   ".into())]);
        let prompt = TriagePrompt::build(None, &TriageRequest::new("біль"));
        let result = ask(&client, &prompt, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(AiError::EmptyResponse)));
    }

    #[tokio::test]
    async fn ask_passes_both_prompts() {
        let client = MockAiClient::with_responses(vec![Ok("Відповідь".into())]);
        let prompt = TriagePrompt::build(None, &TriageRequest::new("кашель"));
        let response = ask(&client, &prompt, Duration::from_secs(1)).await.unwrap();
        assert_eq!(response, "Відповідь");
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, prompt.system);
        assert!(calls[0].1.contains("кашель"));
    }
}
