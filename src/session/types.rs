//! @acp:module "Session Types"
//! @acp:summary "Persisted onboarding session and answer records"
//! @acp:domain session
//! @acp:layer types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One submitted question screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_key: String,
    pub selected_option_index: usize,
    pub timestamp: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn new(question_key: impl Into<String>, selected_option_index: usize) -> Self {
        Self {
            question_key: question_key.into(),
            selected_option_index,
            timestamp: Utc::now(),
        }
    }
}

/// A user's resumable onboarding progress
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    #[serde(default)]
    pub answers: Vec<AnswerRecord>,

    #[serde(default)]
    pub current_node_id: String,

    #[serde(default)]
    pub been_here_before: bool,

    /// Fingerprint of the flow the answers were recorded against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_fingerprint: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<u8>,
}

impl Session {
    /// Fresh session positioned on `start`
    pub fn new(start: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            answers: Vec::new(),
            current_node_id: start.into(),
            been_here_before: false,
            flow_fingerprint: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            final_score: None,
        }
    }

    pub fn answer(&self, question_key: &str) -> Option<&AnswerRecord> {
        self.answers.iter().find(|a| a.question_key == question_key)
    }

    /// Insert or overwrite the answer for `question_key`.
    ///
    /// Returns the index the key previously held, if any.
    pub fn upsert(&mut self, question_key: &str, option_index: usize) -> Option<usize> {
        let now = Utc::now();
        self.updated_at = now;
        if let Some(existing) = self
            .answers
            .iter_mut()
            .find(|a| a.question_key == question_key)
        {
            let previous = existing.selected_option_index;
            existing.selected_option_index = option_index;
            existing.timestamp = now;
            return Some(previous);
        }
        self.answers.push(AnswerRecord {
            question_key: question_key.to_string(),
            selected_option_index: option_index,
            timestamp: now,
        });
        None
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}
