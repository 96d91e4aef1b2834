//! @acp:module "Answer Store"
//! @acp:summary "Record, persist and resume onboarding answers"
//! @acp:domain session
//! @acp:layer service

use chrono::Utc;

use super::store::{load_state, save_state, KeyValueStore};
use super::types::{AnswerRecord, Session};
use crate::error::{Result, ThriveError};
use crate::flow::QuestionFlowGraph;
use crate::score::ScoreAccumulator;

/// Owns one session and writes it through to a key-value store
pub struct AnswerStore<S: KeyValueStore> {
    store: S,
    key: String,
    session: Session,
    accumulator: ScoreAccumulator,
}

impl<S: KeyValueStore> AnswerStore<S> {
    /// Load the session stored under `key`, or start a new one at the
    /// graph's start node. Nothing is written until the first change.
    pub fn open(store: S, key: impl Into<String>, graph: &QuestionFlowGraph) -> Result<Self> {
        let key = key.into();
        let session = match load_state::<Session>(&store, &key)? {
            Some(mut session) => {
                session.been_here_before = true;
                match &session.flow_fingerprint {
                    Some(fp) if fp != graph.fingerprint() => {
                        tracing::warn!(
                            session = %session.id,
                            "Session was recorded against a different flow; keeping answers"
                        );
                    }
                    Some(_) => {}
                    None => session.flow_fingerprint = Some(graph.fingerprint().to_string()),
                }
                if graph.node(&session.current_node_id).is_none()
                    && !graph.is_terminal(&session.current_node_id)
                {
                    tracing::warn!(
                        node = %session.current_node_id,
                        "Stored position is not in the flow, resuming from first unanswered"
                    );
                    session.current_node_id = graph.walk(&session.answers)?.stop;
                }
                tracing::debug!(session = %session.id, answers = session.answers.len(), "Loaded session");
                session
            }
            None => new_session(graph),
        };

        Ok(Self {
            store,
            key,
            session,
            accumulator: ScoreAccumulator::default(),
        })
    }

    pub fn with_accumulator(mut self, accumulator: ScoreAccumulator) -> Self {
        self.accumulator = accumulator;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.session.answers
    }

    pub fn current_node_id(&self) -> &str {
        &self.session.current_node_id
    }

    /// Overwrite any prior answer for `question_key` and persist.
    ///
    /// No validation: an index the flow does not know simply deducts nothing.
    pub fn record(&mut self, question_key: &str, option_index: usize) -> Result<()> {
        self.apply_answer(question_key, option_index);
        self.save()
    }

    /// First node on the path from the start whose question has no answer,
    /// or the terminal node when everything on the path is answered.
    pub fn first_unanswered(&self, graph: &QuestionFlowGraph) -> Result<String> {
        Ok(graph.walk(&self.session.answers)?.stop)
    }

    /// Validate and record an answer for `node_id`, then advance.
    ///
    /// Returns the node the session moved to. Reaching the terminal node
    /// finalises the score.
    pub fn submit(
        &mut self,
        graph: &QuestionFlowGraph,
        node_id: &str,
        option_index: usize,
    ) -> Result<String> {
        let node = graph
            .node(node_id)
            .ok_or_else(|| ThriveError::UnknownNode(node_id.to_string()))?;
        if !node.is_question() {
            return Err(ThriveError::NotAQuestion(node_id.to_string()));
        }
        if option_index >= node.options.len() {
            return Err(ThriveError::InvalidOption {
                node: node_id.to_string(),
                index: option_index,
                count: node.options.len(),
            });
        }

        let key = node.answer_key().to_string();
        self.apply_answer(&key, option_index);
        let next = graph.next(node_id, &self.session.answers).to_string();
        self.move_to(graph, next.clone());
        self.save()?;
        Ok(next)
    }

    /// Move past the current node without answering it (informational
    /// screens). Returns the new position.
    pub fn advance(&mut self, graph: &QuestionFlowGraph) -> Result<String> {
        let current = self.session.current_node_id.clone();
        let next = graph.next(&current, &self.session.answers).to_string();
        self.move_to(graph, next.clone());
        self.save()?;
        Ok(next)
    }

    /// Reposition on the first unanswered node
    pub fn resume(&mut self, graph: &QuestionFlowGraph) -> Result<String> {
        let target = self.first_unanswered(graph)?;
        if target != self.session.current_node_id || graph.is_terminal(&target) {
            self.move_to(graph, target.clone());
            self.save()?;
        }
        Ok(target)
    }

    /// Destroy the persisted session and start over
    pub fn reset(&mut self, graph: &QuestionFlowGraph) -> Result<()> {
        self.store.remove(&self.key)?;
        self.session = new_session(graph);
        tracing::info!(key = %self.key, "Session reset");
        Ok(())
    }

    pub fn score(&self, graph: &QuestionFlowGraph) -> u8 {
        self.accumulator.score(&self.session.answers, graph)
    }

    /// Write the session through to the store
    pub fn save(&self) -> Result<()> {
        save_state(&self.store, &self.key, &self.session)
    }

    /// Upsert an answer; a changed answer reopens a completed session so
    /// the score is finalised again on the next arrival at the terminal node
    fn apply_answer(&mut self, question_key: &str, option_index: usize) {
        let previous = self.session.upsert(question_key, option_index);
        if previous.is_some_and(|p| p != option_index) && self.session.is_complete() {
            self.session.completed_at = None;
            self.session.final_score = None;
            tracing::debug!(key = question_key, "Changed answer reopened completed session");
        }
        tracing::debug!(key = question_key, option = option_index, ?previous, "Recorded answer");
    }

    fn move_to(&mut self, graph: &QuestionFlowGraph, node_id: String) {
        self.session.updated_at = Utc::now();
        if graph.is_terminal(&node_id) && !self.session.is_complete() {
            let score = self.accumulator.score(&self.session.answers, graph);
            self.session.final_score = Some(score);
            self.session.completed_at = Some(self.session.updated_at);
            tracing::info!(session = %self.session.id, score, "Onboarding complete");
        }
        self.session.current_node_id = node_id;
    }
}

fn new_session(graph: &QuestionFlowGraph) -> Session {
    let mut session = Session::new(graph.start());
    session.flow_fingerprint = Some(graph.fingerprint().to_string());
    session
}
