//! @acp:module "Flow Types"
//! @acp:summary "Type definitions matching flow.schema.json"
//! @acp:domain flow
//! @acp:layer types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_done() -> String {
    "done".to_string()
}

/// Declarative onboarding flow: the table every graph is built from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    /// `"builtin"` layers this file over the built-in flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// First node shown to a new session
    #[serde(default)]
    pub start: String,

    /// Terminal node id; it does not need a node of its own
    #[serde(default = "default_done")]
    pub done: String,

    #[serde(default)]
    pub nodes: Vec<QuestionNode>,

    /// Nodes appended after merge (project files only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_nodes: Vec<QuestionNode>,

    /// Node ids removed after merge (project files only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_nodes: Vec<String>,
}

impl FlowDefinition {
    /// SHA-256 over the canonical JSON of this definition.
    ///
    /// Stored with each session so a session recorded against an older
    /// flow can be detected on load.
    pub fn fingerprint(&self) -> crate::Result<String> {
        let canonical = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&canonical);
        Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn node(&self, id: &str) -> Option<&QuestionNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// One onboarding screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionNode {
    pub id: String,

    /// Answer key; falls back to the node id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Section title shown above the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Section number for progress display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_index: Option<u32>,

    /// Empty for informational screens
    #[serde(default)]
    pub options: Vec<AnswerOption>,

    /// Default transition; `None` proceeds to the terminal node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_next: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Ordered redirects evaluated after `conditionalNext`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchDef>,
}

impl QuestionNode {
    pub fn answer_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.id)
    }

    pub fn is_question(&self) -> bool {
        !self.options.is_empty()
    }

    /// Every node id this node can transition to
    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        if let Some(next) = &self.next {
            targets.push(next);
        }
        if let Some(conditional) = &self.conditional_next {
            targets.push(conditional);
        }
        targets.extend(self.branches.iter().map(|b| b.goto.as_str()));
        targets
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,

    #[serde(default)]
    pub deduction: u32,
}

impl AnswerOption {
    pub fn new(label: impl Into<String>, deduction: u32) -> Self {
        Self {
            label: label.into(),
            deduction,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchDef {
    pub when: String,
    pub goto: String,
}
