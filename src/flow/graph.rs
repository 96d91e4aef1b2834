//! @acp:module "Question Flow Graph"
//! @acp:summary "Compiled flow table: default transitions plus predicate redirects"
//! @acp:domain flow
//! @acp:layer logic

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::condition::{AnswerSet, Predicate, ResolvedAnswer};
use super::types::{FlowDefinition, QuestionNode};
use crate::error::{Result, ThriveError};
use crate::session::AnswerRecord;

/// Predicate redirect compiled from `conditionalNext`/`condition` or `branches`
#[derive(Debug, Clone)]
pub struct Branch {
    pub predicate: Predicate,
    pub target: String,
}

/// Outgoing edges of one node
#[derive(Debug, Clone)]
pub struct Transition {
    pub default: String,
    pub branches: Vec<Branch>,
}

/// Progress position of a node, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub section: Option<String>,
    pub section_index: Option<u32>,
    pub section_count: u32,
    /// 1-based position among question nodes in table order
    pub position: usize,
    pub total: usize,
}

/// Result of walking the graph from the start node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    /// Nodes passed through, in order
    pub path: Vec<String>,
    /// Where the walk stopped: first unanswered node or the terminal node
    pub stop: String,
}

/// The onboarding flow as a state machine over node ids
#[derive(Debug, Clone)]
pub struct QuestionFlowGraph {
    definition: FlowDefinition,
    by_id: HashMap<String, usize>,
    by_key: HashMap<String, usize>,
    transitions: Vec<Transition>,
    fingerprint: String,
}

impl QuestionFlowGraph {
    /// Compile a flow definition.
    ///
    /// Folds `additionalNodes` and `disabledNodes` into the node list, then
    /// rejects duplicate ids, duplicate answer keys, an undefined start node
    /// and malformed conditions.
    pub fn from_definition(definition: FlowDefinition) -> Result<Self> {
        let mut definition = definition;
        let additional = std::mem::take(&mut definition.additional_nodes);
        definition.nodes.extend(additional);
        let disabled = std::mem::take(&mut definition.disabled_nodes);
        definition.nodes.retain(|n| !disabled.contains(&n.id));

        let fingerprint = definition.fingerprint()?;

        let mut by_id = HashMap::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();
        let mut transitions = Vec::with_capacity(definition.nodes.len());

        for (pos, node) in definition.nodes.iter().enumerate() {
            if by_id.insert(node.id.clone(), pos).is_some() {
                return Err(ThriveError::DuplicateNode(node.id.clone()));
            }
            if node.is_question() {
                if let Some(&first) = by_key.get(node.answer_key()) {
                    return Err(ThriveError::DuplicateKey {
                        key: node.answer_key().to_string(),
                        first: definition.nodes[first].id.clone(),
                        second: node.id.clone(),
                    });
                }
                by_key.insert(node.answer_key().to_string(), pos);
            }
            transitions.push(compile_transition(node, &definition.done)?);
        }

        if !by_id.contains_key(&definition.start) {
            return Err(ThriveError::UnknownNode(definition.start.clone()));
        }

        tracing::debug!(
            nodes = definition.nodes.len(),
            start = %definition.start,
            done = %definition.done,
            "Compiled question flow"
        );

        Ok(Self {
            definition,
            by_id,
            by_key,
            transitions,
            fingerprint,
        })
    }

    pub fn start(&self) -> &str {
        &self.definition.start
    }

    pub fn done(&self) -> &str {
        &self.definition.done
    }

    pub fn is_terminal(&self, id: &str) -> bool {
        id == self.definition.done
    }

    pub fn name(&self) -> Option<&str> {
        self.definition.name.as_deref()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn definition(&self) -> &FlowDefinition {
        &self.definition
    }

    pub fn nodes(&self) -> &[QuestionNode] {
        &self.definition.nodes
    }

    pub fn node(&self, id: &str) -> Option<&QuestionNode> {
        self.by_id.get(id).map(|&pos| &self.definition.nodes[pos])
    }

    /// Question node that records answers under `key`
    pub fn node_for_key(&self, key: &str) -> Option<&QuestionNode> {
        self.by_key.get(key).map(|&pos| &self.definition.nodes[pos])
    }

    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.by_id.get(id).map(|&pos| &self.transitions[pos])
    }

    /// Resolve recorded answers into labels and deductions.
    ///
    /// Answers whose key no node asks, or whose index is out of range, keep
    /// their index but carry no label and a zero deduction.
    pub fn resolve(&self, answers: &[AnswerRecord]) -> AnswerSet {
        let mut set = AnswerSet::new();
        for record in answers {
            let option = self
                .node_for_key(&record.question_key)
                .and_then(|node| node.options.get(record.selected_option_index));
            set.insert(
                record.question_key.clone(),
                ResolvedAnswer {
                    index: record.selected_option_index,
                    label: option.map(|o| o.label.clone()),
                    deduction: option.map(|o| o.deduction).unwrap_or(0),
                },
            );
        }
        set
    }

    /// Next node after `current` given the recorded answers.
    ///
    /// Returns the first branch target whose predicate holds, else the
    /// default. A predicate that cannot be evaluated (e.g. it references an
    /// unanswered key) counts as false. The terminal node and undefined
    /// nodes have no transitions and are returned unchanged.
    pub fn next<'a>(&'a self, current: &'a str, answers: &[AnswerRecord]) -> &'a str {
        let set = self.resolve(answers);
        self.next_with(current, &set)
    }

    /// [`next`](Self::next) against an already resolved answer set
    pub fn next_with<'a>(&'a self, current: &'a str, answers: &AnswerSet) -> &'a str {
        let Some(transition) = self.transition(current) else {
            if !self.is_terminal(current) {
                tracing::warn!(node = current, "No transitions for undefined node");
            }
            return current;
        };

        for branch in &transition.branches {
            match branch.predicate.evaluate(answers) {
                Ok(true) => {
                    tracing::debug!(
                        from = current,
                        to = %branch.target,
                        condition = branch.predicate.source(),
                        "Conditional branch taken"
                    );
                    return &branch.target;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        from = current,
                        condition = branch.predicate.source(),
                        error = %e,
                        "Condition not evaluable, using default"
                    );
                }
            }
        }

        &transition.default
    }

    /// Walk from the start node following [`next`](Self::next) until a
    /// question without an answer, an undefined node, or the terminal node.
    ///
    /// Informational nodes are passed through once anything has been
    /// answered; an empty session stops at the start node.
    pub fn walk(&self, answers: &[AnswerRecord]) -> Result<Walk> {
        if answers.is_empty() {
            return Ok(Walk {
                path: Vec::new(),
                stop: self.start().to_string(),
            });
        }

        let set = self.resolve(answers);
        let mut visited: HashSet<&str> = HashSet::new();
        let mut path = Vec::new();
        let mut current = self.start();

        loop {
            if self.is_terminal(current) {
                break;
            }
            if !visited.insert(current) {
                return Err(ThriveError::FlowCycle(current.to_string()));
            }
            match self.node(current) {
                None => {
                    tracing::warn!(node = current, "Walk reached an undefined node");
                    break;
                }
                Some(node) if node.is_question() && !set.contains(node.answer_key()) => break,
                Some(_) => {
                    path.push(current.to_string());
                    current = self.next_with(current, &set);
                }
            }
        }

        Ok(Walk {
            path,
            stop: current.to_string(),
        })
    }

    /// Progress position of a node; `None` for undefined nodes
    pub fn progress(&self, id: &str) -> Option<Progress> {
        let node = self.node(id)?;
        let questions: Vec<&QuestionNode> = self.nodes().iter().filter(|n| n.is_question()).collect();
        let section_count = self
            .nodes()
            .iter()
            .filter_map(|n| n.section_index)
            .max()
            .unwrap_or(0);

        // Informational screens report the position of the next question in table order
        let own_pos = self.by_id.get(id).copied().unwrap_or(0);
        let position = self.nodes()[..own_pos]
            .iter()
            .filter(|n| n.is_question())
            .count()
            + usize::from(node.is_question());

        Some(Progress {
            section: node.section.clone(),
            section_index: node.section_index,
            section_count,
            position,
            total: questions.len(),
        })
    }
}

fn compile_transition(node: &QuestionNode, done: &str) -> Result<Transition> {
    let default = node.next.clone().unwrap_or_else(|| done.to_string());
    let mut branches = Vec::new();

    match (&node.conditional_next, &node.condition) {
        (Some(target), Some(condition)) => branches.push(Branch {
            predicate: compile_predicate(node, condition)?,
            target: target.clone(),
        }),
        (None, None) => {}
        (Some(_), None) => {
            return Err(ThriveError::Condition(format!(
                "Node '{}' has conditionalNext without a condition",
                node.id
            )))
        }
        (None, Some(_)) => {
            return Err(ThriveError::Condition(format!(
                "Node '{}' has a condition without conditionalNext",
                node.id
            )))
        }
    }

    for branch in &node.branches {
        branches.push(Branch {
            predicate: compile_predicate(node, &branch.when)?,
            target: branch.goto.clone(),
        });
    }

    Ok(Transition { default, branches })
}

fn compile_predicate(node: &QuestionNode, expr: &str) -> Result<Predicate> {
    Predicate::parse(expr).map_err(|e| match e {
        ThriveError::Condition(msg) => {
            ThriveError::Condition(format!("Node '{}': {}", node.id, msg))
        }
        other => other,
    })
}
