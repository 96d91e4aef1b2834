//! @acp:module "Flow Report"
//! @acp:summary "Lint a flow as the union of every referenced node id"
//! @acp:domain flow
//! @acp:layer logic

use std::collections::{BTreeSet, HashSet, VecDeque};

use serde::Serialize;

use super::graph::QuestionFlowGraph;

/// A transition target that no node defines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingReference {
    pub from: String,
    pub target: String,
}

/// A condition that reads an answer key no question records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingKey {
    pub node: String,
    pub key: String,
}

/// Structural findings for a flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    pub node_count: usize,
    pub question_count: usize,
    /// Every id defined or referenced, sorted
    pub referenced: Vec<String>,
    pub missing: Vec<MissingReference>,
    pub unreachable: Vec<String>,
    pub dangling_condition_keys: Vec<DanglingKey>,
}

impl FlowReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.unreachable.is_empty()
            && self.dangling_condition_keys.is_empty()
    }
}

impl QuestionFlowGraph {
    /// Analyse the flow without guessing intent: undefined targets are
    /// listed, never rewired.
    pub fn report(&self) -> FlowReport {
        let mut referenced: BTreeSet<String> = BTreeSet::new();
        let mut missing = Vec::new();
        let mut dangling = Vec::new();

        referenced.insert(self.start().to_string());
        referenced.insert(self.done().to_string());

        for node in self.nodes() {
            referenced.insert(node.id.clone());

            let Some(transition) = self.transition(&node.id) else {
                continue;
            };
            let targets = std::iter::once(&transition.default)
                .chain(transition.branches.iter().map(|b| &b.target));
            for target in targets {
                referenced.insert(target.clone());
                let reference = MissingReference {
                    from: node.id.clone(),
                    target: target.clone(),
                };
                if self.node(target).is_none()
                    && !self.is_terminal(target)
                    && !missing.contains(&reference)
                {
                    missing.push(reference);
                }
            }

            for branch in &transition.branches {
                for key in branch.predicate.keys() {
                    let entry = DanglingKey {
                        node: node.id.clone(),
                        key: key.to_string(),
                    };
                    if self.node_for_key(key).is_none() && !dangling.contains(&entry) {
                        dangling.push(entry);
                    }
                }
            }
        }

        let reachable = self.reachable();
        let unreachable = self
            .nodes()
            .iter()
            .filter(|n| !reachable.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();

        FlowReport {
            node_count: self.nodes().len(),
            question_count: self.nodes().iter().filter(|n| n.is_question()).count(),
            referenced: referenced.into_iter().collect(),
            missing,
            unreachable,
            dangling_condition_keys: dangling,
        }
    }

    /// Ids reachable from the start node over any edge
    fn reachable(&self) -> HashSet<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(self.start());

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(transition) = self.transition(id) {
                queue.push_back(&transition.default);
                for branch in &transition.branches {
                    queue.push_back(&branch.target);
                }
            }
        }

        seen
    }
}

#[cfg(test)]
mod tests {
    use crate::flow::types::FlowDefinition;
    use crate::flow::QuestionFlowGraph;

    fn graph(json: &str) -> QuestionFlowGraph {
        let def: FlowDefinition = serde_json::from_str(json).unwrap();
        QuestionFlowGraph::from_definition(def).unwrap()
    }

    #[test]
    fn test_clean_flow() {
        let g = graph(
            r#"{"start": "a", "nodes": [
                {"id": "a", "prompt": "A?", "options": [{"label": "x"}], "next": "b"},
                {"id": "b", "prompt": "B?", "options": [{"label": "y"}]}
            ]}"#,
        );
        let report = g.report();
        assert!(report.is_clean());
        assert_eq!(report.referenced, vec!["a", "b", "done"]);
        assert_eq!(report.question_count, 2);
    }

    #[test]
    fn test_missing_and_unreachable() {
        let g = graph(
            r#"{"start": "a", "nodes": [
                {"id": "a", "prompt": "A?", "options": [{"label": "x"}],
                 "next": "energy-and-engagement",
                 "conditionalNext": "celebration", "condition": "a == 0"},
                {"id": "orphan", "prompt": "O?", "options": [{"label": "y"}]}
            ]}"#,
        );
        let report = g.report();
        let targets: Vec<&str> = report.missing.iter().map(|m| m.target.as_str()).collect();
        assert_eq!(targets, vec!["energy-and-engagement", "celebration"]);
        assert_eq!(report.unreachable, vec!["orphan".to_string()]);
        assert!(report.referenced.contains(&"celebration".to_string()));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_dangling_condition_key() {
        let g = graph(
            r#"{"start": "a", "nodes": [
                {"id": "a", "prompt": "A?", "options": [{"label": "x"}],
                 "branches": [{"when": "ghost == 1", "goto": "done"}]}
            ]}"#,
        );
        let report = g.report();
        assert_eq!(report.dangling_condition_keys.len(), 1);
        assert_eq!(report.dangling_condition_keys[0].key, "ghost");
    }
}
