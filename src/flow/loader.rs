//! @acp:module "Flow Loader"
//! @acp:summary "Load and merge onboarding flows from built-in and project sources"
//! @acp:domain flow
//! @acp:layer io

use std::path::Path;

use crate::error::{Result, ThriveError};
use crate::schema;

use super::graph::QuestionFlowGraph;
use super::types::FlowDefinition;

/// Marker for project files layered over the built-in flow
pub const EXTENDS_BUILTIN: &str = "builtin";

/// Load a flow definition:
/// 1. Built-in onboarding flow when no path is given (or the file is absent)
/// 2. A standalone project flow
/// 3. A project flow with `"extends": "builtin"` merged over the built-in one
pub fn load_flow(path: Option<&Path>) -> Result<FlowDefinition> {
    let Some(path) = path else {
        return load_builtin_flow();
    };
    if !path.exists() {
        tracing::warn!("Flow file {:?} not found, using built-in flow", path);
        return load_builtin_flow();
    }

    let project = load_flow_file(path)?;
    if project.extends.as_deref() == Some(EXTENDS_BUILTIN) {
        merge_flows(load_builtin_flow()?, project)
    } else if let Some(other) = &project.extends {
        Err(ThriveError::Other(format!(
            "Unknown flow base '{}' in {:?}",
            other, path
        )))
    } else {
        Ok(project)
    }
}

/// Load and compile in one step
pub fn load_graph(path: Option<&Path>) -> Result<QuestionFlowGraph> {
    QuestionFlowGraph::from_definition(load_flow(path)?)
}

/// Built-in onboarding flow
pub fn load_builtin_flow() -> Result<FlowDefinition> {
    let json = include_str!("../../flows/onboarding.default.json");
    Ok(serde_json::from_str(json)?)
}

/// Read a JSON or YAML flow file, validating it against the flow schema
pub fn load_flow_file(path: &Path) -> Result<FlowDefinition> {
    let content = std::fs::read_to_string(path)?;
    let value = schema::validate_flow_str(&content, is_yaml(path))?;
    let flow: FlowDefinition = serde_json::from_value(value)?;
    tracing::debug!(path = ?path, nodes = flow.nodes.len(), "Loaded flow file");
    Ok(flow)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Merge a project overlay into a base flow
fn merge_flows(base: FlowDefinition, project: FlowDefinition) -> Result<FlowDefinition> {
    let mut result = base;

    // Nodes with a known id replace the base node in place
    for node in project.nodes {
        if let Some(existing) = result.nodes.iter_mut().find(|n| n.id == node.id) {
            *existing = node;
        } else {
            result.nodes.push(node);
        }
    }

    result.additional_nodes.extend(project.additional_nodes);

    for id in &project.disabled_nodes {
        if result.node(id).is_none() {
            tracing::warn!("Disabled node not found in flow: {}", id);
        }
    }
    result.disabled_nodes.extend(project.disabled_nodes);

    if !project.start.is_empty() {
        result.start = project.start;
    }
    if project.done != "done" {
        result.done = project.done;
    }
    if project.name.is_some() {
        result.name = project.name;
    }
    result.extends = None;

    Ok(result)
}
