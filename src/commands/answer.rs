//! @acp:module "Answer Command"
//! @acp:summary "Record answers and show the next question without the wizard"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::{anyhow, Result};
use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::flow::QuestionFlowGraph;

use super::open_session;

/// Options for the answer command
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    /// Question key or node id
    pub question: String,
    /// Zero-based option index
    pub option: usize,
    /// Record even when the key or index is unknown to the flow
    pub force: bool,
}

/// Options for the next command
#[derive(Debug, Clone, Default)]
pub struct NextOptions {
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NextOutput<'a> {
    node_id: &'a str,
    done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    options: Vec<&'a str>,
}

/// Execute the answer command
pub fn execute_answer(options: AnswerOptions, config: Config) -> Result<()> {
    let (graph, mut store) = open_session(&config)?;

    let node = graph
        .node_for_key(&options.question)
        .or_else(|| graph.node(&options.question));

    match node {
        Some(node) if !options.force => {
            let next = store.submit(&graph, &node.id, options.option)?;
            let label = &node.options[options.option].label;
            println!(
                "{} {}: {}",
                style("✓").green(),
                node.answer_key(),
                label
            );
            print_position(&graph, &next);
        }
        Some(node) => {
            store.record(node.answer_key(), options.option)?;
            println!(
                "{} Recorded {} = {} without validation",
                style("!").yellow(),
                node.answer_key(),
                options.option
            );
        }
        None if options.force => {
            store.record(&options.question, options.option)?;
            println!(
                "{} Recorded {} = {} (not asked by this flow)",
                style("!").yellow(),
                options.question,
                options.option
            );
        }
        None => {
            return Err(anyhow!(
                "No question '{}' in this flow (use --force to record it anyway)",
                options.question
            ));
        }
    }

    Ok(())
}

/// Execute the next command
pub fn execute_next(options: NextOptions, config: Config) -> Result<()> {
    let (graph, store) = open_session(&config)?;
    let target = store.first_unanswered(&graph)?;
    let node = graph.node(&target);

    if options.json {
        let output = NextOutput {
            node_id: &target,
            done: graph.is_terminal(&target),
            key: node.filter(|n| n.is_question()).map(|n| n.answer_key()),
            prompt: node.map(|n| n.prompt.as_str()),
            options: node
                .map(|n| n.options.iter().map(|o| o.label.as_str()).collect())
                .unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_position(&graph, &target);
    Ok(())
}

fn print_position(graph: &QuestionFlowGraph, node_id: &str) {
    if graph.is_terminal(node_id) {
        println!(
            "{} All questions answered. Run {} to see your ThriveScore.",
            style("✓").green(),
            style("thrive score").cyan()
        );
        return;
    }

    let Some(node) = graph.node(node_id) else {
        println!(
            "{} Next step '{}' is not defined in this flow",
            style("⚠").yellow(),
            node_id
        );
        return;
    };

    println!("\n{} {}", style("→").cyan(), style(&node.prompt).bold());
    if node.is_question() {
        for (i, option) in node.options.iter().enumerate() {
            println!("  [{}] {}", i, option.label);
        }
        println!(
            "\n  {}",
            style(format!("thrive answer {} <index>", node.answer_key())).dim()
        );
    }
}
