//! @acp:module "Flow Command"
//! @acp:summary "Inspect and lint onboarding flows"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::flow::{load_flow, QuestionFlowGraph};

/// Flow subcommands
#[derive(Debug, Clone)]
pub enum FlowSubcommand {
    /// List nodes and their transitions
    Show { json: bool },
    /// Lint a flow file (configured flow when `file` is None)
    Validate { file: Option<PathBuf>, json: bool },
}

/// Execute flow subcommands
pub fn execute_flow(cmd: FlowSubcommand, config: Config) -> Result<()> {
    match cmd {
        FlowSubcommand::Show { json } => {
            let graph = compile(config.flow_path())?;
            if json {
                println!("{}", serde_json::to_string_pretty(graph.definition())?);
                return Ok(());
            }
            show(&graph);
        }

        FlowSubcommand::Validate { file, json } => {
            let path = file.or_else(|| config.flow_path());
            let graph = compile(path.clone())?;
            let report = graph.report();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let source = path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "built-in flow".to_string());
                println!(
                    "{} {} compiled: {} nodes, {} questions",
                    style("✓").green(),
                    source,
                    report.node_count,
                    report.question_count
                );
                for missing in &report.missing {
                    println!(
                        "  {} {} -> {} (not defined)",
                        style("✗").red(),
                        missing.from,
                        missing.target
                    );
                }
                for id in &report.unreachable {
                    println!("  {} {} (unreachable from start)", style("⚠").yellow(), id);
                }
                for dangling in &report.dangling_condition_keys {
                    println!(
                        "  {} {} reads '{}' which no question records",
                        style("⚠").yellow(),
                        dangling.node,
                        dangling.key
                    );
                }
            }

            if !report.is_clean() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn compile(path: Option<PathBuf>) -> Result<QuestionFlowGraph> {
    let definition = load_flow(path.as_deref())
        .with_context(|| format!("Failed to load flow {:?}", path))?;
    Ok(QuestionFlowGraph::from_definition(definition)?)
}

fn show(graph: &QuestionFlowGraph) {
    println!(
        "{} ({} nodes, start {}, done {}):\n",
        style(graph.name().unwrap_or("Onboarding flow")).bold(),
        graph.nodes().len(),
        style(graph.start()).cyan(),
        style(graph.done()).cyan()
    );

    for node in graph.nodes() {
        let kind = if node.is_question() {
            format!("{} options", node.options.len())
        } else {
            "info".to_string()
        };
        println!(
            "  {:28} {:20} {}",
            node.id,
            style(if node.is_question() { node.answer_key() } else { "-" }).dim(),
            kind
        );

        let targets = node.targets();
        if let Some(transition) = graph.transition(&node.id) {
            println!("    {} {}", style("→").dim(), transition.default);
            for branch in &transition.branches {
                println!(
                    "    {} {} when {}",
                    style("↳").yellow(),
                    branch.target,
                    branch.predicate.source()
                );
            }
        }
        for target in targets {
            if graph.node(target).is_none() && !graph.is_terminal(target) {
                println!("    {} {} is not defined", style("✗").red(), target);
            }
        }
    }
}
