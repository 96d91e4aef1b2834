//! @acp:module "Status Command"
//! @acp:summary "Session summary and ThriveScore report"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::score::{band_for, render_report, ReportFormat};

use super::open_session;

/// Options for the status command
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub json: bool,
}

/// Options for the score command
#[derive(Debug, Clone, Default)]
pub struct ScoreOptions {
    /// Overrides the configured report format
    pub format: Option<ReportFormat>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput {
    session_id: String,
    been_here_before: bool,
    answered: usize,
    questions: usize,
    current_node_id: String,
    resume_node_id: String,
    path: Vec<String>,
    complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_score: Option<u8>,
    score: u8,
    flow_changed: bool,
}

/// Execute the status command
pub fn execute_status(options: StatusOptions, config: Config) -> Result<()> {
    let (graph, store) = open_session(&config)?;
    let session = store.session();
    let walk = graph.walk(store.answers())?;

    let output = StatusOutput {
        session_id: session.id.to_string(),
        been_here_before: session.been_here_before,
        answered: session.answers.len(),
        questions: graph.nodes().iter().filter(|n| n.is_question()).count(),
        current_node_id: session.current_node_id.clone(),
        resume_node_id: walk.stop.clone(),
        path: walk.path,
        complete: session.is_complete(),
        final_score: session.final_score,
        score: store.score(&graph),
        flow_changed: session
            .flow_fingerprint
            .as_deref()
            .is_some_and(|fp| fp != graph.fingerprint()),
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", style("Onboarding Session:").bold());
    println!("  Session:   {}", style(&output.session_id).dim());
    println!(
        "  Answered:  {} of {} questions",
        output.answered, output.questions
    );
    println!("  Current:   {}", output.current_node_id);
    if graph.is_terminal(&output.resume_node_id) {
        println!("  Resume:    {}", style("complete").green());
    } else {
        println!("  Resume:    {}", style(&output.resume_node_id).cyan());
    }
    match output.final_score {
        Some(final_score) => println!("  Score:     {} (final)", style(final_score).bold()),
        None => println!("  Score:     {} (so far)", output.score),
    }
    if output.flow_changed {
        println!(
            "  {} The flow changed since this session started",
            style("⚠").yellow()
        );
    }

    Ok(())
}

/// Execute the score command
pub fn execute_score(options: ScoreOptions, config: Config) -> Result<()> {
    let (graph, store) = open_session(&config)?;
    let format = options.format.unwrap_or_else(|| config.report_format());

    let breakdown = config.accumulator().breakdown(store.answers(), &graph);
    let band = band_for(breakdown.score, &config.bands);

    println!("{}", render_report(&breakdown, band, format)?);
    if format != ReportFormat::Json && !store.session().is_complete() {
        println!(
            "\n{} Onboarding is not finished yet; the score may still change",
            style("!").yellow()
        );
    }

    Ok(())
}
