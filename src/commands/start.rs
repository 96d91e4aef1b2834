//! @acp:module "Start Command"
//! @acp:summary "Interactive onboarding wizard with resume support"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::{anyhow, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::flow::QuestionNode;
use crate::score::{band_for, render_report, ReportFormat};

use super::open_session;

/// Options for the start command
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Discard the stored session first
    pub restart: bool,
}

/// Execute the start command
pub fn execute_start(options: StartOptions, config: Config) -> Result<()> {
    let (graph, mut store) = open_session(&config)?;

    if options.restart {
        store.reset(&graph)?;
        println!("{} Starting over", style("↩").yellow());
    } else if store.session().been_here_before {
        println!(
            "{} Welcome back! Picking up where you left off ({} answered)",
            style("→").cyan(),
            store.answers().len()
        );
    }

    let mut current = store.resume(&graph)?;
    store.save()?;

    let total = graph.nodes().iter().filter(|n| n.is_question()).count() as u64;
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{prefix:.cyan} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut section: Option<String> = None;

    while !graph.is_terminal(&current) {
        let node = graph.node(&current).ok_or_else(|| {
            anyhow!(
                "Flow points at '{}' which is not defined; run `thrive flow validate`",
                current
            )
        })?;

        if let Some(progress) = graph.progress(&node.id) {
            bar.set_position(progress.position.saturating_sub(1) as u64);
            if let Some(index) = progress.section_index {
                bar.set_prefix(format!("Section {}/{}", index, progress.section_count));
            }
        }
        if node.section.is_some() && node.section != section {
            section = node.section.clone();
            if let Some(title) = &section {
                bar.set_message(title.clone());
                bar.suspend(|| println!("\n{}", style(title).bold()));
            }
        }

        let step = if node.is_question() {
            let default = store
                .session()
                .answer(node.answer_key())
                .map(|a| a.selected_option_index)
                .filter(|&i| i < node.options.len())
                .unwrap_or(0);
            match bar.suspend(|| ask_question(node, default))? {
                Some(choice) => Some(store.submit(&graph, &node.id, choice)?),
                None => None,
            }
        } else {
            match bar.suspend(|| show_info(node))? {
                true => Some(store.advance(&graph)?),
                false => None,
            }
        };

        match step {
            Some(next) => current = next,
            None => {
                bar.abandon();
                println!(
                    "\n{} Progress saved. Run {} to continue.",
                    style("✓").green(),
                    style("thrive start").cyan()
                );
                return Ok(());
            }
        }
    }

    bar.finish_and_clear();

    let breakdown = config
        .accumulator()
        .breakdown(store.answers(), &graph);
    let band = band_for(breakdown.score, &config.bands);
    println!(
        "\n{} {}",
        style("✓").green(),
        render_report(&breakdown, band, ReportFormat::Text)?
    );

    Ok(())
}

/// `None` when the user backs out with Esc/q
fn ask_question(node: &QuestionNode, default: usize) -> Result<Option<usize>> {
    if let Some(description) = &node.description {
        println!("{}", style(description).dim());
    }
    let labels: Vec<&str> = node.options.iter().map(|o| o.label.as_str()).collect();
    Ok(Select::with_theme(&ColorfulTheme::default())
        .with_prompt(&node.prompt)
        .items(&labels)
        .default(default)
        .interact_opt()?)
}

fn show_info(node: &QuestionNode) -> Result<bool> {
    println!("{}", node.prompt);
    if let Some(description) = &node.description {
        println!("{}", style(description).dim());
    }
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Continue?")
        .default(true)
        .interact_opt()?
        .unwrap_or(false))
}
