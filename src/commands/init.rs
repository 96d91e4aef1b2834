//! @acp:module "Init Command"
//! @acp:summary "Initialize onboarding configuration"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `thrive init` command for project initialization.

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use crate::config::{Config, CONFIG_FILE};
use crate::flow::load_graph;

/// Options for the init command
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Config file to write
    pub config_path: Option<PathBuf>,
    /// Force overwrite existing config
    pub force: bool,
    /// Session storage directory
    pub storage_dir: Option<PathBuf>,
    /// Custom flow file
    pub flow: Option<PathBuf>,
    /// Skip interactive prompts
    pub yes: bool,
}

/// Execute the init command
pub fn execute_init(options: InitOptions) -> Result<()> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    if config_path.exists() && !options.force {
        eprintln!(
            "{} Config file already exists. Use --force to overwrite.",
            style("✗").red()
        );
        std::process::exit(1);
    }

    let mut config = Config::default();

    let interactive = !options.yes && options.storage_dir.is_none() && options.flow.is_none();
    if interactive {
        run_interactive_init(&mut config)?;
    } else {
        if let Some(dir) = options.storage_dir {
            config.storage_dir = dir;
        }
        config.flow = options.flow;
    }

    // Fail early on a flow that will not compile
    let graph = load_graph(config.flow_path().as_deref())?;
    let report = graph.report();
    if !report.is_clean() {
        println!(
            "{} Flow has {} missing and {} unreachable nodes; run {} for details",
            style("⚠").yellow(),
            report.missing.len(),
            report.unreachable.len(),
            style("thrive flow validate").cyan()
        );
    }

    let storage = config.storage_path();
    if !storage.exists() {
        std::fs::create_dir_all(&storage)?;
        println!("{} Created {}", style("✓").green(), storage.display());
    }

    config.save(&config_path)?;
    println!("{} Created {}", style("✓").green(), config_path.display());

    println!("\n{}", style("Next steps:").bold());
    println!("  1. Run {} to begin onboarding", style("thrive start").cyan());
    println!("  2. Run {} to see your ThriveScore", style("thrive score").cyan());

    Ok(())
}

fn run_interactive_init(config: &mut Config) -> Result<()> {
    println!("{} Thrive Onboarding Setup\n", style("→").cyan());

    let storage: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Where should sessions be stored?")
        .default(config.storage_dir.display().to_string())
        .interact_text()?;
    config.storage_dir = PathBuf::from(storage);

    let custom_flow = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Use a custom flow file instead of the built-in questionnaire?")
        .default(false)
        .interact()?;

    if custom_flow {
        let path: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Flow file (JSON or YAML)")
            .interact_text()?;
        config.flow = Some(PathBuf::from(path));
    }

    Ok(())
}
