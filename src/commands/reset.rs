//! @acp:module "Reset Command"
//! @acp:summary "Destroy the stored onboarding session"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::config::Config;

use super::open_session;

/// Options for the reset command
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// Skip the confirmation prompt
    pub yes: bool,
}

/// Execute the reset command
pub fn execute_reset(options: ResetOptions, config: Config) -> Result<()> {
    let (graph, mut store) = open_session(&config)?;

    if !store.session().been_here_before {
        println!("{} No stored session to reset", style("!").yellow());
        return Ok(());
    }

    if !options.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Discard {} recorded answers and start over?",
                store.answers().len()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{} Kept existing session", style("✓").green());
            return Ok(());
        }
    }

    store.reset(&graph)?;
    println!("{} Session reset", style("↩").yellow());
    Ok(())
}
