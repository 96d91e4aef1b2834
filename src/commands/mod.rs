//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Provides implementations for all CLI commands.
//! Each command is in its own submodule for maintainability.

pub mod answer;
pub mod flow;
pub mod init;
pub mod reset;
pub mod start;
pub mod status;

pub use answer::{execute_answer, execute_next, AnswerOptions, NextOptions};
pub use flow::{execute_flow, FlowSubcommand};
pub use init::{execute_init, InitOptions};
pub use reset::{execute_reset, ResetOptions};
pub use start::{execute_start, StartOptions};
pub use status::{execute_score, execute_status, ScoreOptions, StatusOptions};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::flow::{load_graph, QuestionFlowGraph};
use crate::session::{AnswerStore, FileStore};

/// Compile the configured flow and open the configured session
pub(crate) fn open_session(
    config: &Config,
) -> Result<(QuestionFlowGraph, AnswerStore<FileStore>)> {
    let flow_path = config.flow_path();
    let graph = load_graph(flow_path.as_deref())
        .with_context(|| match &flow_path {
            Some(p) => format!("Failed to load flow from {:?}", p),
            None => "Failed to load built-in flow".to_string(),
        })?;
    let store = AnswerStore::open(config.file_store(), config.session_key.clone(), &graph)
        .with_context(|| format!("Failed to open session '{}'", config.session_key))?
        .with_accumulator(config.accumulator());
    Ok((graph, store))
}
