#![forbid(unsafe_code)]

//! @acp:module "Thrive Library"
//! @acp:summary "Onboarding question flow, resumable sessions and ThriveScore"
//! @acp:domain core
//! @acp:layer api
//! @acp:stability stable
//!
//! # Thrive - Onboarding Engine
//!
//! Runs the senior-care onboarding questionnaire and turns its answers into
//! a single 0-100 ThriveScore.
//!
//! ## Features
//!
//! - **Flow Table**: Declarative question graph with predicate redirects
//! - **Resumable Sessions**: Answers persisted after every submit
//! - **ThriveScore**: Baseline minus the deductions of selected options
//! - **Flow Lint**: Missing and unreachable nodes reported, never guessed
//!
//! ## Example
//!
//! ```rust,no_run
//! use thrive::{load_graph, AnswerStore, FileStore};
//!
//! fn main() -> anyhow::Result<()> {
//!     let graph = load_graph(None)?;
//!     let mut store = AnswerStore::open(FileStore::new(".thrive"), "onboarding-storage", &graph)?;
//!
//!     store.submit(&graph, "vision", 3)?;
//!     store.submit(&graph, "mobility-aids", 2)?;
//!
//!     println!("Resume at {}", store.first_unanswered(&graph)?);
//!     println!("ThriveScore {}", store.score(&graph));
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod flow;
pub mod schema;
pub mod score;
pub mod session;

// Re-exports
pub use config::Config;
pub use error::{Result, ThriveError};
pub use flow::{
    load_flow, load_graph, AnswerOption, FlowDefinition, FlowReport, Predicate, QuestionFlowGraph,
    QuestionNode,
};
pub use score::{score, ScoreAccumulator, ScoreBand, ScoreBreakdown};
pub use session::{AnswerRecord, AnswerStore, FileStore, KeyValueStore, MemoryStore, Session};
