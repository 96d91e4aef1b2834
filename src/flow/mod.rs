//! @acp:module "Question Flow"
//! @acp:summary "Onboarding flow table, branch predicates and structural lint"
//! @acp:domain flow
//! @acp:layer feature

pub mod condition;
pub mod graph;
pub mod loader;
pub mod report;
pub mod types;

pub use condition::{evaluate_condition, AnswerSet, Predicate, ResolvedAnswer};
pub use graph::{Branch, Progress, QuestionFlowGraph, Transition, Walk};
pub use loader::{load_builtin_flow, load_flow, load_flow_file, load_graph};
pub use report::{DanglingKey, FlowReport, MissingReference};
pub use types::*;
