//! @acp:module "Session"
//! @acp:summary "Resumable onboarding sessions persisted to local storage"
//! @acp:domain session
//! @acp:layer feature

pub mod answers;
pub mod store;
pub mod types;

pub use answers::AnswerStore;
pub use store::{
    load_state, save_state, Envelope, FileStore, KeyValueStore, MemoryStore,
    ONBOARDING_STORAGE_KEY,
};
pub use types::{AnswerRecord, Session};
