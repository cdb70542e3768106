//! Chat services: model catalog, request orchestration and conversation CRUD

pub mod catalog;
pub mod orchestrator;

pub use catalog::{ModelCatalog, ModelSnapshot, NO_MODEL, PREFERRED_MODELS};
pub use orchestrator::{ChatOrchestrator, ChatReply, ChatRequest, History, SERVICE_UNAVAILABLE};
