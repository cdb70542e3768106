//! Conversations domain: chat pipeline, conversation threads, messages

pub mod api;
pub mod domain;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{derive_title, Conversation, Message, MessageRole};
pub use domain::pipeline::{Pipeline, PipelineStage, StateError};

// Re-export repository types
#[cfg(any(test, feature = "test-support"))]
pub use repository::InMemoryMessageStore;
pub use repository::{MessageStore, PgMessageStore};

// Re-export service types
pub use service::{
    ChatOrchestrator, ChatReply, ChatRequest, History, ModelCatalog, ModelSnapshot, NO_MODEL,
    SERVICE_UNAVAILABLE,
};

// Re-export API types
pub use api::routes::routes;
pub use api::ConversationsState;
