//! Conversations domain model

pub mod entities;
pub mod pipeline;
