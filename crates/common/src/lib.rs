//! Shared utilities, configuration, and error handling for AgentChat
//!
//! This crate provides common functionality used across the workspace:
//! - Configuration management following 12-factor principles
//! - Error types and the JSON error envelope
//! - Request extractors (validated JSON, pagination)
//! - State machine errors

pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
