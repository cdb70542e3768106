//! REST endpoint integration tests
//!
//! Drives the fully composed router with `oneshot` requests.

#![allow(dead_code)]

mod ai;
mod chat;
mod common;
mod conversations;
mod health;
