//! Support chat router library.
//!
//! Routes user, agent and admin WebSocket traffic between chat rooms,
//! answers users with an automated responder, and escalates conversations
//! to human agents.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry point
pub use ui::run as run_server;
