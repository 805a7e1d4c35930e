//! WebSocket and HTTP surface of the support chat router.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{build_app, run, serve};
