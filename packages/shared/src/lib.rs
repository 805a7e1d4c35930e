//! Shared utilities for Handoff binaries and tests.

pub mod logger;
pub mod time;
