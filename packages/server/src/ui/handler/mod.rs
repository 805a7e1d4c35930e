//! Handler modules for HTTP and WebSocket endpoints.

pub mod admin;
pub mod agent;
pub mod http;
mod session;
pub mod user;

// Re-export HTTP handlers
pub use http::{get_room_detail, get_rooms, health_check, welcome};

// Re-export WebSocket handlers
pub use admin::admin_ws_handler;
pub use agent::agent_ws_handler;
pub use user::user_ws_handler;
