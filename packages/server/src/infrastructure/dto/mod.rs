//! Data transfer objects for the wire (WebSocket frames, HTTP bodies).

pub mod http;
pub mod websocket;
