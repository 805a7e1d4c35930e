//! Infrastructure 層
//!
//! ドメイン層が定義する port（RoomRepository / ChatStore / Notifier / Responder）の
//! 具体的な実装と、ワイヤーフォーマット（DTO）を提供します。

pub mod dto;
pub mod notifier;
pub mod repository;
pub mod responder;

pub use notifier::{LogNotifier, SmtpNotifier, SmtpSettings};
pub use repository::{InMemoryChatStore, InMemoryRoomRepository};
pub use responder::EchoResponder;
