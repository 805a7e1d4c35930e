//! UseCase 層
//!
//! ルーティングの中核を実装するレイヤー。
//! UI 層（セッションハンドラ）から呼び出され、Domain 層を操作します。

pub mod error;
pub mod mirror;
pub mod registry;
pub mod router;

pub use error::{RegistryError, RouterError};
pub use mirror::StoreMirror;
pub use registry::{ConnectionRegistry, Outbox, Role};
pub use router::{Collaborators, Router, RouterSettings};
