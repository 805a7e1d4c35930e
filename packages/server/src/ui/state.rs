//! Shared application state.

use std::sync::Arc;

use crate::usecase::Router;

/// Shared application state
pub struct AppState {
    /// ルーティングの中核（ルーム表と接続レジストリを所有）
    pub router: Arc<Router>,
}

impl AppState {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}
