//! # エンドポイント
//!
//! - `GET /`: 稼働確認用のバナー
//! - `GET /health`: ヘルスチェック
//! - `POST /api/v1/dte`: DTEへの署名
//! - `GET /api/v1/dte/can-sign`: 署名鍵のロード状況

pub mod dte;
pub mod health;
pub mod root;

use std::sync::Arc;

use axum::routing::{get, post};

use crate::config::AppState;

pub use dte::{handle_can_sign, handle_sign};
pub use health::handle_health;
pub use root::handle_root;

/// ルーターを構築する。
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/api/v1/dte", post(handle_sign))
        .route("/api/v1/dte/can-sign", get(handle_can_sign))
        .with_state(state)
}
