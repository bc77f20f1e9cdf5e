//! # /api/v1/dte
//!
//! リクエストボディのデコード・検証・署名はすべて`SigningService`に委ね、
//! ここでは結果をHTTPレスポンスに対応付けるだけを行う。

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use dte_types::{CanSignResponse, SignedDocument};

use crate::config::AppState;
use crate::error::ApiError;

/// POST /api/v1/dte: DTEに署名する。
///
/// ボディは生のバイト列として受け取り、JSONとして不正な場合も
/// `malformed_document`で応答する。
pub async fn handle_sign(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SignedDocument>, ApiError> {
    let signed = state.service.sign_raw(&body)?;
    Ok(Json(signed))
}

/// GET /api/v1/dte/can-sign: 署名鍵がロード済みかを返す。
pub async fn handle_can_sign(State(state): State<Arc<AppState>>) -> Json<CanSignResponse> {
    let key_id = state.service.key_id();
    Json(CanSignResponse {
        can_sign: key_id.is_some(),
        key_id,
    })
}
