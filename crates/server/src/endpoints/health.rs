//! # GET /health

use axum::Json;
use dte_types::HealthResponse;

/// サービス名。
pub const SERVICE_NAME: &str = "dte-server";

/// GET /health: ヘルスチェック。
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
