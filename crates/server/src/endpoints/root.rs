//! # GET /

/// 稼働確認用のバナー。
pub const BANNER: &str = "Up and running. Powered by Rust";

/// GET /: プレーンテキストのバナーを返す。
pub async fn handle_root() -> &'static str {
    BANNER
}
