//! # DTE署名のエラー分類
//!
//! | エラー | 原因 | 呼び出し元の責任 |
//! |--------|------|------------------|
//! | `MalformedDocument` | 構造的に利用できない入力 | あり |
//! | `ValidationError` | 業務ルール違反（フィールドを特定） | あり |
//! | `SigningFailure` | 鍵の不在・暗号処理の失敗 | なし |
//!
//! いずれもコア内部でリトライ・握りつぶしはせず、そのまま呼び出し元に返す。

/// 構造的に不正な文書（デコード失敗、必須項目の欠落、構造の不整合）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("文書の構造が不正です: {reason}")]
pub struct MalformedDocument {
    /// 不正の内容
    pub reason: String,
}

impl MalformedDocument {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// 必須フィールド欠落。
    pub(crate) fn missing(field: &str) -> Self {
        Self::new(format!("{field}がありません"))
    }
}

/// 業務ルール違反。問題のフィールドを特定する。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("検証エラー ({field}): {reason}")]
pub struct ValidationError {
    /// 問題のあるフィールド（例: "total", "items[0].quantity"）
    pub field: String,
    /// 理由
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 署名処理の失敗。
///
/// 表示文字列には鍵素材・内部の原因を含めない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SigningFailure {
    /// 署名鍵がロードされていない
    #[error("署名鍵が利用できません")]
    KeyUnavailable,
    /// 署名プリミティブがエラーを返した
    #[error("署名処理に失敗しました")]
    Primitive,
}

/// `SigningService`が返すエラー。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    Malformed(#[from] MalformedDocument),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Signing(#[from] SigningFailure),
}

/// 署名済み文書の検証エラー。
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// 文書を正規化できない
    #[error(transparent)]
    Malformed(#[from] MalformedDocument),
    /// 未対応の署名アルゴリズム
    #[error("未対応の署名アルゴリズムです: {0}")]
    UnsupportedAlgorithm(String),
    /// 正規化バイト列のダイジェストが一致しない
    #[error("ダイジェストが文書と一致しません")]
    DigestMismatch,
    /// 公開鍵・鍵識別子が期待と一致しない
    #[error("署名鍵が一致しません")]
    KeyMismatch,
    /// 公開鍵・署名のエンコードが不正、または署名が不正
    #[error(transparent)]
    Crypto(#[from] dte_crypto::CryptoError),
}
