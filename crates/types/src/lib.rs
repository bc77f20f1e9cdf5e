//! # DTE 共有型定義
//!
//! 署名対象のDTE（Documento Tributario Electrónico）と、署名結果・HTTP APIで
//! やり取りするデータ構造をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - 金額: 固定小数点（`rust_decimal::Decimal`）。JSONでは文字列を推奨（数値も受理）。
//!   数値は`serde_json`の`arbitrary_precision`により文字列表現のまま`Decimal`に変換され、
//!   浮動小数点を経由しない
//! - 日時: RFC 3339（UTC）
//! - Base64: バイナリデータ（署名、公開鍵）
//! - Hex: ダイジェスト、鍵識別子

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DTE 本体
// ---------------------------------------------------------------------------

/// 署名対象の電子税務文書。
///
/// トップレベルの各フィールドはワイヤ上で欠落し得るため`Option`で保持する。
/// 欠落はValidator（必須項目チェック）または正規化処理で検出される。
/// 未知のフィールドは受理しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// 文書識別子（発行者ごとに一意）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 発行者
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Party>,
    /// 受領者
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Party>,
    /// 明細行（順序を保持する）
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// 合計金額（明細小計の総和と一致すること）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    /// 発行日時（UTC）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

/// 発行者・受領者の識別情報。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Party {
    /// 税務識別番号（NIT/DUI等）
    #[serde(default)]
    pub id: String,
    /// 名称
    #[serde(default)]
    pub name: String,
}

/// 明細行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineItem {
    /// 品目説明
    #[serde(default)]
    pub description: String,
    /// 数量
    pub quantity: Decimal,
    /// 単価
    pub unit_price: Decimal,
}

impl LineItem {
    /// 小計（数量 × 単価）。固定小数点で厳密に計算する。
    /// 表現可能な範囲を超える場合は`None`。
    pub fn subtotal(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }
}

// ---------------------------------------------------------------------------
// 署名結果
// ---------------------------------------------------------------------------

/// 正規化バイト列に対する署名とそのメタデータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// 署名アルゴリズム識別子 ("Ed25519")
    pub algorithm: String,
    /// 署名鍵の識別子（公開鍵SHA-256の先頭8バイトのhex）
    pub key_id: String,
    /// 署名日時
    pub signed_at: DateTime<Utc>,
    /// Base64エンコードされたEd25519公開鍵
    pub public_key: String,
    /// 正規化バイト列のSHA-256（hex）
    pub digest: String,
    /// Base64エンコードされた署名値
    pub value: String,
}

/// 署名済みDTE。呼び出し元に返却される単位。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDocument {
    /// 署名対象となった文書（受け取ったまま変更しない）
    pub document: Document,
    /// 署名
    pub signature: SignatureInfo,
}

// ---------------------------------------------------------------------------
// HTTP API ボディ
// ---------------------------------------------------------------------------

/// 検証エラー時のレスポンスボディ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    /// 問題のあるフィールド（例: "total", "items[0].quantity"）
    pub field: String,
    /// 理由
    pub reason: String,
}

/// 汎用エラーレスポンスボディ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// エラー種別 ("malformed_document", "signing_failed")
    pub error: String,
    /// 詳細（クライアント起因のエラーのみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// GET /api/v1/dte/can-sign レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanSignResponse {
    /// 署名鍵がロード済みか
    pub can_sign: bool,
    /// ロード済み鍵の識別子
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// GET /health レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok"
    pub status: String,
    /// サービス名
    pub service: String,
    /// バージョン
    pub version: String,
}
