//! # 文書モデル: デコードと正規化
//!
//! 署名の入力となる正規化バイト列（CanonicalForm）を生成する。
//!
//! ## 正規化規則 (`dte-canonical/v1`)
//! - 空白なしのJSON、キーは辞書順
//! - 金額は正規化したDecimalの文字列（`20.00`と`20`は同一）
//! - 日時はRFC 3339（UTC、`Z`表記、端数秒は必要な場合のみ）
//! - `schema`フィールドに規則のバージョンを含める
//!
//! 正規化は純粋関数であり、時刻や乱数を持ち込まない。

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use dte_types::{Document, Party};

use crate::error::MalformedDocument;

/// 正規化規則の識別子。
pub const CANONICAL_SCHEMA: &str = "dte-canonical/v1";

/// 文書の正規化バイト列。署名の入力そのもの。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm(Vec<u8>);

impl CanonicalForm {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// 正規化バイト列のSHA-256（hex）。
    pub fn digest_hex(&self) -> String {
        dte_crypto::sha256_hex(&self.0)
    }
}

/// リクエストボディ（JSON）を文書にデコードする。
///
/// 不正なJSON、型の不一致、未知のフィールド、不完全な明細行は`MalformedDocument`。
pub fn decode_document(raw: &[u8]) -> Result<Document, MalformedDocument> {
    serde_json::from_slice(raw)
        .map_err(|e| MalformedDocument::new(format!("JSONのデコードに失敗: {e}")))
}

/// 文書を正規化する。
///
/// 必須項目の欠落（明細があるのに合計がない等）は`MalformedDocument`。
/// 文字列の空白チェックや金額の整合性はValidatorの責務であり、ここでは見ない。
pub fn canonicalize(document: &Document) -> Result<CanonicalForm, MalformedDocument> {
    let id = document
        .id
        .as_deref()
        .ok_or_else(|| MalformedDocument::missing("id"))?;
    let issuer = document
        .issuer
        .as_ref()
        .ok_or_else(|| MalformedDocument::missing("issuer"))?;
    let recipient = document
        .recipient
        .as_ref()
        .ok_or_else(|| MalformedDocument::missing("recipient"))?;
    if document.items.is_empty() {
        return Err(MalformedDocument::missing("items"));
    }
    let total = document.total.ok_or_else(|| {
        MalformedDocument::new("明細行がありますがtotalがありません")
    })?;
    let issued_at = document
        .issued_at
        .ok_or_else(|| MalformedDocument::missing("issued_at"))?;

    let items: Vec<serde_json::Value> = document
        .items
        .iter()
        .map(|item| {
            json!({
                "description": item.description,
                "quantity": decimal_string(item.quantity),
                "unit_price": decimal_string(item.unit_price),
            })
        })
        .collect();

    // キーは辞書順で記述する（serde_jsonのMap実装に依存しない）
    let canonical = json!({
        "id": id,
        "issued_at": timestamp_string(&issued_at),
        "issuer": party_value(issuer),
        "items": items,
        "recipient": party_value(recipient),
        "schema": CANONICAL_SCHEMA,
        "total": decimal_string(total),
    });

    let bytes = serde_json::to_vec(&canonical)
        .map_err(|e| MalformedDocument::new(format!("正規化に失敗: {e}")))?;
    Ok(CanonicalForm(bytes))
}

fn party_value(party: &Party) -> serde_json::Value {
    json!({
        "id": party.id,
        "name": party.name,
    })
}

fn decimal_string(value: Decimal) -> String {
    value.normalize().to_string()
}

fn timestamp_string(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::valid_document;
    use std::str::FromStr;

    #[test]
    fn test_canonicalize_is_deterministic() {
        let doc = valid_document("A-1");
        let a = canonicalize(&doc).unwrap();
        let b = canonicalize(&doc).unwrap();
        let c = canonicalize(&doc.clone()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_canonical_bytes_layout() {
        let doc = valid_document("A-1");
        let canonical = canonicalize(&doc).unwrap();
        let text = std::str::from_utf8(canonical.as_bytes()).unwrap();

        assert_eq!(
            text,
            r#"{"id":"A-1","issued_at":"2026-01-15T10:30:00Z","issuer":{"id":"0614-010101-101-1","name":"X"},"items":[{"description":"a","quantity":"2","unit_price":"10"}],"recipient":{"id":"0614-020202-102-2","name":"Y"},"schema":"dte-canonical/v1","total":"20"}"#
        );
    }

    /// 数値として等しい金額は同一のバイト列になる
    #[test]
    fn test_equal_decimals_encode_identically() {
        let mut a = valid_document("A-1");
        let mut b = valid_document("A-1");
        a.total = Some(Decimal::from_str("20.00").unwrap());
        b.total = Some(Decimal::from_str("20").unwrap());
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    /// いずれかのフィールドが異なれば正規化バイト列も異なる
    #[test]
    fn test_distinct_documents_encode_differently() {
        let base = valid_document("A-1");
        let base_bytes = canonicalize(&base).unwrap();

        let mut variants = Vec::new();

        let mut d = base.clone();
        d.id = Some("A-2".into());
        variants.push(d);

        let mut d = base.clone();
        d.issuer.as_mut().unwrap().name = "X2".into();
        variants.push(d);

        let mut d = base.clone();
        d.issuer.as_mut().unwrap().id = "0614-010101-101-9".into();
        variants.push(d);

        let mut d = base.clone();
        d.recipient.as_mut().unwrap().name = "Y2".into();
        variants.push(d);

        let mut d = base.clone();
        d.items[0].description = "b".into();
        variants.push(d);

        let mut d = base.clone();
        d.items[0].quantity = Decimal::from(3);
        variants.push(d);

        let mut d = base.clone();
        d.items[0].unit_price = Decimal::from_str("10.01").unwrap();
        variants.push(d);

        let mut d = base.clone();
        d.total = Some(Decimal::from_str("20.01").unwrap());
        variants.push(d);

        let mut d = base.clone();
        d.issued_at = Some(base.issued_at.unwrap() + chrono::Duration::milliseconds(1));
        variants.push(d);

        // 明細の順序も署名対象
        let mut d = base.clone();
        d.items.push(dte_types::LineItem {
            description: "z".into(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
        });
        let mut swapped = d.clone();
        swapped.items.swap(0, 1);
        let d_bytes = canonicalize(&d).unwrap();
        assert_ne!(d_bytes, canonicalize(&swapped).unwrap());
        variants.push(d);

        // 発行者と受領者の入れ替え
        let mut d = base.clone();
        std::mem::swap(&mut d.issuer, &mut d.recipient);
        variants.push(d);

        for variant in &variants {
            assert_ne!(canonicalize(variant).unwrap(), base_bytes, "{variant:?}");
        }
    }

    /// 文字列中の引用符や区切り文字でフィールド境界が曖昧にならない
    #[test]
    fn test_string_escaping_keeps_fields_distinct() {
        let mut a = valid_document("A-1");
        let mut b = valid_document("A-1");
        a.issuer.as_mut().unwrap().name = r#"X","name":"Z"#.into();
        b.issuer.as_mut().unwrap().name = "Z".into();
        assert_ne!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn test_missing_total_with_items_is_malformed() {
        let mut doc = valid_document("A-1");
        doc.total = None;
        let err = canonicalize(&doc).unwrap_err();
        assert!(err.reason.contains("total"));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let mut doc = valid_document("A-1");
        doc.id = None;
        assert!(canonicalize(&doc).is_err());

        let mut doc = valid_document("A-1");
        doc.recipient = None;
        assert!(canonicalize(&doc).is_err());

        let mut doc = valid_document("A-1");
        doc.items.clear();
        assert!(canonicalize(&doc).is_err());

        let mut doc = valid_document("A-1");
        doc.issued_at = None;
        assert!(canonicalize(&doc).is_err());
    }

    #[test]
    fn test_decode_document_rejects_bad_input() {
        assert!(decode_document(b"not json").is_err());
        assert!(decode_document(br#"{"id": 5}"#).is_err());
        // 明細行の数量欠落
        assert!(decode_document(br#"{"items": [{"description": "a", "unit_price": "1"}]}"#).is_err());
        assert!(decode_document(br#"{"id": "A-1", "extra": true}"#).is_err());
    }

    #[test]
    fn test_digest_matches_sha256_of_bytes() {
        let canonical = canonicalize(&valid_document("A-1")).unwrap();
        assert_eq!(
            canonical.digest_hex(),
            dte_crypto::sha256_hex(canonical.as_bytes())
        );
    }
}
