//! # Validator
//!
//! 署名前の文書に対する整合性・業務ルールの検証。
//!
//! 検証は以下の順で行い、最初の失敗で打ち切る:
//! 1. 必須フィールドの存在（空白のみの文字列は欠落とみなす）
//! 2. 文書識別子の構文
//! 3. 明細行の算術（数量・単価の範囲、小計の総和と合計の一致）
//! 4. 発行日時が基準時計から見て未来でないこと
//!
//! 検証は読み取り専用で、副作用を持たない。

use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;

use dte_types::{Document, Party};

use crate::clock::Clock;
use crate::error::ValidationError;

/// 文書識別子の最大長。
pub const MAX_ID_LEN: usize = 64;

/// 文書の検証器。
#[derive(Clone)]
pub struct Validator {
    clock: Arc<dyn Clock>,
    max_clock_skew: Duration,
}

impl Validator {
    /// 許容する時計のずれをゼロとして検証器を構築する。
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_clock_skew(clock, Duration::zero())
    }

    /// `issued_at`が基準時刻より`max_clock_skew`だけ未来にあることを許容する。
    /// 負の値はゼロとして扱う。
    pub fn with_clock_skew(clock: Arc<dyn Clock>, max_clock_skew: Duration) -> Self {
        Self {
            clock,
            max_clock_skew: max_clock_skew.max(Duration::zero()),
        }
    }

    pub fn max_clock_skew(&self) -> Duration {
        self.max_clock_skew
    }

    /// 文書を検証する。
    pub fn validate(&self, document: &Document) -> Result<(), ValidationError> {
        check_required_fields(document)?;
        check_identifier(document)?;
        check_arithmetic(document)?;
        self.check_timestamp(document)
    }

    fn check_timestamp(&self, document: &Document) -> Result<(), ValidationError> {
        let Some(issued_at) = document.issued_at else {
            return Err(missing("issued_at"));
        };
        let now = self.clock.now();
        let limit = now.checked_add_signed(self.max_clock_skew).unwrap_or(now);
        if issued_at > limit {
            return Err(ValidationError::new(
                "issued_at",
                format!("発行日時が未来です（基準時刻: {}）", now.to_rfc3339()),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("max_clock_skew", &self.max_clock_skew)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Step 1: 必須フィールド
// ---------------------------------------------------------------------------

fn missing(field: &str) -> ValidationError {
    ValidationError::new(field, "必須フィールドがありません")
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_party(party: Option<&Party>, name: &str) -> Result<(), ValidationError> {
    let Some(party) = party else {
        return Err(missing(name));
    };
    if is_blank(&party.id) {
        return Err(missing(&format!("{name}.id")));
    }
    if is_blank(&party.name) {
        return Err(missing(&format!("{name}.name")));
    }
    Ok(())
}

fn check_required_fields(document: &Document) -> Result<(), ValidationError> {
    match document.id.as_deref() {
        Some(id) if !is_blank(id) => {}
        _ => return Err(missing("id")),
    }
    check_party(document.issuer.as_ref(), "issuer")?;
    check_party(document.recipient.as_ref(), "recipient")?;
    if document.items.is_empty() {
        return Err(ValidationError::new("items", "明細行が1件以上必要です"));
    }
    for (i, item) in document.items.iter().enumerate() {
        if is_blank(&item.description) {
            return Err(missing(&format!("items[{i}].description")));
        }
    }
    if document.total.is_none() {
        return Err(missing("total"));
    }
    if document.issued_at.is_none() {
        return Err(missing("issued_at"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Step 2: 識別子の構文
// ---------------------------------------------------------------------------

/// 英数字とハイフンからなり、先頭と末尾が英数字、ハイフンの連続を含まないこと。
pub fn is_valid_identifier(id: &str) -> bool {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return false;
    }
    if !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return false;
    }
    let bytes = id.as_bytes();
    let first_ok = bytes.first().is_some_and(u8::is_ascii_alphanumeric);
    let last_ok = bytes.last().is_some_and(u8::is_ascii_alphanumeric);
    first_ok && last_ok && !id.contains("--")
}

fn check_identifier(document: &Document) -> Result<(), ValidationError> {
    let id = document.id.as_deref().unwrap_or_default();
    if !is_valid_identifier(id) {
        return Err(ValidationError::new(
            "id",
            format!(
                "識別子は1〜{MAX_ID_LEN}文字の英数字とハイフンで、先頭と末尾は英数字である必要があります"
            ),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Step 3: 明細の算術
// ---------------------------------------------------------------------------

fn check_arithmetic(document: &Document) -> Result<(), ValidationError> {
    let mut sum = Decimal::ZERO;
    for (i, item) in document.items.iter().enumerate() {
        if item.quantity <= Decimal::ZERO {
            return Err(ValidationError::new(
                format!("items[{i}].quantity"),
                "数量は正の値である必要があります",
            ));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(ValidationError::new(
                format!("items[{i}].unit_price"),
                "単価は0以上である必要があります",
            ));
        }
        let overflow = || {
            ValidationError::new(format!("items[{i}]"), "金額が表現可能な範囲を超えています")
        };
        let subtotal = item.subtotal().ok_or_else(overflow)?;
        sum = sum.checked_add(subtotal).ok_or_else(overflow)?;
    }

    let Some(total) = document.total else {
        return Err(missing("total"));
    };
    if sum != total {
        return Err(ValidationError::new(
            "total",
            format!("合計 {total} が明細の小計の総和 {sum} と一致しません"),
        ));
    }
    Ok(())
}
