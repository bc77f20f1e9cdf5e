//! # Signing Service
//!
//! 受け取った文書を検証・正規化・署名し、署名済み文書を組み立てる。
//!
//! ## 処理の流れ
//! ```text
//! Received → Validating ─┬→ Rejected
//!                        └→ Canonicalizing → Signing ─┬→ Failed
//!                                                     └→ Assembling → Completed
//! ```
//! 各遷移は文書IDとともに`debug`レベルで記録する。
//! リトライ・部分的な結果・永続化は行わない。

use std::sync::Arc;

use dte_types::{Document, SignedDocument};

use crate::canonical::{canonicalize, decode_document};
use crate::clock::Clock;
use crate::error::SignError;
use crate::signer::Signer;
use crate::validation::Validator;

/// 署名処理の段階。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignStage {
    Received,
    Validating,
    Rejected,
    Canonicalizing,
    Signing,
    Failed,
    Assembling,
    Completed,
}

impl SignStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignStage::Received => "received",
            SignStage::Validating => "validating",
            SignStage::Rejected => "rejected",
            SignStage::Canonicalizing => "canonicalizing",
            SignStage::Signing => "signing",
            SignStage::Failed => "failed",
            SignStage::Assembling => "assembling",
            SignStage::Completed => "completed",
        }
    }
}

fn enter(stage: SignStage, document_id: &str) {
    tracing::debug!(document_id = %document_id, stage = stage.as_str(), "署名処理");
}

/// 署名サービス。`Arc`で共有して複数のリクエストから同時に呼び出せる。
pub struct SigningService {
    validator: Validator,
    signer: Arc<Signer>,
    clock: Arc<dyn Clock>,
}

impl SigningService {
    pub fn new(validator: Validator, signer: Arc<Signer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            validator,
            signer,
            clock,
        }
    }

    /// 鍵スロットへの参照。ローテーションに使用する。
    pub fn signer(&self) -> &Arc<Signer> {
        &self.signer
    }

    pub fn can_sign(&self) -> bool {
        self.signer.can_sign()
    }

    pub fn key_id(&self) -> Option<String> {
        self.signer.key_id()
    }

    /// 生のリクエストボディをデコードしてから署名する。
    pub fn sign_raw(&self, raw: &[u8]) -> Result<SignedDocument, SignError> {
        let document = decode_document(raw).inspect_err(|e| {
            tracing::debug!(stage = SignStage::Rejected.as_str(), reason = %e.reason, "デコードに失敗");
        })?;
        self.sign_document(document)
    }

    /// 文書に署名する。文書は変更されずに`SignedDocument`に格納される。
    pub fn sign_document(&self, document: Document) -> Result<SignedDocument, SignError> {
        let document_id = document.id.clone().unwrap_or_default();
        enter(SignStage::Received, &document_id);

        enter(SignStage::Validating, &document_id);
        if let Err(e) = self.validator.validate(&document) {
            enter(SignStage::Rejected, &document_id);
            tracing::info!(document_id = %document_id, field = %e.field, "文書を拒否しました");
            return Err(e.into());
        }

        enter(SignStage::Canonicalizing, &document_id);
        let canonical = canonicalize(&document).inspect_err(|_| {
            enter(SignStage::Rejected, &document_id);
        })?;

        enter(SignStage::Signing, &document_id);
        let signature = self.signer.sign(&canonical).inspect_err(|_| {
            enter(SignStage::Failed, &document_id);
        })?;

        enter(SignStage::Assembling, &document_id);
        let signed = SignedDocument {
            signature: signature.to_info(self.clock.now()),
            document,
        };

        enter(SignStage::Completed, &document_id);
        tracing::info!(document_id = %document_id, key_id = %signed.signature.key_id, "文書に署名しました");
        Ok(signed)
    }
}

impl std::fmt::Debug for SigningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningService")
            .field("validator", &self.validator)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
