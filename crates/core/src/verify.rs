//! # 署名済み文書の検証
//!
//! 文書から正規化バイト列を再計算し、ダイジェストと署名値を照合する。
//! 文書の一部でも変更されていれば検証は失敗する。

use dte_crypto::Ed25519VerifyingKey;
use dte_types::SignedDocument;

use crate::canonical::canonicalize;
use crate::error::VerifyError;

/// 署名済み文書を検証する。
///
/// `expected_key`は信頼できる経路で入手した公開鍵。署名情報に埋め込まれた
/// 公開鍵・鍵識別子がこれと一致しない場合は`KeyMismatch`。
pub fn verify_signed_document(
    signed: &SignedDocument,
    expected_key: &Ed25519VerifyingKey,
) -> Result<(), VerifyError> {
    let info = &signed.signature;
    if info.algorithm != dte_crypto::ALGORITHM_ED25519 {
        return Err(VerifyError::UnsupportedAlgorithm(info.algorithm.clone()));
    }

    let embedded_key = dte_crypto::verifying_key_from_base64(&info.public_key)?;
    if embedded_key != *expected_key || info.key_id != dte_crypto::key_id(expected_key) {
        return Err(VerifyError::KeyMismatch);
    }

    let canonical = canonicalize(&signed.document)?;
    if canonical.digest_hex() != info.digest {
        return Err(VerifyError::DigestMismatch);
    }

    let signature = dte_crypto::signature_from_base64(&info.value)?;
    dte_crypto::ed25519_verify(expected_key, canonical.as_bytes(), &signature)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{service_with_key, test_signing_key, valid_document};
    use rust_decimal::Decimal;

    fn signed() -> SignedDocument {
        service_with_key(test_signing_key(1))
            .sign_document(valid_document("A-1"))
            .unwrap()
    }

    fn expected_key() -> Ed25519VerifyingKey {
        test_signing_key(1).verifying_key()
    }

    #[test]
    fn test_untouched_document_verifies() {
        assert!(verify_signed_document(&signed(), &expected_key()).is_ok());
    }

    /// 署名後に文書を改ざんすると検証が失敗する
    #[test]
    fn test_tampered_document_fails() {
        let mut tampered = signed();
        tampered.document.total = Some(Decimal::from(21));
        assert!(matches!(
            verify_signed_document(&tampered, &expected_key()),
            Err(VerifyError::DigestMismatch)
        ));

        // ダイジェストも合わせて差し替えても署名値で検出される
        let canonical = canonicalize(&tampered.document).unwrap();
        tampered.signature.digest = canonical.digest_hex();
        assert!(matches!(
            verify_signed_document(&tampered, &expected_key()),
            Err(VerifyError::Crypto(_))
        ));
    }

    #[test]
    fn test_other_key_is_rejected() {
        let other = test_signing_key(2).verifying_key();
        assert!(matches!(
            verify_signed_document(&signed(), &other),
            Err(VerifyError::KeyMismatch)
        ));
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let mut s = signed();
        s.signature.algorithm = "RS256".into();
        assert!(matches!(
            verify_signed_document(&s, &expected_key()),
            Err(VerifyError::UnsupportedAlgorithm(_))
        ));
    }
}
