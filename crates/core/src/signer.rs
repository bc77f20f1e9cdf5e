//! # Signer
//!
//! 署名鍵を保持し、正規化バイト列に署名する。
//!
//! 鍵はスロット（`RwLock<Option<Arc<LoadedKey>>>`）に格納される。
//! 署名処理は開始時に`Arc`を1度だけ複製し、その鍵で最後まで処理する。
//! 鍵のローテーションはスロットの参照を差し替えるだけであり、
//! 実行中の署名処理は開始時の鍵で完了する。
//!
//! 書き込みロックを保持するのは`Arc`の差し替えの間だけである。新しい鍵は
//! ロック取得前に構築済みのため、読み手が構築途中の鍵を観測することはない。

use std::sync::{Arc, PoisonError, RwLock};

use dte_crypto::{Ed25519Signature, Ed25519SigningKey, Ed25519VerifyingKey};
use dte_types::SignatureInfo;

use crate::canonical::CanonicalForm;
use crate::error::SigningFailure;

/// ロード済みの署名鍵と、その公開情報。
pub struct LoadedKey {
    signing_key: Ed25519SigningKey,
    verifying_key: Ed25519VerifyingKey,
    key_id: String,
}

impl LoadedKey {
    pub fn new(signing_key: Ed25519SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        let key_id = dte_crypto::key_id(&verifying_key);
        Self {
            signing_key,
            verifying_key,
            key_id,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn verifying_key(&self) -> Ed25519VerifyingKey {
        self.verifying_key
    }
}

// 秘密鍵はDebug出力に含めない
impl std::fmt::Debug for LoadedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// 正規化バイト列に対する署名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// 署名アルゴリズム識別子
    pub algorithm: &'static str,
    /// 署名に使用した鍵の識別子
    pub key_id: String,
    /// 署名に使用した鍵の公開鍵
    pub verifying_key: Ed25519VerifyingKey,
    /// 署名対象（正規化バイト列）のSHA-256（hex）
    pub digest: String,
    /// 署名値
    pub value: Ed25519Signature,
}

impl Signature {
    /// ワイヤ形式の署名情報に変換する。
    pub fn to_info(&self, signed_at: chrono::DateTime<chrono::Utc>) -> SignatureInfo {
        SignatureInfo {
            algorithm: self.algorithm.to_string(),
            key_id: self.key_id.clone(),
            signed_at,
            public_key: dte_crypto::verifying_key_to_base64(&self.verifying_key),
            digest: self.digest.clone(),
            value: dte_crypto::signature_to_base64(&self.value),
        }
    }
}

/// 鍵スロットを持つ署名器。
#[derive(Debug, Default)]
pub struct Signer {
    slot: RwLock<Option<Arc<LoadedKey>>>,
}

impl Signer {
    /// 鍵をロードした状態で構築する。
    pub fn new(signing_key: Ed25519SigningKey) -> Self {
        Self {
            slot: RwLock::new(Some(Arc::new(LoadedKey::new(signing_key)))),
        }
    }

    /// 鍵がロードされていない状態で構築する。署名は`KeyUnavailable`で失敗する。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 鍵を差し替える。新しい鍵の識別子を返す。
    pub fn rotate(&self, signing_key: Ed25519SigningKey) -> String {
        let loaded = Arc::new(LoadedKey::new(signing_key));
        let key_id = loaded.key_id.clone();
        let previous = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(loaded);
        tracing::info!(
            key_id = %key_id,
            previous_key_id = previous.as_ref().map(|k| k.key_id.as_str()).unwrap_or("-"),
            "署名鍵をローテーションしました"
        );
        key_id
    }

    /// 鍵をアンロードする。
    pub fn unload(&self) {
        let previous = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            tracing::info!(key_id = %previous.key_id, "署名鍵をアンロードしました");
        }
    }

    /// 現在の鍵のスナップショット。
    pub fn current(&self) -> Option<Arc<LoadedKey>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn can_sign(&self) -> bool {
        self.current().is_some()
    }

    pub fn key_id(&self) -> Option<String> {
        self.current().map(|key| key.key_id.clone())
    }

    pub fn verifying_key(&self) -> Option<Ed25519VerifyingKey> {
        self.current().map(|key| key.verifying_key)
    }

    /// 正規化バイト列に署名する。
    ///
    /// 失敗の原因はログに残すが、鍵素材は含めない。
    pub fn sign(&self, canonical: &CanonicalForm) -> Result<Signature, SigningFailure> {
        let Some(key) = self.current() else {
            tracing::error!("署名鍵がロードされていません");
            return Err(SigningFailure::KeyUnavailable);
        };

        let value = dte_crypto::ed25519_try_sign(&key.signing_key, canonical.as_bytes())
            .map_err(|e| {
                tracing::error!(key_id = %key.key_id, error = %e, "署名プリミティブが失敗しました");
                SigningFailure::Primitive
            })?;

        Ok(Signature {
            algorithm: dte_crypto::ALGORITHM_ED25519,
            key_id: key.key_id.clone(),
            verifying_key: key.verifying_key,
            digest: canonical.digest_hex(),
            value,
        })
    }
}
