//! # サーバー設定・共有状態
//!
//! 環境変数からの設定読み込み、署名鍵のロード、ハンドラ間の共有状態の定義。
//!
//! | 環境変数 | デフォルト | 内容 |
//! |----------|-----------|------|
//! | `DTE_LISTEN_ADDR` | `0.0.0.0:1323` | 待ち受けアドレス |
//! | `DTE_SIGNING_KEY` | - | 32バイトのシード（hex） |
//! | `DTE_SIGNING_KEY_FILE` | - | 鍵ファイル（PKCS#8 PEMまたはhex）。`DTE_SIGNING_KEY`より優先 |
//! | `DTE_DEV_MODE` | `false` | 鍵未設定時に一時鍵を生成する |
//! | `DTE_MAX_CLOCK_SKEW_SECS` | `0` | `issued_at`の未来方向の許容秒数 |

use std::path::PathBuf;

use anyhow::Context;
use dte_core::{Signer, SigningService};
use dte_crypto::Ed25519SigningKey;

/// 待ち受けアドレスのデフォルト。
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:1323";

/// ハンドラ間で共有する状態。
pub struct AppState {
    /// 署名サービス
    pub service: SigningService,
}

/// 署名鍵の取得元。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    File(PathBuf),
    Env,
    Ephemeral,
}

/// 起動時に一度だけ読み込む設定。
#[derive(Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub key_file: Option<PathBuf>,
    key_hex: Option<String>,
    pub dev_mode: bool,
    pub max_clock_skew: chrono::Duration,
}

// 鍵の内容はDebug出力に含めない
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("listen_addr", &self.listen_addr)
            .field("key_file", &self.key_file)
            .field("key_hex", &self.key_hex.as_ref().map(|_| "<redacted>"))
            .field("dev_mode", &self.dev_mode)
            .field("max_clock_skew", &self.max_clock_skew)
            .finish()
    }
}

impl ServerConfig {
    /// 環境変数から設定を読み込む。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let listen_addr =
            non_empty("DTE_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let key_file = non_empty("DTE_SIGNING_KEY_FILE").map(PathBuf::from);
        let key_hex = non_empty("DTE_SIGNING_KEY");
        let dev_mode = non_empty("DTE_DEV_MODE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        let skew_secs = match non_empty("DTE_MAX_CLOCK_SKEW_SECS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .context("DTE_MAX_CLOCK_SKEW_SECSは0以上の整数である必要があります")?,
            None => 0,
        };

        Ok(Self {
            listen_addr,
            key_file,
            key_hex,
            dev_mode,
            max_clock_skew: chrono::Duration::seconds(i64::from(skew_secs)),
        })
    }

    /// 起動時の署名鍵をロードする。
    ///
    /// 優先順位: 鍵ファイル → `DTE_SIGNING_KEY` → 開発モードの一時鍵。
    /// いずれも無い場合は`None`（鍵スロットは空のまま起動する）。
    pub fn load_signing_key(&self) -> anyhow::Result<Option<(Ed25519SigningKey, KeySource)>> {
        if let Some(key) = self.read_key_file()? {
            let path = self.key_file.clone().unwrap_or_default();
            return Ok(Some((key, KeySource::File(path))));
        }

        if let Some(key_hex) = &self.key_hex {
            let key = dte_crypto::signing_key_from_hex(key_hex)
                .context("DTE_SIGNING_KEYのデコードに失敗しました")?;
            return Ok(Some((key, KeySource::Env)));
        }

        if self.dev_mode {
            tracing::warn!("署名鍵が未設定です。一時鍵を生成します（開発環境用）");
            return Ok(Some((dte_crypto::generate_signing_key(), KeySource::Ephemeral)));
        }

        Ok(None)
    }

    /// 鍵ファイルを読み込む。鍵ファイルが設定されていない場合は`None`。
    pub fn read_key_file(&self) -> anyhow::Result<Option<Ed25519SigningKey>> {
        let Some(path) = &self.key_file else {
            return Ok(None);
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("鍵ファイルの読み込みに失敗しました: {}", path.display()))?;
        let key = dte_crypto::decode_signing_key(&contents)
            .with_context(|| format!("鍵ファイルのデコードに失敗しました: {}", path.display()))?;
        Ok(Some(key))
    }
}

/// 鍵ファイルを読み直して鍵スロットを差し替える。
///
/// 読み込み・デコードに失敗した場合、または鍵ファイルが未設定の場合は
/// 現在の鍵を維持する。差し替えた場合は新しい鍵の識別子を返す。
pub fn reload_key(config: &ServerConfig, signer: &Signer) -> Option<String> {
    match config.read_key_file() {
        Ok(Some(key)) => Some(signer.rotate(key)),
        Ok(None) => {
            tracing::warn!("DTE_SIGNING_KEY_FILEが未設定のため鍵の再読み込みをスキップします");
            None
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "鍵の再読み込みに失敗しました。現在の鍵を維持します");
            None
        }
    }
}
