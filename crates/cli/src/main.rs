//! # DTE Signer CLI
//!
//! 運用者向けのコマンドラインツール。
//!
//! - `keygen`: 署名鍵を生成する（hexシードまたはPKCS#8 PEM）
//! - `canonicalize`: 文書の正規化バイト列を出力する
//! - `verify`: 署名済み文書をオフラインで検証する

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dte_types::{Document, SignedDocument};

#[derive(Parser)]
#[command(name = "dte-cli")]
#[command(about = "DTE signing operator CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 新しいEd25519署名鍵を生成する
    Keygen {
        /// PKCS#8 PEM形式で出力する（省略時はhexシード）
        #[arg(long)]
        pem: bool,
    },
    /// 文書（JSON）の正規化バイト列を出力する
    Canonicalize {
        /// 文書ファイル
        document: PathBuf,
    },
    /// 署名済み文書を検証する
    Verify {
        /// 署名済み文書ファイル
        signed: PathBuf,
        /// 信頼する公開鍵（Base64）
        #[arg(long)]
        public_key: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { pem } => {
            let (key_id, encoded) = keygen(pem)?;
            eprintln!("key_id: {key_id}");
            println!("{}", encoded.trim_end());
        }
        Commands::Canonicalize { document } => {
            let document: Document = read_json(&document)?;
            let canonical = dte_core::canonicalize(&document)?;
            println!("{}", String::from_utf8_lossy(canonical.as_bytes()));
        }
        Commands::Verify { signed, public_key } => {
            let signed: SignedDocument = read_json(&signed)?;
            let key_id = verify(&signed, &public_key)?;
            println!(
                "OK: {} (key_id: {key_id})",
                signed.document.id.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}

/// 鍵を生成し、鍵識別子とエンコード済みの秘密鍵を返す。
fn keygen(pem: bool) -> Result<(String, String)> {
    let key = dte_crypto::generate_signing_key();
    let key_id = dte_crypto::key_id(&key.verifying_key());
    let encoded = if pem {
        dte_crypto::signing_key_to_pem(&key)?
    } else {
        hex::encode(key.to_bytes())
    };
    Ok((key_id, encoded))
}

fn verify(signed: &SignedDocument, public_key: &str) -> Result<String> {
    let verifying_key = dte_crypto::verifying_key_from_base64(public_key)
        .context("公開鍵のデコードに失敗しました")?;
    dte_core::verify_signed_document(signed, &verifying_key)
        .context("署名の検証に失敗しました")?;
    Ok(dte_crypto::key_id(&verifying_key))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("ファイルの読み込みに失敗しました: {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("JSONのデコードに失敗しました: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dte_core::{FixedClock, Signer, SigningService, Validator};
    use dte_types::{LineItem, Party};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn signed_document(key: dte_crypto::Ed25519SigningKey) -> SignedDocument {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()));
        let service =
            SigningService::new(Validator::new(clock.clone()), Arc::new(Signer::new(key)), clock);
        service
            .sign_document(Document {
                id: Some("CLI-1".into()),
                issuer: Some(Party {
                    id: "I".into(),
                    name: "Issuer".into(),
                }),
                recipient: Some(Party {
                    id: "R".into(),
                    name: "Recipient".into(),
                }),
                items: vec![LineItem {
                    description: "item".into(),
                    quantity: Decimal::from(3),
                    unit_price: Decimal::from(5),
                }],
                total: Some(Decimal::from(15)),
                issued_at: Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()),
            })
            .unwrap()
    }

    #[test]
    fn test_keygen_outputs_decodable_keys() {
        let (key_id, hex_seed) = keygen(false).unwrap();
        let key = dte_crypto::decode_signing_key(&hex_seed).unwrap();
        assert_eq!(dte_crypto::key_id(&key.verifying_key()), key_id);

        let (key_id, pem) = keygen(true).unwrap();
        let key = dte_crypto::decode_signing_key(&pem).unwrap();
        assert_eq!(dte_crypto::key_id(&key.verifying_key()), key_id);
    }

    #[test]
    fn test_verify_accepts_matching_key_only() {
        let key = dte_crypto::generate_signing_key();
        let public_key = dte_crypto::verifying_key_to_base64(&key.verifying_key());
        let signed = signed_document(key);

        assert!(verify(&signed, &public_key).is_ok());

        let other = dte_crypto::verifying_key_to_base64(
            &dte_crypto::generate_signing_key().verifying_key(),
        );
        assert!(verify(&signed, &other).is_err());
        assert!(verify(&signed, "not base64").is_err());
    }

    #[test]
    fn test_read_json_from_file() {
        let signed = signed_document(dte_crypto::generate_signing_key());
        let path = std::env::temp_dir().join(format!("dte-cli-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_vec(&signed).unwrap()).unwrap();

        let loaded: SignedDocument = read_json(&path).unwrap();
        assert_eq!(loaded, signed);

        std::fs::remove_file(&path).unwrap();
        assert!(read_json::<SignedDocument>(&path).is_err());
    }
}
