//! # DTE Signing Core
//!
//! DTEの検証・正規化・署名を行うコア。Webフレームワークには依存しない。
//!
//! ## 処理フロー
//! 1. リクエストボディを文書にデコードする（`decode_document`）
//! 2. 必須項目・識別子・明細の算術・発行日時を検証する（`Validator`）
//! 3. 正規化バイト列を生成する（`canonicalize`）
//! 4. 鍵スロットの鍵で署名する（`Signer`）
//! 5. 文書と署名情報を`SignedDocument`にまとめる（`SigningService`）

pub mod canonical;
pub mod clock;
pub mod error;
pub mod service;
pub mod signer;
pub mod validation;
pub mod verify;

pub use canonical::{canonicalize, decode_document, CanonicalForm, CANONICAL_SCHEMA};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{MalformedDocument, SignError, SigningFailure, ValidationError, VerifyError};
pub use service::{SignStage, SigningService};
pub use signer::{LoadedKey, Signature, Signer};
pub use validation::Validator;
pub use verify::verify_signed_document;
