//! # DTE 署名サーバー
//!
//! DTEを受け取り、検証・正規化してEd25519で署名するHTTPサーバー。
//!
//! ## 起動シーケンス
//! 1. 環境変数から設定を読み込む
//! 2. 署名鍵をロードする（無い場合は空の鍵スロットで起動）
//! 3. SIGHUPで鍵ファイルを再読み込みするタスクを起動する
//! 4. エンドポイントの受付を開始し、SIGINT/SIGTERMで停止する

mod config;
mod endpoints;
mod error;


use std::sync::Arc;

use dte_core::{Clock, Signer, SigningService, SystemClock, Validator};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::config::{AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(ServerConfig::from_env()?);

    let signer = match config.load_signing_key()? {
        Some((key, source)) => {
            let signer = Signer::new(key);
            tracing::info!(
                key_id = signer.key_id().as_deref().unwrap_or("-"),
                source = ?source,
                "署名鍵をロードしました"
            );
            signer
        }
        None => {
            tracing::warn!("署名鍵が設定されていません。署名リクエストは失敗します");
            Signer::empty()
        }
    };
    let signer = Arc::new(signer);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let validator = Validator::with_clock_skew(clock.clone(), config.max_clock_skew);
    let state = Arc::new(AppState {
        service: SigningService::new(validator, signer.clone(), clock),
    });

    #[cfg(unix)]
    tokio::spawn(reload_on_sighup(config.clone(), signer));

    let app = endpoints::router(state);

    tracing::info!("DTE署名サーバーを {} で起動します", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("DTE署名サーバーを停止しました");
    Ok(())
}

/// SIGHUPを受けるたびに鍵ファイルを読み直し、鍵スロットを差し替える。
/// 読み込みに失敗した場合は現在の鍵を維持する。
#[cfg(unix)]
async fn reload_on_sighup(config: Arc<ServerConfig>, signer: Arc<Signer>) {
    let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "SIGHUPハンドラの登録に失敗しました");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        crate::config::reload_key(&config, &signer);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+Cハンドラの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERMハンドラの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("停止シグナルを受信しました");
}
