//! # 基準時計
//!
//! 発行日時の妥当性検証と署名日時の付与に使う時計を抽象化する。

use chrono::{DateTime, Utc};

/// 基準時計のトレイト。
pub trait Clock: Send + Sync {
    /// 現在時刻（UTC）を返す。
    fn now(&self) -> DateTime<Utc>;
}

/// システム時計。
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻を返す時計。テスト・再現用。
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
