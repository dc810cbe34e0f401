//! リトライ方針
//!
//! 待機時間 = 2^attempt × base_delay_secs + jitter（attempt は0始まり）

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// 最大試行回数（初回を含む）
    pub max_attempts: u32,
    pub base_delay_secs: f64,
    pub jitter_min_secs: f64,
    pub jitter_max_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 5.0,
            jitter_min_secs: 1.0,
            jitter_max_secs: 3.0,
        }
    }
}

impl RetryPolicy {
    /// attempt回目（0始まり）が失敗した後、もう一度試すか
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// attempt回目の失敗後の待機時間
    ///
    /// `jitter` は呼び出し側が `jitter_min_secs..=jitter_max_secs` から選んだ値
    pub fn backoff(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = 2f64.powi(exponent) * self.base_delay_secs.max(0.0) + jitter.max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// 設定値の範囲チェック
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config("最大試行回数は1以上で指定してください".into()));
        }
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !non_negative(self.base_delay_secs) {
            return Err(Error::Config("リトライ待機時間は0秒以上で指定してください".into()));
        }
        if !non_negative(self.jitter_min_secs)
            || !non_negative(self.jitter_max_secs)
            || self.jitter_min_secs > self.jitter_max_secs
        {
            return Err(Error::Config(
                "ジッターは 0 <= jitterMinSecs <= jitterMaxSecs で指定してください".into(),
            ));
        }
        Ok(())
    }
}
