//! Vision API呼び出しのリトライ
//!
//! 1回の呼び出し結果（`AttemptOutcome`）に対するコンビネータ。
//! 待機と乱数は `Pacer` 経由にして、テストでは実際に眠らない。

use super::types::{AttemptOutcome, ExtractFailure};
use rand::Rng;
use score_sheet_common::RetryPolicy;
use std::future::Future;
use std::time::Duration;

/// 待機処理
#[allow(async_fn_in_trait)]
pub trait Pacer {
    /// `min..=max` 秒のジッター
    fn jitter_secs(&mut self, min: f64, max: f64) -> f64;

    async fn wait(&mut self, duration: Duration);
}

/// tokioのタイマーで実際に待つ
#[derive(Debug, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn jitter_secs(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    async fn wait(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 利用上限エラーのみリトライしながら呼び出す
///
/// # Arguments
/// * `policy` - 最大試行回数と待機時間の計算式
/// * `pacer` - 待機処理
/// * `call` - 試行番号（0始まり）を受け取り、1回分の呼び出しを行うクロージャ
pub async fn call_with_retry<F, Fut, P>(
    policy: &RetryPolicy,
    pacer: &mut P,
    mut call: F,
) -> Result<String, ExtractFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome>,
    P: Pacer,
{
    let mut attempt = 0;
    loop {
        match call(attempt).await {
            AttemptOutcome::Success(text) => return Ok(text),
            AttemptOutcome::Failed(detail) => return Err(ExtractFailure::Permanent { detail }),
            AttemptOutcome::RateLimited(detail) => {
                if !policy.should_retry(attempt) {
                    return Err(ExtractFailure::RateLimitExhausted {
                        attempts: attempt + 1,
                        detail,
                    });
                }
                let jitter = pacer.jitter_secs(policy.jitter_min_secs, policy.jitter_max_secs);
                let wait = policy.backoff(attempt, jitter);
                tracing::warn!(
                    "APIの利用上限を検知。{:.1}秒待機して再試行します ({}/{})",
                    wait.as_secs_f64(),
                    attempt + 2,
                    policy.max_attempts
                );
                pacer.wait(wait).await;
                attempt += 1;
            }
        }
    }
}
