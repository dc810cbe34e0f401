//! スクリーンショットからの (名前, スコア) 抽出
//!
//! 画像は1枚ずつ順番に処理する。1枚の失敗でバッチ全体は止めない。

mod gemini;
mod image_prep;
pub mod retry;
mod types;

pub use gemini::GeminiClient;
pub use image_prep::{prepare_image, prepare_image_bytes};
pub use retry::{call_with_retry, Pacer, TokioPacer};
pub use types::{
    AttemptOutcome, ExtractFailure, ExtractionReport, ImageFailure, PreparedImage, VisionModel,
};

use crate::config::Config;
use crate::scanner::ImageInfo;
use score_sheet_common::{parse_score_lines, RetryPolicy};
use std::time::Duration;

/// 抽出処理の設定
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// 送信前の縮小サイズ（縦横の上限px）
    pub max_image_size: u32,
    /// 画像ごとの固定待機
    pub inter_image_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_image_size: 512,
            inter_image_delay: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&Config> for ExtractOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_image_size: config.max_image_size,
            inter_image_delay: config.inter_image_delay(),
            retry: config.retry.clone(),
        }
    }
}

/// 全画像から (名前, スコア) を抽出
///
/// # Arguments
/// * `vision` - Vision API
/// * `pacer` - リトライ待機・画像間待機
/// * `images` - 処理順の画像リスト
/// * `prompt` - 固定プロンプト
/// * `on_progress` - 進捗コールバック (処理中の番号, 総数, ファイル名)
pub async fn extract_scores<V, P>(
    vision: &V,
    pacer: &mut P,
    images: &[ImageInfo],
    prompt: &str,
    options: &ExtractOptions,
    on_progress: impl Fn(usize, usize, &str),
) -> ExtractionReport
where
    V: VisionModel,
    P: Pacer,
{
    let mut report = ExtractionReport {
        images_total: images.len(),
        ..Default::default()
    };

    for (i, image) in images.iter().enumerate() {
        on_progress(i + 1, images.len(), &image.file_name);

        match extract_one(vision, pacer, image, prompt, options).await {
            Ok(entries) => {
                tracing::debug!("{}: {}件を抽出", image.file_name, entries.len());
                report.entries.extend(entries);
            }
            Err(reason) => {
                tracing::warn!("ファイル「{}」の抽出中にエラー: {}", image.file_name, reason);
                report.failures.push(ImageFailure {
                    file_name: image.file_name.clone(),
                    reason,
                });
            }
        }

        pacer.wait(options.inter_image_delay).await;
    }

    report
}

async fn extract_one<V, P>(
    vision: &V,
    pacer: &mut P,
    image: &ImageInfo,
    prompt: &str,
    options: &ExtractOptions,
) -> Result<Vec<score_sheet_common::RawEntry>, ExtractFailure>
where
    V: VisionModel,
    P: Pacer,
{
    let prepared = prepare_image(&image.path, options.max_image_size).map_err(|e| {
        ExtractFailure::ImageLoad {
            detail: e.to_string(),
        }
    })?;

    let text = call_with_retry(&options.retry, pacer, |_| vision.generate(prompt, &prepared)).await?;

    Ok(parse_score_lines(&text))
}
