use score_sheet_common::RawEntry;
use serde::Serialize;
use thiserror::Error;

/// Vision APIに送る画像（縮小・再エンコード済み）
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub mime_type: String,
    /// Base64エンコードされた画像データ
    pub data: String,
    pub width: u32,
    pub height: u32,
}

/// Vision API 1回分の呼び出し結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 応答テキスト
    Success(String),
    /// 利用上限（HTTP 429）。リトライ対象
    RateLimited(String),
    /// それ以外の失敗。リトライしない
    Failed(String),
}

/// 画像1枚分の抽出失敗理由
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ExtractFailure {
    #[error("画像を読み込めません: {detail}")]
    ImageLoad { detail: String },

    #[error("APIの利用上限が続いたため中止しました（{attempts}回試行）: {detail}")]
    RateLimitExhausted { attempts: u32, detail: String },

    #[error("API呼び出しエラー: {detail}")]
    Permanent { detail: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFailure {
    pub file_name: String,
    pub reason: ExtractFailure,
}

/// 抽出処理全体の結果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    /// 全画像の読み取り結果（画像順・出現順）
    pub entries: Vec<RawEntry>,
    /// 失敗した画像（バッチは継続）
    pub failures: Vec<ImageFailure>,
    pub images_total: usize,
}

impl ExtractionReport {
    pub fn images_succeeded(&self) -> usize {
        self.images_total - self.failures.len()
    }
}

/// 画像からテキストを生成するモデル
#[allow(async_fn_in_trait)]
pub trait VisionModel {
    async fn generate(&self, prompt: &str, image: &PreparedImage) -> AttemptOutcome;
}
