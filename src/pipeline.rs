//! 抽出 → 照合 → 書き込みの一連の実行
//!
//! 状態は Idle → Running → (Success | Failed) の一方向。
//! 画像が0枚、またはAPIキーがない場合は Idle のまま何もしない。

use crate::analyzer::{extract_scores, ExtractOptions, ImageFailure, Pacer, VisionModel};
use crate::error::{Result, ScoreSheetError};
use crate::scanner::ImageInfo;
use crate::sheets::{write_rows, SheetStore, WriteSummary};
use chrono::{DateTime, Local};
use score_sheet_common::{
    reconcile, MatchResult, MatchSettings, OutputRow, ReviewMessage, Roster, SimilarityAlgorithm,
    TaskProfile,
};
use std::fmt;

/// 名簿は常に1列目
const ROSTER_COLUMN: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Success,
    Failed,
}

/// 実行を開始しなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    NoImages,
    MissingApiKey,
}

impl fmt::Display for IdleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdleReason::NoImages => write!(f, "画像が選択されていません"),
            IdleReason::MissingApiKey => write!(f, "Gemini APIキーが設定されていません"),
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Idle(IdleReason),
    Completed(RunSummary),
}

/// 1回の実行結果
#[derive(Debug)]
pub struct RunSummary {
    pub task_id: String,
    pub sheet: String,
    pub images_total: usize,
    pub failures: Vec<ImageFailure>,
    pub entries_extracted: usize,
    pub roster_size: usize,
    pub matches: Vec<MatchResult>,
    pub rows: Vec<OutputRow>,
    pub reviews: Vec<ReviewMessage>,
    pub write: WriteSummary,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunSummary {
    pub fn images_succeeded(&self) -> usize {
        self.images_total - self.failures.len()
    }
}

/// 実行前チェック（副作用なし）
pub fn preflight(images: &[ImageInfo], has_credential: bool) -> std::result::Result<(), IdleReason> {
    if images.is_empty() {
        return Err(IdleReason::NoImages);
    }
    if !has_credential {
        return Err(IdleReason::MissingApiKey);
    }
    Ok(())
}

pub struct Pipeline<S, P> {
    store: S,
    pacer: P,
    roster_sheet: String,
    settings: MatchSettings,
    algorithm: SimilarityAlgorithm,
    options: ExtractOptions,
    state: RunState,
}

impl<S: SheetStore, P: Pacer> Pipeline<S, P> {
    pub fn new(store: S, pacer: P, roster_sheet: impl Into<String>) -> Self {
        Self {
            store,
            pacer,
            roster_sheet: roster_sheet.into(),
            settings: MatchSettings::default(),
            algorithm: SimilarityAlgorithm::default(),
            options: ExtractOptions::default(),
            state: RunState::Idle,
        }
    }

    pub fn with_settings(mut self, settings: MatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_algorithm(mut self, algorithm: SimilarityAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// タスクを1回実行
    ///
    /// # Arguments
    /// * `vision` - Vision API（APIキー未設定なら None）
    /// * `task` - 実行するタスク
    /// * `images` - 処理順の画像
    /// * `on_progress` - 進捗コールバック (番号, 総数, ファイル名)
    pub async fn run<V: VisionModel>(
        &mut self,
        vision: Option<&V>,
        task: &TaskProfile,
        images: &[ImageInfo],
        on_progress: impl Fn(usize, usize, &str),
    ) -> Result<RunOutcome> {
        if let Err(reason) = preflight(images, vision.is_some()) {
            tracing::warn!("実行を開始しません: {}", reason);
            return Ok(RunOutcome::Idle(reason));
        }
        let Some(vision) = vision else {
            return Ok(RunOutcome::Idle(IdleReason::MissingApiKey));
        };

        self.state = RunState::Running;
        tracing::info!("タスク「{}」を開始 ({}枚)", task.label, images.len());

        match self.execute(vision, task, images, on_progress).await {
            Ok(summary) => {
                self.state = RunState::Success;
                tracing::info!(
                    "タスク「{}」完了: {}行を書き込み、確認依頼{}件",
                    task.label,
                    summary.write.rows_written,
                    summary.reviews.len()
                );
                Ok(RunOutcome::Completed(summary))
            }
            Err(e) => {
                self.state = RunState::Failed;
                tracing::error!("タスク「{}」失敗: {}", task.label, e);
                Err(e)
            }
        }
    }

    async fn execute<V: VisionModel>(
        &mut self,
        vision: &V,
        task: &TaskProfile,
        images: &[ImageInfo],
        on_progress: impl Fn(usize, usize, &str),
    ) -> Result<RunSummary> {
        let started_at = Local::now();

        // Vision APIを呼ぶ前にシートの存在を確認する
        self.ensure_sheets(&task.sheet).await?;

        let prompt = task.prompt();
        let report = extract_scores(
            vision,
            &mut self.pacer,
            images,
            &prompt,
            &self.options,
            on_progress,
        )
        .await;

        let roster_values = self
            .store
            .column_values(&self.roster_sheet, ROSTER_COLUMN)
            .await?;
        let roster = Roster::from_values(roster_values);
        if roster.is_empty() {
            tracing::warn!("名簿シート「{}」が空のため照合をスキップします", self.roster_sheet);
        }

        let reconciliation = reconcile(&report.entries, &roster, &self.settings, &self.algorithm);

        let write = write_rows(&mut self.store, &task.sheet, &task.layout, &reconciliation.rows).await?;

        Ok(RunSummary {
            task_id: task.id.clone(),
            sheet: task.sheet.clone(),
            images_total: report.images_total,
            failures: report.failures,
            entries_extracted: report.entries.len(),
            roster_size: roster.len(),
            matches: reconciliation.matches,
            rows: reconciliation.rows,
            reviews: reconciliation.reviews,
            write,
            started_at,
            finished_at: Local::now(),
        })
    }

    async fn ensure_sheets(&self, target: &str) -> Result<()> {
        let names = self.store.sheet_names().await?;
        for sheet in [self.roster_sheet.as_str(), target] {
            if !names.iter().any(|n| n == sheet) {
                return Err(ScoreSheetError::SheetNotFound(sheet.to_string()));
            }
        }
        Ok(())
    }
}
