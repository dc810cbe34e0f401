use crate::error::{Result, ScoreSheetError};
use score_sheet_common::{default_tasks, MatchSettings, RetryPolicy, SimilarityAlgorithm, TaskProfile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 名簿を読むシート名
pub const DEFAULT_ROSTER_SHEET: &str = "メンバー";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub max_image_size: u32,
    pub timeout_seconds: u64,
    pub inter_image_delay_ms: u64,
    pub retry: RetryPolicy,
    pub spreadsheet_id: Option<String>,
    pub sheets_access_token: Option<String>,
    /// 指定時はGoogle Sheetsの代わりにローカルの.xlsxを使う
    pub workbook: Option<PathBuf>,
    pub roster_sheet: String,
    pub matching: MatchingConfig,
    pub tasks: Vec<TaskProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    #[serde(flatten)]
    pub settings: MatchSettings,
    pub algorithm: SimilarityAlgorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default_config())
        }
    }

    /// 設定JSONを読み込み、値の範囲を検証する
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.matching.settings.validate()?;
        self.retry.validate()?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ScoreSheetError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("score-sheet-ai").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_key: None,
            model: "gemini-flash-latest".into(),
            max_image_size: 512,
            timeout_seconds: 600,
            inter_image_delay_ms: 1000,
            retry: RetryPolicy::default(),
            spreadsheet_id: None,
            sheets_access_token: None,
            workbook: None,
            roster_sheet: DEFAULT_ROSTER_SHEET.into(),
            matching: MatchingConfig::default(),
            tasks: default_tasks(),
        }
    }

    /// Gemini APIキー（環境変数を優先）
    ///
    /// 未設定でもエラーにはしない。実行可否の判定はパイプライン側で行う
    pub fn api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                return Some(key);
            }
        }
        self.api_key.clone().filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_spreadsheet_id(&mut self, id: String) -> Result<()> {
        self.spreadsheet_id = Some(id);
        self.save()
    }

    /// Google Sheetsのアクセストークン（環境変数を優先）
    pub fn sheets_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var("GOOGLE_SHEETS_TOKEN") {
            if !token.trim().is_empty() {
                return Ok(token);
            }
        }
        self.sheets_access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ScoreSheetError::MissingSheetsToken)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn inter_image_delay(&self) -> Duration {
        Duration::from_millis(self.inter_image_delay_ms)
    }
}
