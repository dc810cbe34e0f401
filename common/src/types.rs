//! 読み取り結果の型定義
//!
//! CLIとテストで共有される型:
//! - RawEntry: AIが画像から書き起こした (名前, スコア) の生データ
//! - Roster: 正規の名前リスト（メンバーシート1列目）
//! - MatchResult: 1件の名前照合結果
//! - OutputRow: スプレッドシートに書き込む最終行

use serde::{Deserialize, Serialize};

/// AIが書き起こした1行分の生データ
///
/// スコアは数値として扱わない（桁区切りや巨大な整数がそのまま入るため）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawEntry {
    pub name: String,
    pub score: String,
}

impl RawEntry {
    pub fn new(name: impl Into<String>, score: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: score.into(),
        }
    }
}

/// 正規の名前リスト
///
/// 前後の空白を除去し、空の値は捨てる。重複は除去しない（同点時は先頭優先）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    /// シート列などの生の値から名簿を作る
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        Self { names }
    }

    /// テキスト（1行1名）から名簿を作る
    pub fn from_lines(text: &str) -> Self {
        Self::from_values(text.lines())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// 照合ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    /// 閾値以上で一致
    Matched,
    /// 候補はあるが総合点が閾値未満
    LowConfidence,
    /// 信頼できる候補なし
    NoCandidate,
}

/// 1件の名前照合結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// AIが読み取った名前
    pub extracted_name: String,
    /// 最良候補の名前（候補なしの場合は空）
    pub resolved_name: String,
    /// 総合点（類似度 - 文字数差ペナルティ）
    pub confidence_score: f64,
    /// 最良候補との類似度 (0.0-100.0)
    pub similarity: f64,
    pub status: MatchStatus,
}

/// スプレッドシートに書き込む1行
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRow {
    pub name: String,
    pub score: String,
}

impl OutputRow {
    pub fn new(name: impl Into<String>, score: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: score.into(),
        }
    }
}

impl From<RawEntry> for OutputRow {
    fn from(entry: RawEntry) -> Self {
        Self {
            name: entry.name,
            score: entry.score,
        }
    }
}
