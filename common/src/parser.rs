//! APIレスポンスパーサー
//!
//! Vision APIの応答テキストから「名前,スコア」行を取り出す。
//! AIはルールを完全には守らないため、形式に合わない行は黙って捨てる。

use crate::error::{Error, Result};
use crate::types::RawEntry;
use serde::Deserialize;

/// 応答テキスト全体をパース
///
/// # Arguments
/// * `response` - Vision APIの応答テキスト（改行区切り）
///
/// # Returns
/// 形式に合った行だけを出現順に並べた `RawEntry` のリスト
///
/// # Examples
/// ```
/// use score_sheet_common::parse_score_lines;
///
/// let entries = parse_score_lines("korosuke94,120000\nギルド対戦\na,b,c\n");
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].name, "korosuke94");
/// ```
pub fn parse_score_lines(response: &str) -> Vec<RawEntry> {
    response
        .trim()
        .lines()
        .filter_map(parse_score_line)
        .collect()
}

/// 1行をパース
///
/// カンマで分割してちょうど2フィールドになり、かつ両方が空でない場合のみ採用
pub fn parse_score_line(line: &str) -> Option<RawEntry> {
    let mut parts = line.split(',');
    let name = parts.next()?.trim();
    let score = parts.next()?.trim();
    if parts.next().is_some() {
        return None;
    }
    if name.is_empty() || score.is_empty() {
        return None;
    }
    Some(RawEntry::new(name, score))
}

/// `extract` の出力（全体）か、RawEntry の配列のどちらでも受け付ける
#[derive(Deserialize)]
#[serde(untagged)]
enum ExtractedInput {
    Report { entries: Vec<RawEntry> },
    Entries(Vec<RawEntry>),
}

/// 保存済みの読み取り結果JSONから RawEntry を取り出す
pub fn parse_extracted_json(content: &str) -> Result<Vec<RawEntry>> {
    let input: ExtractedInput = serde_json::from_str(content).map_err(|_| {
        Error::Parse(
            "読み取り結果JSONの形式が不正です（`extract` の出力か、{name, score} の配列を指定してください）"
                .into(),
        )
    })?;
    Ok(match input {
        ExtractedInput::Report { entries } => entries,
        ExtractedInput::Entries(entries) => entries,
    })
}
