//! タスク定義
//!
//! タスクごとに異なるのは「プロンプト内の名前の呼び方」「書き込み先シート」
//! 「書き込みレイアウト」の3点だけ。2つの組み込みタスクを既定値とする表で持つ。

use crate::error::{Error, Result};
use crate::prompts::{CHARACTER_NOUN, PLAYER_NOUN};
use serde::{Deserialize, Serialize};

/// 書き込みレイアウト（行・列は1始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum WriteLayout {
    /// 目印行の使用済み列数から次の空き列を求め、その列から2列に書き込む
    #[serde(rename_all = "camelCase")]
    AppendColumns { marker_row: u32, start_row: u32 },
    /// 固定の (行, 列) から2列に書き込む
    FixedColumns { row: u32, col: u32 },
}

impl std::fmt::Display for WriteLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteLayout::AppendColumns { marker_row, start_row } => {
                write!(f, "列追加（{}行目の次の空き列、{}行目から）", marker_row, start_row)
            }
            WriteLayout::FixedColumns { row, col } => {
                write!(f, "固定位置（{}行目・{}列目から）", row, col)
            }
        }
    }
}

/// 1タスク分の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProfile {
    /// CLIで指定するID（例: "expedition"）
    pub id: String,
    /// 表示名（例: "遠征入力"）
    pub label: String,
    /// プロンプト内の名前の呼び方
    pub noun: String,
    /// 書き込み先シート名
    pub sheet: String,
    pub layout: WriteLayout,
}

impl TaskProfile {
    pub fn prompt(&self) -> String {
        crate::prompts::build_extraction_prompt(&self.noun)
    }
}

/// 組み込みタスク（遠征入力・探索入力）
pub fn default_tasks() -> Vec<TaskProfile> {
    vec![
        TaskProfile {
            id: "expedition".into(),
            label: "遠征入力".into(),
            noun: PLAYER_NOUN.into(),
            sheet: "遠征入力".into(),
            layout: WriteLayout::AppendColumns {
                marker_row: 3,
                start_row: 3,
            },
        },
        TaskProfile {
            id: "exploration".into(),
            label: "探索入力".into(),
            noun: CHARACTER_NOUN.into(),
            sheet: "探索入力".into(),
            layout: WriteLayout::FixedColumns { row: 3, col: 1 },
        },
    ]
}

/// IDまたは表示名でタスクを探す
pub fn find_task<'a>(tasks: &'a [TaskProfile], key: &str) -> Result<&'a TaskProfile> {
    let key = key.trim();
    tasks
        .iter()
        .find(|t| t.id.eq_ignore_ascii_case(key) || t.label == key)
        .ok_or_else(|| {
            let known = tasks
                .iter()
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>()
                .join("/");
            Error::Config(format!("不明なタスク '{}' ({})", key, known))
        })
}
