//! スプレッドシート入出力
//!
//! 書き込み先は `SheetStore` トレイトで抽象化する:
//! - GoogleSheets: Sheets API v4
//! - LocalWorkbook: ローカルの.xlsx（calamineで読み、rust_xlsxwriterで書き直す）
//! - MemorySheets: メモリ上のシート（LocalWorkbookの中身、テスト用）
//! - DryRun: 読み込みは委譲し、書き込みは記録だけする
//!
//! 行・列はすべて1始まり。

mod dry_run;
mod google;
mod memory;
mod workbook;
pub mod writer;

pub use dry_run::{DryRun, PlannedWrite};
pub use google::GoogleSheets;
pub use memory::MemorySheets;
pub use workbook::LocalWorkbook;
pub use writer::{write_rows, WriteSummary};

use crate::error::{Result, ScoreSheetError};

/// セル位置（1始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式（例: (3, 5) → "E3"）
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_letter(self.col), self.row)
    }
}

#[allow(async_fn_in_trait)]
pub trait SheetStore {
    /// シート名一覧
    async fn sheet_names(&self) -> Result<Vec<String>>;

    /// 列の値（上から、最後の空でないセルまで）
    async fn column_values(&self, sheet: &str, col: u32) -> Result<Vec<String>>;

    /// 行の値（左から、最後の空でないセルまで）
    async fn row_values(&self, sheet: &str, row: u32) -> Result<Vec<String>>;

    /// `origin` を左上とする矩形に値を上書き
    async fn update_block(&mut self, sheet: &str, origin: CellRef, values: &[Vec<String>]) -> Result<()>;
}

/// シートの存在確認
pub async fn ensure_sheet<S: SheetStore>(store: &S, sheet: &str) -> Result<()> {
    let names = store.sheet_names().await?;
    if names.iter().any(|n| n == sheet) {
        Ok(())
    } else {
        Err(ScoreSheetError::SheetNotFound(sheet.to_string()))
    }
}

/// 列番号を列記号に変換（1 → "A", 27 → "AA"）
pub fn column_letter(col: u32) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// シート名付きのA1範囲（例: 'メンバー'!A1:B3）
pub fn a1_range(sheet: &str, from: CellRef, to: CellRef) -> String {
    format!("{}!{}:{}", quote_sheet(sheet), from.to_a1(), to.to_a1())
}

/// シート名をシングルクォートで囲む（内部の ' は '' にエスケープ）
pub fn quote_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// 末尾の空セルを落とす
fn trim_trailing_empty(mut values: Vec<String>) -> Vec<String> {
    while values.last().is_some_and(|v| v.is_empty()) {
        values.pop();
    }
    values
}
