//! ローカル.xlsxバックエンド
//!
//! 開くときに全シートをcalamineで読み込み、書き込みのたびに
//! rust_xlsxwriterでファイル全体を書き直す。値はすべて文字列として保存する。

use super::{CellRef, MemorySheets, SheetStore};
use crate::error::{Result, ScoreSheetError};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

pub struct LocalWorkbook {
    path: PathBuf,
    sheets: MemorySheets,
}

impl LocalWorkbook {
    /// 既存の.xlsxを開く
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScoreSheetError::FileNotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| ScoreSheetError::Workbook(format!("{}: {}", path.display(), e)))?;

        let mut sheets = MemorySheets::new();
        for name in workbook.sheet_names() {
            sheets.add_sheet(&name);
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ScoreSheetError::Workbook(format!("{}: {}", name, e)))?;
            let (start_row, start_col) = range.start().unwrap_or((0, 0));

            for (r, c, value) in range.used_cells() {
                let text = cell_text(value);
                if text.is_empty() {
                    continue;
                }
                let cell = CellRef::new(start_row + r as u32 + 1, start_col + c as u32 + 1);
                sheets.set(&name, cell, text)?;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    /// メモリ上のシートから新しいブックを作って保存
    pub fn create(path: &Path, sheets: MemorySheets) -> Result<Self> {
        let workbook = Self {
            path: path.to_path_buf(),
            sheets,
        };
        workbook.save()?;
        Ok(workbook)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheets(&self) -> &MemorySheets {
        &self.sheets
    }

    pub fn save(&self) -> Result<()> {
        let mut workbook = Workbook::new();

        for name in self.sheets.names() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&name).map_err(xlsx_error)?;
            if let Some(cells) = self.sheets.cells(&name) {
                for (cell, value) in cells {
                    let col = u16::try_from(cell.col - 1).map_err(|_| {
                        ScoreSheetError::Workbook(format!("列番号が大きすぎます: {}", cell.col))
                    })?;
                    worksheet
                        .write_string(cell.row - 1, col, value.as_str())
                        .map_err(xlsx_error)?;
                }
            }
        }

        workbook.save(&self.path).map_err(xlsx_error)?;
        Ok(())
    }
}

impl SheetStore for LocalWorkbook {
    async fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.sheets.names())
    }

    async fn column_values(&self, sheet: &str, col: u32) -> Result<Vec<String>> {
        self.sheets.read_column(sheet, col)
    }

    async fn row_values(&self, sheet: &str, row: u32) -> Result<Vec<String>> {
        self.sheets.read_row(sheet, row)
    }

    async fn update_block(&mut self, sheet: &str, origin: CellRef, values: &[Vec<String>]) -> Result<()> {
        self.sheets.write_block(sheet, origin, values)?;
        self.save()
    }
}

fn cell_text(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> ScoreSheetError {
    ScoreSheetError::Workbook(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("暇神".into())), "暇神");
        assert_eq!(cell_text(&Data::Float(120000.0)), "120000");
        assert_eq!(cell_text(&Data::Int(42)), "42");
    }

    #[test]
    fn test_open_missing_file() {
        let result = LocalWorkbook::open(Path::new("/nonexistent/book.xlsx"));
        assert!(matches!(result, Err(ScoreSheetError::FileNotFound(_))));
    }
}
