use super::{trim_trailing_empty, CellRef, SheetStore};
use crate::error::{Result, ScoreSheetError};
use std::collections::BTreeMap;

/// メモリ上のシート群（シートの並び順を保持）
#[derive(Debug, Clone, Default)]
pub struct MemorySheets {
    sheets: Vec<(String, BTreeMap<CellRef, String>)>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// 空のシートを追加（既にあれば何もしない）
    pub fn add_sheet(&mut self, name: &str) {
        if self.sheet(name).is_none() {
            self.sheets.push((name.to_string(), BTreeMap::new()));
        }
    }

    pub fn with_sheet(mut self, name: &str) -> Self {
        self.add_sheet(name);
        self
    }

    /// 値を1セル設定（空文字はセル削除）
    pub fn set(&mut self, sheet: &str, cell: CellRef, value: impl Into<String>) -> Result<()> {
        let grid = self.sheet_mut(sheet)?;
        let value = value.into();
        if value.is_empty() {
            grid.remove(&cell);
        } else {
            grid.insert(cell, value);
        }
        Ok(())
    }

    pub fn get(&self, sheet: &str, cell: CellRef) -> Option<&str> {
        self.sheet(sheet)?.get(&cell).map(String::as_str)
    }

    /// シートの全セル（行→列の順）
    pub fn cells(&self, sheet: &str) -> Option<impl Iterator<Item = (&CellRef, &String)>> {
        self.sheet(sheet).map(|grid| grid.iter())
    }

    pub fn names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn sheet(&self, name: &str) -> Option<&BTreeMap<CellRef, String>> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut BTreeMap<CellRef, String>> {
        self.sheets
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
            .ok_or_else(|| ScoreSheetError::SheetNotFound(name.to_string()))
    }

    fn grid(&self, name: &str) -> Result<&BTreeMap<CellRef, String>> {
        self.sheet(name)
            .ok_or_else(|| ScoreSheetError::SheetNotFound(name.to_string()))
    }

    pub(super) fn read_column(&self, sheet: &str, col: u32) -> Result<Vec<String>> {
        let grid = self.grid(sheet)?;
        let Some(last) = grid.keys().filter(|c| c.col == col).map(|c| c.row).max() else {
            return Ok(Vec::new());
        };
        let values = (1..=last)
            .map(|row| grid.get(&CellRef::new(row, col)).cloned().unwrap_or_default())
            .collect();
        Ok(trim_trailing_empty(values))
    }

    pub(super) fn read_row(&self, sheet: &str, row: u32) -> Result<Vec<String>> {
        let grid = self.grid(sheet)?;
        let Some(last) = grid.keys().filter(|c| c.row == row).map(|c| c.col).max() else {
            return Ok(Vec::new());
        };
        let values = (1..=last)
            .map(|col| grid.get(&CellRef::new(row, col)).cloned().unwrap_or_default())
            .collect();
        Ok(trim_trailing_empty(values))
    }

    pub(super) fn write_block(&mut self, sheet: &str, origin: CellRef, values: &[Vec<String>]) -> Result<()> {
        // シートの存在を先に確認し、途中まで書かれる状態を作らない
        self.grid(sheet)?;
        for (r, row) in values.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let cell = CellRef::new(origin.row + r as u32, origin.col + c as u32);
                self.set(sheet, cell, value.clone())?;
            }
        }
        Ok(())
    }
}

impl SheetStore for MemorySheets {
    async fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.names())
    }

    async fn column_values(&self, sheet: &str, col: u32) -> Result<Vec<String>> {
        self.read_column(sheet, col)
    }

    async fn row_values(&self, sheet: &str, row: u32) -> Result<Vec<String>> {
        self.read_row(sheet, row)
    }

    async fn update_block(&mut self, sheet: &str, origin: CellRef, values: &[Vec<String>]) -> Result<()> {
        self.write_block(sheet, origin, values)
    }
}
