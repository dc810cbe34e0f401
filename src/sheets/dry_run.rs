use super::{a1_range, CellRef, SheetStore};
use crate::error::Result;

/// 書き込み予定の範囲と値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub sheet: String,
    pub origin: CellRef,
    pub values: Vec<Vec<String>>,
}

impl PlannedWrite {
    pub fn range(&self) -> String {
        let width = self.values.iter().map(Vec::len).max().unwrap_or(1).max(1) as u32;
        let height = self.values.len().max(1) as u32;
        let to = CellRef::new(self.origin.row + height - 1, self.origin.col + width - 1);
        a1_range(&self.sheet, self.origin, to)
    }
}

/// 読み込みは委譲し、書き込みは記録だけするラッパー
pub struct DryRun<S> {
    inner: S,
    planned: Vec<PlannedWrite>,
}

impl<S: SheetStore> DryRun<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            planned: Vec::new(),
        }
    }

    pub fn planned(&self) -> &[PlannedWrite] {
        &self.planned
    }
}

impl<S: SheetStore> SheetStore for DryRun<S> {
    async fn sheet_names(&self) -> Result<Vec<String>> {
        self.inner.sheet_names().await
    }

    async fn column_values(&self, sheet: &str, col: u32) -> Result<Vec<String>> {
        self.inner.column_values(sheet, col).await
    }

    async fn row_values(&self, sheet: &str, row: u32) -> Result<Vec<String>> {
        self.inner.row_values(sheet, row).await
    }

    async fn update_block(&mut self, sheet: &str, origin: CellRef, values: &[Vec<String>]) -> Result<()> {
        // 実在しないシートへの書き込みは本番同様にエラーにする
        super::ensure_sheet(&self.inner, sheet).await?;
        self.planned.push(PlannedWrite {
            sheet: sheet.to_string(),
            origin,
            values: values.to_vec(),
        });
        Ok(())
    }
}
