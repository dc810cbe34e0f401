//! 書き込み行をシートの2列ブロックとして書き込む

use super::{CellRef, SheetStore};
use crate::error::Result;
use score_sheet_common::{OutputRow, WriteLayout};

/// 書き込み結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub sheet: String,
    /// 書き込み開始セル（0件の場合は None）
    pub origin: Option<CellRef>,
    pub rows_written: usize,
}

/// 行を書き込む
///
/// # Arguments
/// * `store` - 書き込み先
/// * `sheet` - シート名
/// * `layout` - 固定位置か、目印行の次の空き列か
/// * `rows` - 書き込む行（0件ならストアに一切アクセスしない）
pub async fn write_rows<S: SheetStore>(
    store: &mut S,
    sheet: &str,
    layout: &WriteLayout,
    rows: &[OutputRow],
) -> Result<WriteSummary> {
    if rows.is_empty() {
        return Ok(WriteSummary {
            sheet: sheet.to_string(),
            origin: None,
            rows_written: 0,
        });
    }

    let origin = match *layout {
        WriteLayout::FixedColumns { row, col } => CellRef::new(row, col),
        WriteLayout::AppendColumns { marker_row, start_row } => {
            let used = store.row_values(sheet, marker_row).await?;
            CellRef::new(start_row, used.len() as u32 + 1)
        }
    };

    let values: Vec<Vec<String>> = rows
        .iter()
        .map(|r| vec![r.name.clone(), r.score.clone()])
        .collect();

    store.update_block(sheet, origin, &values).await?;

    Ok(WriteSummary {
        sheet: sheet.to_string(),
        origin: Some(origin),
        rows_written: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoreSheetError;
    use crate::sheets::MemorySheets;

    fn rows() -> Vec<OutputRow> {
        vec![
            OutputRow::new("korosuke94", "120000"),
            OutputRow::new("暇神", "500"),
        ]
    }

    #[tokio::test]
    async fn test_fixed_columns() {
        let mut sheets = MemorySheets::new().with_sheet("探索入力");
        let layout = WriteLayout::FixedColumns { row: 3, col: 1 };

        let summary = write_rows(&mut sheets, "探索入力", &layout, &rows()).await.unwrap();

        assert_eq!(summary.origin, Some(CellRef::new(3, 1)));
        assert_eq!(summary.rows_written, 2);
        assert_eq!(sheets.get("探索入力", CellRef::new(3, 1)), Some("korosuke94"));
        assert_eq!(sheets.get("探索入力", CellRef::new(3, 2)), Some("120000"));
        assert_eq!(sheets.get("探索入力", CellRef::new(4, 1)), Some("暇神"));
        assert_eq!(sheets.get("探索入力", CellRef::new(4, 2)), Some("500"));
    }

    #[tokio::test]
    async fn test_append_columns_after_marker_row() {
        let mut sheets = MemorySheets::new().with_sheet("遠征入力");
        for col in 1..=4 {
            sheets.set("遠征入力", CellRef::new(3, col), format!("既存{col}")).unwrap();
        }
        let layout = WriteLayout::AppendColumns { marker_row: 3, start_row: 3 };

        let summary = write_rows(&mut sheets, "遠征入力", &layout, &rows()).await.unwrap();

        assert_eq!(summary.origin, Some(CellRef::new(3, 5)));
        assert_eq!(sheets.get("遠征入力", CellRef::new(3, 5)), Some("korosuke94"));
        assert_eq!(sheets.get("遠征入力", CellRef::new(3, 6)), Some("120000"));
        assert_eq!(sheets.get("遠征入力", CellRef::new(4, 5)), Some("暇神"));
        assert_eq!(sheets.get("遠征入力", CellRef::new(3, 4)), Some("既存4"));
    }

    #[tokio::test]
    async fn test_append_columns_on_empty_sheet_starts_at_a() {
        let mut sheets = MemorySheets::new().with_sheet("遠征入力");
        let layout = WriteLayout::AppendColumns { marker_row: 3, start_row: 3 };
        let summary = write_rows(&mut sheets, "遠征入力", &layout, &rows()).await.unwrap();
        assert_eq!(summary.origin, Some(CellRef::new(3, 1)));
    }

    #[tokio::test]
    async fn test_empty_rows_do_not_touch_store() {
        // シートが存在しなくてもエラーにならない = ストアを呼んでいない
        let mut sheets = MemorySheets::new();
        let layout = WriteLayout::AppendColumns { marker_row: 3, start_row: 3 };
        let summary = write_rows(&mut sheets, "遠征入力", &layout, &[]).await.unwrap();
        assert_eq!(summary.rows_written, 0);
        assert!(summary.origin.is_none());
    }

    #[tokio::test]
    async fn test_missing_sheet_is_sheet_not_found() {
        let mut sheets = MemorySheets::new();
        let layout = WriteLayout::FixedColumns { row: 3, col: 1 };
        let result = write_rows(&mut sheets, "探索入力", &layout, &rows()).await;
        assert!(matches!(result, Err(ScoreSheetError::SheetNotFound(ref s)) if s == "探索入力"));
    }
}
