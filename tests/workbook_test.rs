//! ローカル.xlsxバックエンドのテスト

use score_sheet_ai::error::ScoreSheetError;
use score_sheet_ai::sheets::{write_rows, CellRef, LocalWorkbook, MemorySheets, SheetStore};
use score_sheet_common::{OutputRow, WriteLayout};
use tempfile::tempdir;

fn template() -> MemorySheets {
    let mut sheets = MemorySheets::new()
        .with_sheet("メンバー")
        .with_sheet("遠征入力")
        .with_sheet("探索入力");
    sheets.set("メンバー", CellRef::new(1, 1), "korosuke94").unwrap();
    sheets.set("メンバー", CellRef::new(3, 1), "暇神").unwrap();
    sheets
}

#[tokio::test]
async fn test_create_and_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("scores.xlsx");

    LocalWorkbook::create(&path, template()).unwrap();
    assert!(path.exists());

    let book = LocalWorkbook::open(&path).unwrap();
    assert_eq!(
        book.sheet_names().await.unwrap(),
        vec!["メンバー", "遠征入力", "探索入力"]
    );
    let roster = book.column_values("メンバー", 1).await.unwrap();
    assert_eq!(roster, vec!["korosuke94", "", "暇神"]);
}

#[tokio::test]
async fn test_write_persists_to_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("scores.xlsx");
    LocalWorkbook::create(&path, template()).unwrap();

    let mut book = LocalWorkbook::open(&path).unwrap();
    let rows = vec![
        OutputRow::new("korosuke94", "120000"),
        // 巨大な数値も文字列として保持される
        OutputRow::new("暇神", "123456789012345678901234"),
    ];
    let layout = WriteLayout::AppendColumns { marker_row: 3, start_row: 3 };
    write_rows(&mut book, "遠征入力", &layout, &rows).await.unwrap();
    let summary = write_rows(&mut book, "遠征入力", &layout, &rows[..1]).await.unwrap();
    assert_eq!(summary.origin, Some(CellRef::new(3, 3)));

    let reopened = LocalWorkbook::open(&path).unwrap();
    let sheets = reopened.sheets();
    assert_eq!(sheets.get("遠征入力", CellRef::new(3, 1)), Some("korosuke94"));
    assert_eq!(sheets.get("遠征入力", CellRef::new(4, 2)), Some("123456789012345678901234"));
    assert_eq!(sheets.get("遠征入力", CellRef::new(3, 3)), Some("korosuke94"));
    assert_eq!(sheets.get("遠征入力", CellRef::new(3, 4)), Some("120000"));
    // 他のシートは保持される
    assert_eq!(sheets.get("メンバー", CellRef::new(3, 1)), Some("暇神"));
}

#[tokio::test]
async fn test_write_to_missing_sheet() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("scores.xlsx");
    let mut book = LocalWorkbook::create(&path, MemorySheets::new().with_sheet("メンバー")).unwrap();

    let rows = vec![OutputRow::new("a", "1")];
    let layout = WriteLayout::FixedColumns { row: 3, col: 1 };
    let result = write_rows(&mut book, "探索入力", &layout, &rows).await;
    assert!(matches!(result, Err(ScoreSheetError::SheetNotFound(_))));
}

#[test]
fn test_open_invalid_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"not a workbook").unwrap();

    assert!(matches!(
        LocalWorkbook::open(&path),
        Err(ScoreSheetError::Workbook(_))
    ));
}
