use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreSheetError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("Gemini APIキーが設定されていません。`score-sheet config --set-api-key YOUR_KEY` または環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("スプレッドシートIDが設定されていません。`--spreadsheet-id` か `score-sheet config --set-spreadsheet-id` で指定してください")]
    MissingSpreadsheetId,

    #[error("Google Sheetsのアクセストークンがありません。環境変数 GOOGLE_SHEETS_TOKEN を設定してください")]
    MissingSheetsToken,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("シートが見つかりません: {0}")]
    SheetNotFound(String),

    #[error("Google Sheets APIエラー: {0}")]
    SheetsApi(String),

    #[error("Excelブックエラー: {0}")]
    Workbook(String),

    #[error("タスクが見つかりません: {0}（`score-sheet tasks` で一覧を表示）")]
    UnknownTask(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] score_sheet_common::Error),
}

pub type Result<T> = std::result::Result<T, ScoreSheetError>;
