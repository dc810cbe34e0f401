//! Google Sheets API v4 バックエンド
//!
//! アクセストークンの取得は対象外（設定または環境変数で渡す）。

use super::{a1_range, quote_sheet, trim_trailing_empty, CellRef, SheetStore};
use crate::error::{Result, ScoreSheetError};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'a str,
    values: &'a [Vec<String>],
}

pub struct GoogleSheets {
    http: reqwest::Client,
    spreadsheet_id: String,
    access_token: String,
}

impl GoogleSheets {
    pub fn new(spreadsheet_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ScoreSheetError::SheetsApi(format!("HTTPクライアント作成失敗: {}", e)))?;
        Ok(Self {
            http,
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
        })
    }

    /// spreadsheets/{id}/values/{range} のURL（範囲はパーセントエンコード）
    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = self.spreadsheet_url()?;
        url.path_segments_mut()
            .map_err(|_| ScoreSheetError::SheetsApi("URLを組み立てられません".into()))?
            .push("values")
            .push(range);
        Ok(url)
    }

    fn spreadsheet_url(&self) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| ScoreSheetError::SheetsApi(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ScoreSheetError::SheetsApi("URLを組み立てられません".into()))?
            .push(&self.spreadsheet_id);
        Ok(url)
    }

    async fn read_range(&self, sheet: &str, range: &str, major_dimension: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.values_url(range)?)
            .bearer_auth(&self.access_token)
            .query(&[("majorDimension", major_dimension)])
            .send()
            .await
            .map_err(|e| ScoreSheetError::SheetsApi(e.to_string()))?;

        let body = check_status(response, sheet).await?;
        let value_range: ValueRange = serde_json::from_str(&body)?;
        let values = value_range
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .iter()
            .map(cell_text)
            .collect();
        Ok(trim_trailing_empty(values))
    }
}

impl SheetStore for GoogleSheets {
    async fn sheet_names(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.spreadsheet_url()?)
            .bearer_auth(&self.access_token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await
            .map_err(|e| ScoreSheetError::SheetsApi(e.to_string()))?;

        let body = check_status(response, "").await?;
        let meta: SpreadsheetMeta = serde_json::from_str(&body)?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn column_values(&self, sheet: &str, col: u32) -> Result<Vec<String>> {
        let letter = super::column_letter(col);
        let range = format!("{}!{}:{}", quote_sheet(sheet), letter, letter);
        self.read_range(sheet, &range, "COLUMNS").await
    }

    async fn row_values(&self, sheet: &str, row: u32) -> Result<Vec<String>> {
        let range = format!("{}!{}:{}", quote_sheet(sheet), row, row);
        self.read_range(sheet, &range, "ROWS").await
    }

    async fn update_block(&mut self, sheet: &str, origin: CellRef, values: &[Vec<String>]) -> Result<()> {
        let width = values.iter().map(Vec::len).max().unwrap_or(0) as u32;
        if values.is_empty() || width == 0 {
            return Ok(());
        }
        let to = CellRef::new(origin.row + values.len() as u32 - 1, origin.col + width - 1);
        let range = a1_range(sheet, origin, to);

        let body = ValueRangeBody {
            range: &range,
            major_dimension: "ROWS",
            values,
        };

        tracing::debug!("Sheets書き込み: {} ({}行)", range, values.len());

        let response = self
            .http
            .put(self.values_url(&range)?)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoreSheetError::SheetsApi(e.to_string()))?;

        check_status(response, sheet).await?;
        Ok(())
    }
}

/// ステータスを確認して本文を返す
async fn check_status(response: reqwest::Response, sheet: &str) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ScoreSheetError::SheetsApi(e.to_string()))?;
    if status.is_success() {
        return Ok(body);
    }
    Err(classify_error(status, &body, sheet))
}

fn classify_error(status: StatusCode, body: &str, sheet: &str) -> ScoreSheetError {
    // 存在しないシートを範囲に含めると 400 "Unable to parse range" が返る
    if status == StatusCode::BAD_REQUEST && body.contains("Unable to parse range") && !sheet.is_empty() {
        return ScoreSheetError::SheetNotFound(sheet.to_string());
    }
    if status == StatusCode::NOT_FOUND {
        return ScoreSheetError::Config("スプレッドシートが見つかりません。IDを確認してください".into());
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ScoreSheetError::Config(format!("スプレッドシートへのアクセスが拒否されました ({})", status));
    }
    let preview: String = body.chars().take(300).collect();
    ScoreSheetError::SheetsApi(format!("{} {}", status, preview))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleSheets {
        GoogleSheets::new("sheet-id-123", "token").unwrap()
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = client().values_url("'遠征入力'!E3:F4").unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://sheets.googleapis.com/v4/spreadsheets/sheet-id-123/values/"));
        assert!(!s.contains("遠征"));
        assert!(s.contains("E3:F4"));
    }

    #[test]
    fn test_classify_missing_sheet() {
        let body = r#"{"error": {"code": 400, "message": "Unable to parse range: '探索入力'!1:1"}}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body, "探索入力");
        assert!(matches!(err, ScoreSheetError::SheetNotFound(ref s) if s == "探索入力"));
    }

    #[test]
    fn test_classify_other_errors() {
        assert!(matches!(
            classify_error(StatusCode::NOT_FOUND, "", "x"),
            ScoreSheetError::Config(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, "oops", "x"),
            ScoreSheetError::SheetsApi(_)
        ));
    }

    #[test]
    fn test_value_range_parse() {
        let body = r#"{"range": "'メンバー'!A1:A4", "majorDimension": "COLUMNS", "values": [["korosuke94", "", 120000, "暇神"]]}"#;
        let parsed: ValueRange = serde_json::from_str(body).unwrap();
        let values: Vec<String> = parsed.values[0].iter().map(cell_text).collect();
        assert_eq!(values, vec!["korosuke94", "", "120000", "暇神"]);
    }

    #[test]
    fn test_update_body_serialize() {
        let values = vec![vec!["暇神".to_string(), "500".to_string()]];
        let body = ValueRangeBody {
            range: "'探索入力'!A3:B3",
            major_dimension: "ROWS",
            values: &values,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""majorDimension":"ROWS""#));
        assert!(json.contains(r#""values":[["暇神","500"]]"#));
    }
}
