//! Gemini API連携
//!
//! generateContent にプロンプトと画像1枚を送り、応答テキストを返す。
//! HTTP 429 は `RateLimited`、それ以外の失敗は `Failed` に分類する。

use super::types::{AttemptOutcome, PreparedImage, VisionModel};
use crate::error::{Result, ScoreSheetError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScoreSheetError::ApiCall(format!("HTTPクライアント作成失敗: {}", e)))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }
}

impl VisionModel for GeminiClient {
    async fn generate(&self, prompt: &str, image: &PreparedImage) -> AttemptOutcome {
        let request = build_request(prompt, image);

        tracing::debug!(
            "Gemini呼び出し: model={} image={}x{} payload={}bytes",
            self.model,
            image.width,
            image.height,
            image.data.len()
        );

        let response = match self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.status() == Some(StatusCode::TOO_MANY_REQUESTS) => {
                return AttemptOutcome::RateLimited(e.to_string())
            }
            Err(e) => return AttemptOutcome::Failed(format!("送信エラー: {}", e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return AttemptOutcome::Failed(format!("応答の読み込みに失敗: {}", e)),
        };

        classify_response(status, &body)
    }
}

fn build_request(prompt: &str, image: &PreparedImage) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: prompt.to_string() },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: 0.1,
            response_mime_type: "text/plain".to_string(),
        },
    }
}

/// HTTPステータスと本文から1回分の結果を決める
fn classify_response(status: StatusCode, body: &str) -> AttemptOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return AttemptOutcome::RateLimited(format!("API error: {} {}", status, preview(body)));
    }
    if !status.is_success() {
        return AttemptOutcome::Failed(format!("API error: {} {}", status, preview(body)));
    }

    match extract_text(body) {
        Some(text) => AttemptOutcome::Success(text),
        None => AttemptOutcome::Failed(format!("Empty response: {}", preview(body))),
    }
}

/// 最初の候補の全パートのテキストを連結
fn extract_text(body: &str) -> Option<String> {
    let response: GeminiResponse = serde_json::from_str(body).ok()?;
    let parts = response.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn preview(body: &str) -> String {
    body.chars().take(300).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> PreparedImage {
        PreparedImage {
            mime_type: "image/png".into(),
            data: "iVBORw0KGgo=".into(),
            width: 10,
            height: 10,
        }
    }

    #[test]
    fn test_request_serialize() {
        let request = build_request("テストプロンプト", &sample_image());
        let json = serde_json::to_string(&request).expect("シリアライズ失敗");
        assert!(json.contains(r#"{"text":"テストプロンプト"}"#));
        assert!(json.contains(r#""inline_data":{"mime_type":"image/png","data":"iVBORw0KGgo="}"#));
        assert!(json.contains(r#""responseMimeType":"text/plain""#));
    }

    #[test]
    fn test_classify_rate_limited() {
        let outcome = classify_response(StatusCode::TOO_MANY_REQUESTS, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#);
        assert!(matches!(outcome, AttemptOutcome::RateLimited(_)));
    }

    #[test]
    fn test_classify_other_error_is_failed() {
        let outcome = classify_response(StatusCode::BAD_REQUEST, "bad");
        assert!(matches!(outcome, AttemptOutcome::Failed(ref m) if m.contains("400")));

        let outcome = classify_response(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(matches!(outcome, AttemptOutcome::Failed(_)));
    }

    #[test]
    fn test_classify_success_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "korosuke94,120000\n"}, {"text": "暇神,500"}]
                }
            }]
        }"#;
        assert_eq!(
            classify_response(StatusCode::OK, body),
            AttemptOutcome::Success("korosuke94,120000\n暇神,500".into())
        );
    }

    #[test]
    fn test_classify_empty_candidates_is_failed() {
        let outcome = classify_response(StatusCode::OK, r#"{"candidates": []}"#);
        assert!(matches!(outcome, AttemptOutcome::Failed(_)));

        let outcome = classify_response(StatusCode::OK, r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert!(matches!(outcome, AttemptOutcome::Failed(_)));
    }

    #[test]
    fn test_endpoint_uses_model() {
        let client = GeminiClient::new("key", "gemini-flash-latest", Duration::from_secs(600)).unwrap();
        assert!(client.endpoint().ends_with("/gemini-flash-latest:generateContent"));
    }
}
