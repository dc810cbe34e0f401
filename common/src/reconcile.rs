//! 名前照合モジュール
//!
//! AIが読み取った名前を正規の名簿と照合する。
//!
//! ## スコア計算
//! - 類似度: 0.0〜100.0（`Similarity` 実装による、丸めない）
//! - ペナルティ: 文字数差 × `length_penalty`
//! - 総合点: 類似度 - ペナルティ（負になりうる）
//!
//! 総合点が最大の候補を採用し、同点なら名簿順で先の候補を優先する。
//! 閾値との比較は丸める前の総合点で行う（84.6点は85点扱いにしない）。
//! 純粋な類似度だけだと、短い読み取り文字列と多くの文字を共有する長い名前が
//! 高得点になりやすいため、文字数差にペナルティを課す。

use crate::error::{Error, Result};
use crate::similarity::Similarity;
use crate::types::{MatchResult, MatchStatus, OutputRow, RawEntry, Roster};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// 要確認の行に付ける接頭辞
pub const REVIEW_SENTINEL: &str = "【要確認】";

/// 総合点が閾値未満のときの書き込み方針
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LowConfidencePolicy {
    /// 読み取った名前に要確認マークを付けて書き込む（AIの推測で上書きしない）
    #[default]
    MarkForReview,
    /// 最良候補の名前で書き込み、確認依頼だけ出す
    KeepBestGuess,
}

/// 照合設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchSettings {
    /// この総合点以上なら確認なしで採用
    pub similarity_threshold: i32,
    /// 文字数差1あたりのペナルティ
    pub length_penalty: i32,
    pub low_confidence: LowConfidencePolicy,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 85,
            length_penalty: 15,
            low_confidence: LowConfidencePolicy::MarkForReview,
        }
    }
}

impl MatchSettings {
    /// 設定値の範囲チェック（閾値 0〜100、ペナルティ 0以上）
    pub fn validate(&self) -> Result<()> {
        if !(0..=100).contains(&self.similarity_threshold) {
            return Err(Error::Config("閾値は0〜100で指定してください".into()));
        }
        if self.length_penalty < 0 {
            return Err(Error::Config("文字数差ペナルティは0以上で指定してください".into()));
        }
        Ok(())
    }
}

/// 確認依頼の種類
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ReviewKind {
    /// 候補はあるが総合点が閾値未満
    LowConfidence {
        candidate: String,
        final_score: f64,
        similarity: f64,
        /// 候補名で書き込んだか
        applied: bool,
    },
    /// 最良候補の総合点が0点以下
    NoReliableCandidate { final_score: f64 },
    /// 候補を1件も評価できなかった
    NoCandidate,
}

/// 実行後にユーザーへ表示する確認依頼
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMessage {
    pub extracted_name: String,
    pub score: String,
    pub kind: ReviewKind,
}

impl fmt::Display for ReviewMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.extracted_name;
        match &self.kind {
            ReviewKind::LowConfidence {
                candidate,
                final_score,
                similarity,
                applied: true,
            } => write!(
                f,
                "⚠️ 要確認: AIは「{name}」と読み取りましたが、総合判断の結果「{candidate}」として処理しました。（総合点: {final_score:.1}点 / 類似度: {similarity:.1}点）"
            ),
            ReviewKind::LowConfidence {
                candidate,
                final_score,
                similarity,
                applied: false,
            } => write!(
                f,
                "⚠️ 要確認: AIは「{name}」と読み取りました。最有力候補は「{candidate}」ですが、確信度が低いため書き換えずに要確認として書き込みました。（総合点: {final_score:.1}点 / 類似度: {similarity:.1}点）"
            ),
            ReviewKind::NoReliableCandidate { final_score } => write!(
                f,
                "🚨 処理不可: AIは「{name}」と読み取りましたが、信頼できる候補が見つかりませんでした（総合点: {final_score:.1}点）。書き換えを行わず、手動確認をお願いします。"
            ),
            ReviewKind::NoCandidate => write!(
                f,
                "🚨 処理不可: AIは「{name}」と読み取りましたが、メンバーリストに一致する候補が見つかりませんでした。手動で確認してください。"
            ),
        }
    }
}

/// 照合結果一式
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// 重複除去済みの書き込み行
    pub rows: Vec<OutputRow>,
    /// 確認依頼（入力順）
    pub reviews: Vec<ReviewMessage>,
    /// 入力1件ごとの照合結果（名簿が空の場合は空）
    pub matches: Vec<MatchResult>,
}

/// 1件の名前を名簿と照合
///
/// 名簿が空の場合は `NoCandidate` を返す（`reconcile` はその前に素通しする）
pub fn match_name<S: Similarity + ?Sized>(
    extracted_name: &str,
    roster: &Roster,
    settings: &MatchSettings,
    scorer: &S,
) -> MatchResult {
    let extracted_len = extracted_name.chars().count();

    // (候補名, 総合点, 類似度)
    let mut best: Option<(&str, f64, f64)> = None;
    for candidate in roster.names() {
        let similarity = scorer.similarity(extracted_name, candidate);
        let len_diff = extracted_len.abs_diff(candidate.chars().count());
        let penalty = len_diff as f64 * f64::from(settings.length_penalty);
        let final_score = similarity - penalty;

        if best.map_or(true, |(_, top, _)| final_score > top) {
            best = Some((candidate.as_str(), final_score, similarity));
        }
    }

    let Some((candidate, final_score, similarity)) = best else {
        return MatchResult {
            extracted_name: extracted_name.to_string(),
            resolved_name: String::new(),
            confidence_score: 0.0,
            similarity: 0.0,
            status: MatchStatus::NoCandidate,
        };
    };

    let status = if final_score <= 0.0 {
        MatchStatus::NoCandidate
    } else if final_score < f64::from(settings.similarity_threshold) {
        MatchStatus::LowConfidence
    } else {
        MatchStatus::Matched
    };

    MatchResult {
        extracted_name: extracted_name.to_string(),
        resolved_name: candidate.to_string(),
        confidence_score: final_score,
        similarity,
        status,
    }
}

/// 読み取り結果全体を照合し、重複を除いた書き込み行と確認依頼を返す
///
/// # Arguments
/// * `raw` - AIの読み取り結果（出現順）
/// * `roster` - 正規の名簿
/// * `settings` - 閾値・ペナルティ・低確信度時の方針
/// * `scorer` - 類似度の計算方法
pub fn reconcile<S: Similarity + ?Sized>(
    raw: &[RawEntry],
    roster: &Roster,
    settings: &MatchSettings,
    scorer: &S,
) -> Reconciliation {
    // 名簿が空なら照合しない（エラーにもしない）
    if roster.is_empty() {
        let rows = raw.iter().cloned().map(OutputRow::from).collect();
        return Reconciliation {
            rows: dedup_rows(rows),
            ..Default::default()
        };
    }

    let mut rows = Vec::with_capacity(raw.len());
    let mut reviews = Vec::new();
    let mut matches = Vec::with_capacity(raw.len());

    for entry in raw {
        let result = match_name(&entry.name, roster, settings, scorer);
        let (row, review) = resolve_row(entry, &result, settings.low_confidence);
        rows.push(row);
        reviews.extend(review);
        matches.push(result);
    }

    Reconciliation {
        rows: dedup_rows(rows),
        reviews,
        matches,
    }
}

/// 照合結果から書き込み行と確認依頼を決める
fn resolve_row(
    entry: &RawEntry,
    result: &MatchResult,
    policy: LowConfidencePolicy,
) -> (OutputRow, Option<ReviewMessage>) {
    let marked = || OutputRow::new(format!("{REVIEW_SENTINEL}{}", entry.name), entry.score.clone());
    let review = |kind| ReviewMessage {
        extracted_name: entry.name.clone(),
        score: entry.score.clone(),
        kind,
    };

    match result.status {
        MatchStatus::Matched => (
            OutputRow::new(result.resolved_name.clone(), entry.score.clone()),
            None,
        ),
        MatchStatus::LowConfidence => {
            let applied = policy == LowConfidencePolicy::KeepBestGuess;
            let row = if applied {
                OutputRow::new(result.resolved_name.clone(), entry.score.clone())
            } else {
                marked()
            };
            let kind = ReviewKind::LowConfidence {
                candidate: result.resolved_name.clone(),
                final_score: result.confidence_score,
                similarity: result.similarity,
                applied,
            };
            (row, Some(review(kind)))
        }
        MatchStatus::NoCandidate if result.resolved_name.is_empty() => {
            (marked(), Some(review(ReviewKind::NoCandidate)))
        }
        MatchStatus::NoCandidate => {
            let kind = ReviewKind::NoReliableCandidate {
                final_score: result.confidence_score,
            };
            (marked(), Some(review(kind)))
        }
    }
}

/// 完全に同じ (名前, スコア) の行を除去（最初の出現順を保持）
pub fn dedup_rows(rows: Vec<OutputRow>) -> Vec<OutputRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::IndelRatio;

    fn roster(names: &[&str]) -> Roster {
        Roster::from_values(names.iter().copied())
    }

    fn run(raw: &[RawEntry], names: &[&str]) -> Reconciliation {
        reconcile(raw, &roster(names), &MatchSettings::default(), &IndelRatio)
    }

    #[test]
    fn test_exact_name_is_matched() {
        let result = match_name(
            "korosuke94",
            &roster(&["korosuke94", "あーる 0113"]),
            &MatchSettings::default(),
            &IndelRatio,
        );
        assert_eq!(result.similarity, 100.0);
        assert_eq!(result.confidence_score, 100.0);
        assert_eq!(result.status, MatchStatus::Matched);
        assert_eq!(result.resolved_name, "korosuke94");
    }

    #[test]
    fn test_exact_name_row_and_no_review() {
        let out = run(
            &[RawEntry::new("korosuke94", "120000")],
            &["korosuke94", "あーる 0113"],
        );
        assert_eq!(out.rows, vec![OutputRow::new("korosuke94", "120000")]);
        assert!(out.reviews.is_empty());
    }

    #[test]
    fn test_every_roster_name_matches_itself() {
        let names = ["korosuke94", "あーる 0113", "暇神", "3666666666666663", "a"];
        for name in names {
            let result = match_name(name, &roster(&names), &MatchSettings::default(), &IndelRatio);
            assert_eq!(result.status, MatchStatus::Matched, "{name}");
            assert_eq!(result.resolved_name, name);
            assert_eq!(result.confidence_score, 100.0);
        }
    }

    #[test]
    fn test_one_extra_char_is_low_confidence() {
        // 類似度80 - ペナルティ15 = 65
        let out = run(&[RawEntry::new("暇神a", "500")], &["暇神"]);
        assert_eq!(out.matches[0].status, MatchStatus::LowConfidence);
        assert_eq!(out.matches[0].confidence_score, 65.0);
        assert_eq!(out.matches[0].similarity, 80.0);
        assert_eq!(out.reviews.len(), 1);
        assert_eq!(out.rows, vec![OutputRow::new("【要確認】暇神a", "500")]);

        let text = out.reviews[0].to_string();
        assert!(text.contains("暇神a"));
        assert!(text.contains("「暇神」"));
        assert!(text.contains("65.0点"));
        assert!(text.contains("80.0点"));
    }

    #[test]
    fn test_keep_best_guess_policy_writes_candidate() {
        let settings = MatchSettings {
            low_confidence: LowConfidencePolicy::KeepBestGuess,
            ..Default::default()
        };
        let out = reconcile(
            &[RawEntry::new("暇神a", "500")],
            &roster(&["暇神"]),
            &settings,
            &IndelRatio,
        );
        assert_eq!(out.rows, vec![OutputRow::new("暇神", "500")]);
        assert_eq!(out.reviews.len(), 1);
        assert!(matches!(
            out.reviews[0].kind,
            ReviewKind::LowConfidence { applied: true, .. }
        ));
    }

    #[test]
    fn test_all_candidates_non_positive_is_no_candidate() {
        let out = run(&[RawEntry::new("xyz", "10")], &["abcdefgh", "ijklmnop"]);
        assert_eq!(out.matches[0].status, MatchStatus::NoCandidate);
        assert!(out.matches[0].confidence_score <= 0.0);
        assert_eq!(out.rows, vec![OutputRow::new("【要確認】xyz", "10")]);
        assert_eq!(out.reviews.len(), 1);
        assert!(matches!(
            out.reviews[0].kind,
            ReviewKind::NoReliableCandidate { .. }
        ));
    }

    #[test]
    fn test_zero_score_is_no_candidate() {
        // 類似度0, 文字数差0 → 総合点0 は信頼できない
        let result = match_name("abc", &roster(&["xyz"]), &MatchSettings::default(), &IndelRatio);
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.status, MatchStatus::NoCandidate);
    }

    #[test]
    fn test_score_just_below_threshold_is_not_rounded_up() {
        // 類似度84.6（LCS 11 / 13+13文字）、文字数差0
        let result = match_name(
            "abcdefghijklm",
            &roster(&["abcdefghijkxy"]),
            &MatchSettings::default(),
            &IndelRatio,
        );
        assert!(result.confidence_score < 85.0);
        assert_eq!(result.status, MatchStatus::LowConfidence);
    }

    #[test]
    fn test_huge_length_penalty_does_not_overflow() {
        let settings = MatchSettings {
            length_penalty: i32::MAX,
            ..Default::default()
        };
        let result = match_name("ab", &roster(&["abcd"]), &settings, &IndelRatio);
        assert_eq!(result.status, MatchStatus::NoCandidate);
        assert!(result.confidence_score < 0.0);
    }

    #[test]
    fn test_validate_settings() {
        assert!(MatchSettings::default().validate().is_ok());

        let too_high = MatchSettings { similarity_threshold: 101, ..Default::default() };
        let err = too_high.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("閾値は0〜100"));

        let negative = MatchSettings { similarity_threshold: -1, ..Default::default() };
        assert!(negative.validate().is_err());

        let negative_penalty = MatchSettings { length_penalty: -5, ..Default::default() };
        let err = negative_penalty.validate().unwrap_err();
        assert!(err.to_string().contains("ペナルティ"));
    }

    #[test]
    fn test_threshold_boundary_is_matched() {
        struct Fixed(f64);
        impl Similarity for Fixed {
            fn similarity(&self, _: &str, _: &str) -> f64 {
                self.0
            }
        }
        let names = roster(&["abc"]);
        let settings = MatchSettings::default();
        assert_eq!(match_name("abd", &names, &settings, &Fixed(85.0)).status, MatchStatus::Matched);
        assert_eq!(
            match_name("abd", &names, &settings, &Fixed(84.99)).status,
            MatchStatus::LowConfidence
        );
        assert_eq!(
            match_name("abd", &names, &settings, &Fixed(0.5)).status,
            MatchStatus::LowConfidence
        );
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        // どちらも類似度86・文字数差1
        let result = match_name(
            "abcd",
            &roster(&["abc", "bcd"]),
            &MatchSettings { length_penalty: 0, ..Default::default() },
            &IndelRatio,
        );
        assert_eq!(result.resolved_name, "abc");
    }

    #[test]
    fn test_length_penalty_prefers_same_length() {
        // 長い名前は共有文字が多くても文字数差で減点される
        let result = match_name(
            "korosuke",
            &roster(&["korosuke94_longname", "korosukf"]),
            &MatchSettings::default(),
            &IndelRatio,
        );
        assert_eq!(result.resolved_name, "korosukf");
    }

    #[test]
    fn test_empty_roster_passes_through() {
        let raw = vec![
            RawEntry::new("暇神a", "500"),
            RawEntry::new("korosuke94", "120000"),
        ];
        let out = run(&raw, &[]);
        assert_eq!(
            out.rows,
            vec![
                OutputRow::new("暇神a", "500"),
                OutputRow::new("korosuke94", "120000"),
            ]
        );
        assert!(out.reviews.is_empty());
        assert!(out.matches.is_empty());
    }

    #[test]
    fn test_match_name_on_empty_roster_is_no_candidate() {
        let result = match_name("暇神", &Roster::default(), &MatchSettings::default(), &IndelRatio);
        assert_eq!(result.status, MatchStatus::NoCandidate);
        assert!(result.resolved_name.is_empty());
    }

    #[test]
    fn test_duplicates_collapse_after_resolution() {
        // 読み取り揺れが同じ正規名に解決され、同じスコアなら1行になる
        let settings = MatchSettings {
            low_confidence: LowConfidencePolicy::KeepBestGuess,
            ..Default::default()
        };
        let out = reconcile(
            &[
                RawEntry::new("暇神", "500"),
                RawEntry::new("暇神a", "500"),
                RawEntry::new("暇神", "600"),
            ],
            &roster(&["暇神"]),
            &settings,
            &IndelRatio,
        );
        assert_eq!(
            out.rows,
            vec![OutputRow::new("暇神", "500"), OutputRow::new("暇神", "600")]
        );
        assert_eq!(out.matches.len(), 3);
    }

    #[test]
    fn test_dedup_preserves_first_occurrence_order() {
        let rows = vec![
            OutputRow::new("b", "1"),
            OutputRow::new("a", "1"),
            OutputRow::new("b", "1"),
            OutputRow::new("b", "2"),
            OutputRow::new("a", "1"),
        ];
        let once = dedup_rows(rows);
        assert_eq!(
            once,
            vec![
                OutputRow::new("b", "1"),
                OutputRow::new("a", "1"),
                OutputRow::new("b", "2"),
            ]
        );
        assert_eq!(dedup_rows(once.clone()), once);
    }

    #[test]
    fn test_review_message_no_candidate_display() {
        let msg = ReviewMessage {
            extracted_name: "???".into(),
            score: "1".into(),
            kind: ReviewKind::NoCandidate,
        };
        assert!(msg.to_string().contains("メンバーリストに一致する候補が見つかりませんでした"));
    }

    #[test]
    fn test_settings_json_partial() {
        let settings: MatchSettings = serde_json::from_str(r#"{"lengthPenalty": 10}"#).unwrap();
        assert_eq!(settings.length_penalty, 10);
        assert_eq!(settings.similarity_threshold, 85);
        assert_eq!(settings.low_confidence, LowConfidencePolicy::MarkForReview);
    }
}
