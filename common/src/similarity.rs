//! 文字列類似度
//!
//! 照合ロジックは `Similarity` トレイトにだけ依存する。
//! 既定は Indel 比率（LCSベース、ファジーマッチ系ライブラリの `ratio` と同じ式）。

use serde::{Deserialize, Serialize};

/// 2つの文字列の類似度を 0.0〜100.0 で返す（100 = 完全一致）
///
/// 閾値判定は丸める前の値で行うため、実装側で丸めないこと
pub trait Similarity {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Indel 比率: `2 * LCS / (|a| + |b|) * 100`
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl Similarity for IndelRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 100.0;
        }
        let lcs = lcs_len(&a, &b);
        200.0 * lcs as f64 / total as f64
    }
}

/// 正規化レーベンシュタイン距離による類似度
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatio;

impl Similarity for LevenshteinRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b) * 100.0
    }
}

/// 設定ファイルから選べる類似度アルゴリズム
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SimilarityAlgorithm {
    #[default]
    Indel,
    Levenshtein,
}

impl Similarity for SimilarityAlgorithm {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityAlgorithm::Indel => IndelRatio.similarity(a, b),
            SimilarityAlgorithm::Levenshtein => LevenshteinRatio.similarity(a, b),
        }
    }
}

impl std::str::FromStr for SimilarityAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indel" | "ratio" => Ok(SimilarityAlgorithm::Indel),
            "levenshtein" | "lev" => Ok(SimilarityAlgorithm::Levenshtein),
            _ => Err(format!("Unknown algorithm: {}. Use indel or levenshtein", s)),
        }
    }
}

/// 最長共通部分列の長さ（1行分のDPテーブルで計算）
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if ca == cb { diag + 1 } else { up.max(row[j]) };
            diag = up;
        }
    }
    row[b.len()]
}
