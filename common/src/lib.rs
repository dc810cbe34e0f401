//! Score Sheet Common Library
//!
//! CLIと統合テストで共有される型と照合ロジック

pub mod error;
pub mod parser;
pub mod prompts;
pub mod reconcile;
pub mod retry;
pub mod similarity;
pub mod task;
pub mod types;

pub use error::{Error, Result};
pub use parser::{parse_extracted_json, parse_score_line, parse_score_lines};
pub use prompts::build_extraction_prompt;
pub use reconcile::{
    dedup_rows, match_name, reconcile, LowConfidencePolicy, MatchSettings, Reconciliation,
    ReviewKind, ReviewMessage, REVIEW_SENTINEL,
};
pub use retry::RetryPolicy;
pub use similarity::{IndelRatio, LevenshteinRatio, Similarity, SimilarityAlgorithm};
pub use task::{default_tasks, find_task, TaskProfile, WriteLayout};
pub use types::{MatchResult, MatchStatus, OutputRow, RawEntry, Roster};
