use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use score_sheet_common::{LowConfidencePolicy, MatchSettings};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "score-sheet")]
#[command(about = "ゲームスクショAI読み取り・スプレッドシート自動入力ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// スクショを読み取り、名簿と照合してシートに書き込む
    Run {
        /// 画像ファイルまたはフォルダ（複数指定可）
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// タスク（expedition/exploration、省略時は対話選択）
        #[arg(short, long)]
        task: Option<String>,

        #[command(flatten)]
        target: TargetArgs,

        /// シートに書き込まず、書き込み予定だけを表示
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        matching: MatchArgs,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// スクショの読み取りだけを行い、JSONを出力
    Extract {
        /// 画像ファイルまたはフォルダ（複数指定可）
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// タスク（プロンプトの呼び方を決める、省略時は対話選択）
        #[arg(short, long)]
        task: Option<String>,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 読み取り済みJSONを名簿と照合（APIを呼ばない）
    Reconcile {
        /// `extract` が出力したJSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 名簿テキスト（1行1名）
        #[arg(long, conflicts_with_all = ["workbook", "spreadsheet_id"])]
        roster_file: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        matching: MatchArgs,

        /// 書き込み行のJSON出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 名簿・入力シートを持つ空の.xlsxを作成
    InitWorkbook {
        /// 作成するファイル
        #[arg(required = true)]
        path: PathBuf,

        /// 既存ファイルを上書き
        #[arg(long)]
        force: bool,
    },

    /// タスク一覧を表示
    Tasks,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// スプレッドシートIDを設定
        #[arg(long)]
        set_spreadsheet_id: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 書き込み先（未指定時は設定ファイルの値）
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// ローカルの.xlsxを使う
    #[arg(long, conflicts_with = "spreadsheet_id")]
    pub workbook: Option<PathBuf>,

    /// Google スプレッドシートID
    #[arg(long)]
    pub spreadsheet_id: Option<String>,
}

/// 照合パラメータの上書き
#[derive(Args, Debug, Clone, Default)]
pub struct MatchArgs {
    /// 採用する総合点の閾値（デフォルト85）
    #[arg(long)]
    pub threshold: Option<i32>,

    /// 文字数差1あたりの減点（デフォルト15）
    #[arg(long)]
    pub penalty: Option<i32>,

    /// 閾値未満でも最有力候補の名前で書き込む
    #[arg(long)]
    pub keep_best_guess: bool,
}

impl MatchArgs {
    /// 設定ファイルの照合設定にコマンドライン引数を上書きする
    pub fn apply(&self, base: &MatchSettings) -> Result<MatchSettings> {
        let mut settings = base.clone();
        if let Some(threshold) = self.threshold {
            settings.similarity_threshold = threshold;
        }
        if let Some(penalty) = self.penalty {
            settings.length_penalty = penalty;
        }
        if self.keep_best_guess {
            settings.low_confidence = LowConfidencePolicy::KeepBestGuess;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "score-sheet", "run", "--task", "expedition", "--workbook", "book.xlsx",
            "--threshold", "80", "--keep-best-guess", "a.png", "shots",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { paths, task, target, matching, dry_run, .. } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(task.as_deref(), Some("expedition"));
                assert_eq!(target.workbook, Some(PathBuf::from("book.xlsx")));
                assert_eq!(matching.threshold, Some(80));
                assert!(matching.keep_best_guess);
                assert!(!dry_run);
            }
            _ => panic!("runとして解析されていない"),
        }
    }

    #[test]
    fn test_workbook_conflicts_with_spreadsheet_id() {
        let result = Cli::try_parse_from([
            "score-sheet", "run", "--workbook", "b.xlsx", "--spreadsheet-id", "abc", "a.png",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_requires_paths() {
        assert!(Cli::try_parse_from(["score-sheet", "run"]).is_err());
    }

    #[test]
    fn test_match_args_override_config() {
        let args = MatchArgs {
            threshold: Some(70),
            penalty: None,
            keep_best_guess: true,
        };
        let settings = args.apply(&MatchSettings::default()).unwrap();
        assert_eq!(settings.similarity_threshold, 70);
        assert_eq!(settings.length_penalty, 15);
        assert_eq!(settings.low_confidence, LowConfidencePolicy::KeepBestGuess);
    }

    #[test]
    fn test_match_args_out_of_range_is_rejected() {
        let cli = Cli::try_parse_from([
            "score-sheet", "reconcile", "--threshold", "150", "entries.json",
        ])
        .unwrap();
        // 引数としては解析でき、適用時に弾く
        let Commands::Reconcile { matching, .. } = cli.command else {
            panic!("reconcileとして解析されていない");
        };
        let err = matching.apply(&MatchSettings::default()).unwrap_err();
        assert!(err.to_string().contains("閾値は0〜100"));

        let args = MatchArgs {
            penalty: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            args.apply(&MatchSettings::default()),
            Err(crate::error::ScoreSheetError::Common(score_sheet_common::Error::Config(_)))
        ));
    }
}
