use anyhow::Context;
use clap::Parser;
use score_sheet_ai::analyzer::{self, ExtractOptions, GeminiClient, TokioPacer};
use score_sheet_ai::cli::{Cli, Commands, TargetArgs};
use score_sheet_ai::config::Config;
use score_sheet_ai::error::ScoreSheetError;
use score_sheet_ai::pipeline::{self, Pipeline, RunOutcome, RunSummary};
use score_sheet_ai::progress::ImageProgress;
use score_sheet_ai::scanner::{self, ImageInfo};
use score_sheet_ai::sheets::{
    DryRun, GoogleSheets, LocalWorkbook, MemorySheets, PlannedWrite, SheetStore,
};
use score_sheet_common::{
    find_task, parse_extracted_json, reconcile, MatchSettings, MatchStatus, Roster, TaskProfile,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = dispatch(cli).await {
        eprintln!("\n❌ エラー: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load().context("設定ファイルを読み込めません")?;

    match cli.command {
        Commands::Run { paths, task, target, dry_run, matching, recursive } => {
            println!("🎮 score-sheet - 一括処理\n");

            let task = select_task(&config, task.as_deref())?;
            println!("タスク: {} → シート「{}」\n", task.label, task.sheet);

            // 1. 画像スキャン
            println!("[1/4] 画像をスキャン中...");
            let images = scanner::collect_images(&paths, recursive)?;
            println!("✔ {}枚の画像を検出\n", images.len());

            let job = RunJob {
                config: &config,
                task: &task,
                images: &images,
                settings: matching.apply(&config.matching.settings)?,
                vision: build_vision(&config)?,
            };

            // 画像もAPIキーもない状態ではシートに接続しない
            if let Err(reason) = pipeline::preflight(&images, job.vision.is_some()) {
                println!("⚠ 実行しませんでした: {}", reason);
                return Ok(());
            }

            match resolve_target(&config, &target)? {
                Target::Workbook(path) => {
                    let store = LocalWorkbook::open(&path)?;
                    run_with_store(store, dry_run, &job).await?;
                }
                Target::Google(id) => {
                    let store = GoogleSheets::new(id, config.sheets_token()?)?;
                    run_with_store(store, dry_run, &job).await?;
                }
            }
        }

        Commands::Extract { paths, task, output, recursive } => {
            println!("🔍 score-sheet - 読み取り\n");

            let task = select_task(&config, task.as_deref())?;
            let images = scanner::collect_images(&paths, recursive)?;
            if images.is_empty() {
                return Err(ScoreSheetError::NoImagesFound(display_paths(&paths)).into());
            }
            let vision = build_vision(&config)?.ok_or(ScoreSheetError::MissingApiKey)?;

            println!("[1/2] AI読み取り中... ({}枚)", images.len());
            let progress = ImageProgress::new(images.len());
            let mut pacer = TokioPacer;
            let report = analyzer::extract_scores(
                &vision,
                &mut pacer,
                &images,
                &task.prompt(),
                &ExtractOptions::from(&config),
                |i, total, name| progress.start_image(i, total, name),
            )
            .await;
            progress.finish();
            println!(
                "✔ {}件を読み取り（成功 {}/{}枚）\n",
                report.entries.len(),
                report.images_succeeded(),
                report.images_total
            );
            for failure in &report.failures {
                println!("  ⚠ {}: {}", failure.file_name, failure.reason);
            }

            println!("[2/2] 結果を出力中...");
            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✔ 結果を保存: {}", path.display());
                }
                None => println!("{}", json),
            }

            println!("\n✅ 読み取り完了");
        }

        Commands::Reconcile { input, roster_file, target, matching, output } => {
            println!("🧮 score-sheet - 名簿照合\n");

            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("{} を読み込めません", input.display()))?;
            let entries = parse_extracted_json(&content)?;
            println!("✔ 読み取り結果 {}件", entries.len());

            let roster = match roster_file {
                Some(path) => Roster::from_lines(&std::fs::read_to_string(&path)?),
                None => match resolve_target(&config, &target)? {
                    Target::Workbook(path) => {
                        fetch_roster(&LocalWorkbook::open(&path)?, &config.roster_sheet).await?
                    }
                    Target::Google(id) => {
                        let store = GoogleSheets::new(id, config.sheets_token()?)?;
                        fetch_roster(&store, &config.roster_sheet).await?
                    }
                },
            };
            println!("✔ 名簿 {}名\n", roster.len());

            let settings = matching.apply(&config.matching.settings)?;
            let result = reconcile(&entries, &roster, &settings, &config.matching.algorithm);

            if result.matches.is_empty() {
                println!("名簿が空のため照合せずにそのまま出力します");
            }
            for m in &result.matches {
                let mark = match m.status {
                    MatchStatus::Matched => "✔",
                    MatchStatus::LowConfidence => "△",
                    MatchStatus::NoCandidate => "✖",
                };
                println!(
                    "  {} {} → {} (総合点 {:.1}, 類似度 {:.1})",
                    mark, m.extracted_name, m.resolved_name, m.confidence_score, m.similarity
                );
            }

            print_reviews(&result.reviews);

            if let Some(path) = output {
                std::fs::write(&path, serde_json::to_string_pretty(&result.rows)?)?;
                println!("\n✔ 書き込み行を保存: {} ({}行)", path.display(), result.rows.len());
            }

            println!("\n✅ 照合完了");
        }

        Commands::InitWorkbook { path, force } => {
            if path.exists() && !force {
                return Err(ScoreSheetError::Config(format!(
                    "{} は既に存在します（上書きは --force）",
                    path.display()
                ))
                .into());
            }

            let mut sheets = MemorySheets::new().with_sheet(&config.roster_sheet);
            for task in &config.tasks {
                sheets.add_sheet(&task.sheet);
            }
            let workbook = LocalWorkbook::create(&path, sheets)?;
            println!("✔ ブックを作成: {}", workbook.path().display());
            println!("  シート: {}", workbook.sheets().names().join(", "));
        }

        Commands::Tasks => {
            println!("タスク:");
            for task in &config.tasks {
                println!("  {:<12} {}  シート「{}」 {}", task.id, task.label, task.sheet, task.layout);
            }
        }

        Commands::Config { set_api_key, set_spreadsheet_id, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(id) = set_spreadsheet_id {
                config.set_spreadsheet_id(id)?;
                println!("✔ スプレッドシートIDを設定しました");
            }

            if show {
                let settings = &config.matching.settings;
                println!("設定: {}", Config::config_path()?.display());
                println!("  モデル: {}", config.model);
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  APIキー: {}", if config.api_key().is_some() { "設定済み" } else { "未設定" });
                println!("  スプレッドシートID: {}", config.spreadsheet_id.as_deref().unwrap_or("未設定"));
                if let Some(workbook) = &config.workbook {
                    println!("  ローカルブック: {}", workbook.display());
                }
                println!("  名簿シート: {}", config.roster_sheet);
                println!("  閾値: {}", settings.similarity_threshold);
                println!("  文字数差ペナルティ: {}", settings.length_penalty);
                println!("  閾値未満の扱い: {:?}", settings.low_confidence);
                println!("  類似度: {:?}", config.matching.algorithm);
            }
        }
    }

    Ok(())
}

/// `run` の実行内容
struct RunJob<'a> {
    config: &'a Config,
    task: &'a TaskProfile,
    images: &'a [ImageInfo],
    settings: MatchSettings,
    vision: Option<GeminiClient>,
}

enum Target {
    Workbook(PathBuf),
    Google(String),
}

/// 書き込み先を決める（CLI引数 → 設定ファイルの順）
fn resolve_target(config: &Config, args: &TargetArgs) -> score_sheet_ai::error::Result<Target> {
    if let Some(path) = &args.workbook {
        return Ok(Target::Workbook(path.clone()));
    }
    if let Some(id) = &args.spreadsheet_id {
        return Ok(Target::Google(id.clone()));
    }
    if let Some(path) = &config.workbook {
        return Ok(Target::Workbook(path.clone()));
    }
    config
        .spreadsheet_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .map(Target::Google)
        .ok_or(ScoreSheetError::MissingSpreadsheetId)
}

async fn run_with_store<S: SheetStore>(store: S, dry_run: bool, job: &RunJob<'_>) -> anyhow::Result<()> {
    if dry_run {
        let dry = execute_run(DryRun::new(store), job).await?;
        print_planned(dry.planned());
    } else {
        execute_run(store, job).await?;
    }
    Ok(())
}

async fn execute_run<S: SheetStore>(store: S, job: &RunJob<'_>) -> anyhow::Result<S> {
    let mut pipeline = Pipeline::new(store, TokioPacer, job.config.roster_sheet.clone())
        .with_settings(job.settings.clone())
        .with_algorithm(job.config.matching.algorithm)
        .with_options(ExtractOptions::from(job.config));

    println!("[2/4] AI読み取り中...");
    let progress = ImageProgress::new(job.images.len());
    let outcome = pipeline
        .run(job.vision.as_ref(), job.task, job.images, |i, total, name| {
            progress.start_image(i, total, name)
        })
        .await;
    progress.finish();

    match outcome.with_context(|| format!("タスク「{}」の実行に失敗しました", job.task.label))? {
        RunOutcome::Idle(reason) => {
            println!("⚠ 実行しませんでした: {}", reason);
        }
        RunOutcome::Completed(summary) => print_summary(&summary),
    }

    Ok(pipeline.into_store())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "✔ {}件を読み取り（成功 {}/{}枚）",
        summary.entries_extracted,
        summary.images_succeeded(),
        summary.images_total
    );
    for failure in &summary.failures {
        println!("  ⚠ {}: {}", failure.file_name, failure.reason);
    }

    println!("\n[3/4] 名簿照合");
    println!("✔ 名簿 {}名 / 書き込み {}行\n", summary.roster_size, summary.rows.len());

    println!("[4/4] シート書き込み");
    match summary.write.origin {
        Some(origin) => println!(
            "✔ シート「{}」の {} から {}行を書き込み",
            summary.sheet,
            origin.to_a1(),
            summary.write.rows_written
        ),
        None => println!("書き込む行がありませんでした"),
    }

    print_reviews(&summary.reviews);

    let elapsed = summary.finished_at - summary.started_at;
    println!(
        "\n✅ 完了 ({} 〜 {}, {}秒)",
        summary.started_at.format("%H:%M:%S"),
        summary.finished_at.format("%H:%M:%S"),
        elapsed.num_seconds()
    );
}

fn print_reviews(reviews: &[score_sheet_common::ReviewMessage]) {
    if reviews.is_empty() {
        return;
    }
    println!("\n要確認 {}件:", reviews.len());
    for review in reviews {
        println!("  {}", review);
    }
}

fn print_planned(planned: &[PlannedWrite]) {
    println!("\n(ドライラン: シートには書き込んでいません)");
    for write in planned {
        println!("  {} に{}行", write.range(), write.values.len());
        for row in &write.values {
            println!("    {}", row.join(" | "));
        }
    }
}

fn select_task(config: &Config, key: Option<&str>) -> anyhow::Result<TaskProfile> {
    if let Some(key) = key {
        let task = find_task(&config.tasks, key)
            .map_err(|_| ScoreSheetError::UnknownTask(key.to_string()))?;
        return Ok(task.clone());
    }

    if config.tasks.is_empty() {
        return Err(ScoreSheetError::Config("タスクが1件も設定されていません".into()).into());
    }
    if !std::io::stdin().is_terminal() {
        return Err(ScoreSheetError::Config("--task でタスクを指定してください".into()).into());
    }

    let labels: Vec<String> = config
        .tasks
        .iter()
        .map(|t| format!("{} ({})", t.label, t.id))
        .collect();
    let index = dialoguer::Select::new()
        .with_prompt("タスクを選択")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(config.tasks[index].clone())
}

fn build_vision(config: &Config) -> score_sheet_ai::error::Result<Option<GeminiClient>> {
    config
        .api_key()
        .map(|key| GeminiClient::new(key, config.model.clone(), config.timeout()))
        .transpose()
}

async fn fetch_roster<S: SheetStore>(store: &S, sheet: &str) -> score_sheet_ai::error::Result<Roster> {
    score_sheet_ai::sheets::ensure_sheet(store, sheet).await?;
    Ok(Roster::from_values(store.column_values(sheet, 1).await?))
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
