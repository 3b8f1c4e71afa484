use anyhow::{Context, Result};
use card_rank_rust::{cli, config, diagnostics, export, recognizer, region, session};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use diagnostics::Diagnostics;
use recognizer::{cache, CacheSource, DescriptorCacheFile, Recognizer};
use region::FixedRegion;
use session::{RecognitionReport, Session};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::BuildCache { catalog, rebuild } => {
            println!("🗂 card-rank - 特徴キャッシュ作成\n");

            let session_config = config.session(catalog, None, None)?;
            let catalog_path = session_config.catalog_path;

            println!("[1/2] カタログを読み込み中... {}", catalog_path.display());
            let mut diags = Diagnostics::new();
            let recognizer =
                Recognizer::open(&catalog_path, session_config.features, rebuild, &mut diags);
            println!("✔ {}枚のカードを検出\n", recognizer.catalog().len());

            println!("[2/2] 特徴点を計算中...");
            match recognizer.source() {
                CacheSource::Loaded => println!("✔ 既存のキャッシュを使用"),
                CacheSource::Built => println!(
                    "✔ キャッシュを保存: {}",
                    DescriptorCacheFile::cache_path(&catalog_path).display()
                ),
                CacheSource::Empty => println!("✖ カタログを読み込めませんでした"),
            }
            println!(
                "  照合対象: {}/{}枚",
                recognizer.matchable_count(),
                recognizer.catalog().len()
            );

            print_diagnostics(&diags);
            println!("\n✅ 完了");
        }

        Commands::Recognize {
            screenshot,
            catalog,
            rows,
            cols,
            region,
            json,
            no_overlay,
            no_details,
        } => {
            println!("🔍 card-rank - カード識別\n");

            let mut session_config = config.session(catalog, rows, cols)?;
            session_config.show_overlays &= !no_overlay;
            session_config.show_details &= !no_details;

            let screen = image::open(&screenshot)
                .with_context(|| format!("スクショを読み込めません: {}", screenshot.display()))?
                .to_rgb8();

            println!("[1/2] カタログを準備中...");
            let mut diags = Diagnostics::new();
            let session = Session::open(session_config, &mut diags)?;
            println!(
                "✔ {}枚のカードを照合対象に設定\n",
                session.recognizer().matchable_count()
            );

            println!(
                "[2/2] 識別中... ({}x{})",
                session.config().grid_rows,
                session.config().grid_cols
            );
            let mut selector = FixedRegion(region);
            let report = session.recognize(&screen, &mut selector, &mut diags)?;
            println!(
                "✔ {}/{}枚を識別\n",
                report.matched_count(),
                report.cells.len()
            );

            print_report(&report);

            if let Some(json_path) = json {
                export::write_report_json(&report.cells, &json_path)?;
                println!("\n✔ 結果を保存: {}", json_path.display());
            }

            print_diagnostics(&diags);
        }

        Commands::Merge { input, output } => {
            println!("📊 card-rank - ランク統合\n");

            let output_path = export::merge_output_path(&input, output.as_deref());
            println!("- {} を統合中...", input.display());
            let count = export::merge_card_data(&input, &output_path)?;
            println!("✔ {}枚のカードを出力: {}", count, output_path.display());

            println!("\n✅ 統合完了");
        }

        Commands::Cache { clear, catalog, info } => {
            let catalog_path = resolve_catalog(catalog, &config)?;
            let cache_path = DescriptorCacheFile::cache_path(&catalog_path);

            if info || !clear {
                print_cache_info(&catalog_path, &cache_path, &config);
            }

            if clear {
                match DescriptorCacheFile::clear(&catalog_path) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }

        Commands::Config {
            set_catalog,
            set_grid,
            show,
        } => {
            let mut config = config;

            if let Some(path) = set_catalog {
                config.set_catalog_path(path)?;
                println!("✔ カタログを設定しました");
            }

            if let Some(grid) = set_grid {
                config.set_grid(grid.rows, grid.cols)?;
                println!("✔ グリッドを {} に設定しました", grid);
            }

            if show {
                println!("設定:");
                println!(
                    "  カタログ: {}",
                    config
                        .catalog_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "未設定".to_string())
                );
                println!("  グリッド: {}x{}", config.grid_rows, config.grid_cols);
                println!("  ランク表示: {}", on_off(config.show_overlays));
                println!("  詳細表示: {}", on_off(config.show_details));
                println!("  FAST閾値: {}", config.fast_threshold);
                println!("  最大特徴点数: {}", config.max_features);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "card_rank_rust=debug,card_rank=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .init();
}

fn resolve_catalog(catalog: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    catalog
        .or_else(|| config.catalog_path.clone())
        .context("カタログが未指定です。--catalog または `card-rank config --set-catalog` で指定してください")
}

fn print_cache_info(catalog_path: &Path, cache_path: &Path, config: &Config) {
    if !cache_path.exists() {
        println!("キャッシュファイルが存在しません: {}", cache_path.display());
        return;
    }

    match DescriptorCacheFile::load(catalog_path) {
        Ok(Some(cached)) => {
            println!("キャッシュ情報:");
            println!("  パス: {}", cache_path.display());
            println!("  件数: {}", cached.len());
            println!("  抽出器: {}", cached.extractor());
            println!("  作成日時: {}", cached.built_at());
            if let Ok(meta) = std::fs::metadata(cache_path) {
                println!("  サイズ: {} bytes", meta.len());
            }
            let state = cache::catalog_fingerprint(catalog_path)
                .map_err(|e| e.to_string())
                .and_then(|fp| {
                    cached
                        .check_fresh(&fp, &config.feature_params())
                        .map_err(|e| e.to_string())
                });
            match state {
                Ok(()) => println!("  状態: 最新"),
                Err(reason) => println!("  状態: 要再作成 ({})", reason),
            }
        }
        Ok(None) => println!("キャッシュファイルが存在しません: {}", cache_path.display()),
        Err(e) => println!("キャッシュ読み込みエラー: {}", e),
    }
}

fn print_report(report: &RecognitionReport) {
    println!("範囲: {} ({}x{})", report.region, report.rows, report.cols);
    for cell in &report.cells {
        let position = format!("[{},{}]", cell.row + 1, cell.col + 1);
        match (&cell.card, &cell.error) {
            (Some(card), _) => {
                let score = cell.score.map(|s| format!("{:.1}", s)).unwrap_or_default();
                match &cell.overlay {
                    Some(label) => println!(
                        "  {} {} (スコア {})  {} / {}",
                        position, card.card_id, score, label.main, label.other
                    ),
                    None => println!("  {} {} (スコア {})", position, card.card_id, score),
                }
            }
            (None, Some(error)) => println!("  {} 識別不可: {}", position, error),
            (None, None) => println!("  {} 該当なし", position),
        }
    }

    if let Some(details) = &report.details {
        println!("\n{}", details);
    }
}

fn print_diagnostics(diags: &Diagnostics) {
    if diags.is_empty() {
        return;
    }
    eprintln!("\n⚠ 警告 {}件:", diags.len());
    for item in diags.items() {
        eprintln!("  - {}", item);
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "有効"
    } else {
        "無効"
    }
}
