use base64::{engine::general_purpose, Engine as _};
use clap::Parser;
use coffee_ai_common::{build_analysis_prompt, CoffeeAnalysis};
use coffee_label_ai::{analyzer, cli, config, error::RelayError, server};
use cli::{Cli, Commands};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "coffee_label_ai=debug,tower_http=debug"
    } else {
        "coffee_label_ai=info,tower_http=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, api_key } => {
            let config = config.with_overrides(port, api_key);
            server::run_server(config).await?;
        }

        Commands::Analyze { image, mime_type, output, api_key } => {
            println!("☕ coffee-ai - ラベル解析\n");

            let config = config.with_overrides(None, api_key);
            let bytes = std::fs::read(&image)
                .map_err(|e| RelayError::ImageLoad(format!("{}: {}", image.display(), e)))?;
            let hint = mime_type.unwrap_or_else(|| cli::mime_hint_from_path(&image));

            let request = analyzer::AnalysisRequest::new(general_purpose::STANDARD.encode(&bytes), hint);
            let client = analyzer::ClaudeApiClient::new(&config)?;

            println!("[1/2] AI解析中...");
            let data = analyzer::analyze_image(&client, &request, &build_analysis_prompt()).await?;
            println!("✔ 解析完了\n");

            match analyzer::summarize(&data) {
                Ok(summary) => print_summary(&summary),
                Err(e) => tracing::warn!(error = %e, "サマリーを表示できません（JSONはそのまま出力）"),
            }

            let json = serde_json::to_string_pretty(&data)?;
            match output {
                Some(path) => {
                    println!("[2/2] 結果を保存中...");
                    std::fs::write(&path, json)?;
                    println!("✔ 結果を保存: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                match cli.config.as_deref() {
                    Some(path) => {
                        config.api_key = Some(key);
                        config.save_to(path)?;
                    }
                    None => config.set_api_key(key)?,
                }
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  最大トークン: {}", config.max_tokens);
                println!("  API URL: {}", config.api_url);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  ポート: {}", config.port);
                println!("  許可オリジン: {}", config.allowed_origins.join(", "));
                println!("  APIキー: {}", if config.has_api_key() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

fn print_summary(analysis: &CoffeeAnalysis) {
    println!("  産地: {} {}", analysis.country, analysis.region);
    println!("  焙煎所: {}", analysis.roaster);
    println!("  焙煎度: {}", analysis.roast_level);
    if !analysis.flavor_notes.is_empty() {
        println!("  フレーバー: {}", analysis.flavor_notes.join(", "));
    }
    if let Some(profile) = &analysis.brewing_profile {
        println!("  抽出: {} / {} / {}", profile.temperature, profile.ratio, profile.total_time);
        for step in &profile.steps {
            println!("    {}. {} {} ({})", step.step, step.action, step.water, step.time);
        }
    }
    println!();
}
