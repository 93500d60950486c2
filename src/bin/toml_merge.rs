use clap::Parser;
use rulemerge::config::toml_config::TomlConfig;
use rulemerge::core::sources;
use rulemerge::utils::error::ErrorSeverity;
use rulemerge::utils::{logger, validation::Validate};
use rulemerge::{LocalStorage, MergeEngine, MergePipeline};

#[derive(Parser)]
#[command(name = "toml-merge")]
#[command(about = "Filter list merge tool with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "merge.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be processed without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based merge tool");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No sources will be fetched");
        perform_dry_run(&config)?;
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::new(config.load.output_path.clone());
    let pipeline = MergePipeline::new(storage, config);

    // 創建引擎並運行
    let engine = MergeEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Merge completed successfully!");
            println!("🎉 Merge completed successfully!");
            println!("📁 Merged rules: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Merge failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    use rulemerge::core::ConfigProvider;

    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Sources file: {}", config.urls_file());
    println!("  Output root: {}", config.output_path());
    println!("  Timeout: {}s", config.timeout_seconds());
    println!("  Dedupe: {}", config.dedupe());
    println!("  Sort output: {}", config.sort_output());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    use rulemerge::core::ConfigProvider;

    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Source List:");
    match sources::load_sources(config.urls_file()) {
        Ok(urls) => {
            println!("  {} sources would be fetched:", urls.len());
            for (idx, url) in urls.iter().enumerate() {
                println!("  {:03}  {}", idx + 1, url);
            }
        }
        Err(e) => {
            println!("  ⚠ Could not read source list: {}", e);
        }
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Root: {}", config.output_path());
    println!("  Per-source files: tmp/NNN.txt");
    println!("  Merged rules: dist/merged_rules.txt");
    println!("  Trace log: dist/log.txt");
    println!("  Run summary: dist/summary.json");

    println!();
    println!("✅ Dry run analysis complete. Rerun without --dry-run to merge.");

    Ok(())
}
