use clap::Parser;
use pivot_reports::core::ConfigProvider;
use pivot_reports::utils::{logger, validation::Validate};
use pivot_reports::{LocalStorage, ReportEngine, ReportPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-reports")]
#[command(about = "Sales report generator driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "reports.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based report generation");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    config.source.input = pivot_reports::config::absolutize_input(&config.source.input)?;

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No reports will be generated");
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = ReportPipeline::new(storage, config);
    let engine = ReportEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Reports generated successfully!");
            println!("✅ Reports generated successfully!");
            println!("📁 Archive saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Report generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    let render = config.render_config();

    println!("📋 Configuration Summary:");
    println!("  Report: {}", config.report.name);
    println!("  Title: {}", render.title);
    println!("  Input: {}", config.input_source());
    if let Some(max) = config.max_records() {
        println!("  Max Records: {}", max);
    }
    println!("  Output: {}/{}", config.output_path(), config.archive_name());
    println!("  Column Set: {:?}", render.column_set);
    println!("  Overflow: {:?}", render.overflow);
    println!(
        "  Page: {} x {} pt, {} rows per page",
        render.page.width,
        render.page.height,
        render.page.max_rows()
    );
    println!("  Concurrent Renders: {}", config.concurrent_renders());

    let mapping = config.field_mapping();
    if !mapping.is_empty() {
        println!("  Field Mapping:");
        for (from, to) in &mapping {
            println!("    {} -> {}", from, to);
        }
    }
    println!();
}
