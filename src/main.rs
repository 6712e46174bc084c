use clap::Parser;
use vbrick_etl::config::toml_config::EtlConfig;
use vbrick_etl::utils::error::{EtlError, ErrorSeverity};
use vbrick_etl::utils::logger;
use vbrick_etl::{run_stages, CliConfig, Stage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting vbrick-etl");
    let stages = cli.command.stages();

    let config = match EtlConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate_for(&stages) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated");
    display_config_summary(&config, &stages, cli.dry_run);

    if cli.dry_run {
        tracing::info!("🔍 Dry run, nothing was fetched or written");
        return Ok(());
    }

    let monitor_enabled = cli.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run_stages(&stages, &config, monitor_enabled).await {
        Ok(written) => {
            for (stage, location) in &written {
                tracing::info!(stage = %stage, output = %location, "stage completed");
                println!("📁 {}: {}", stage, location);
            }
            println!("✅ Completed {} stage(s)", written.len());
        }
        Err(e) => {
            tracing::error!(
                retryable = e.is_retryable(),
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            if e.is_retryable() {
                eprintln!("🔁 The failure looks temporary; the same command can be re-run as is");
            }

            std::process::exit(exit_code(&e));
        }
    }

    Ok(())
}

fn exit_code(error: &EtlError) -> i32 {
    match error.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.trim().is_empty() {
        "(not set)"
    } else {
        "********"
    }
}

fn display_config_summary(config: &EtlConfig, stages: &[Stage], dry_run: bool) {
    let names: Vec<&str> = stages.iter().map(Stage::as_str).collect();
    println!("📋 Configuration Summary:");
    println!("  Stages: {}", names.join(" -> "));
    println!("  Output: {}", config.output.directory);
    if let Some(publish_dir) = &config.output.publish_dir {
        println!("  Publish: {}", publish_dir);
    }

    if stages.iter().any(Stage::fetches) {
        println!("  API: {}", config.api.base_url);
        println!("  API key: {}", redact(&config.api.api_key));
        println!("  API secret: {}", redact(&config.api.api_secret));
        if let Some(proxy) = &config.api.proxy_url {
            println!("  Proxy: {}", proxy);
        }
        println!(
            "  Retries: {} attempts, {}ms base delay",
            config.retry.max_attempts, config.retry.base_delay_ms
        );
    }
    if stages.contains(&Stage::Videos) {
        println!(
            "  Videos: uploaded in the last {} days, {} per page",
            config.videos.lookback_days, config.videos.page_size
        );
    }
    if stages.contains(&Stage::Webcasts) {
        match &config.webcasts.start_date {
            Some(start) => println!("  Webcasts: since {}", start),
            None => println!("  Webcasts: last {} days", config.webcasts.lookback_days),
        }
        match config.categorizer.clusters {
            Some(k) => println!("  Categories: {} clusters", k),
            None => println!("  Categories: up to {} clusters", config.categorizer.max_clusters),
        }
    }
    if stages.contains(&Stage::Merge) {
        println!("  Fuzzy match window: ±{} days", config.merge.tolerance_days);
    }
    if stages.contains(&Stage::Normalize) {
        println!("  Layout: {:?}", config.normalize.layout);
    }

    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}
