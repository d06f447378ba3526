use clap::Parser;
use scan_deskew::batch;
use scan_deskew::config::{Args, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from(args);

    tracing::info!("Starting scan-deskew v{}", env!("CARGO_PKG_VERSION"));

    if config.dry_run {
        let planned = batch::plan(&config)?;
        println!("=== Dry Run ===");
        println!("Input: {}", config.input_path.display());
        println!("Output: {}", config.output_dir.display());
        println!("Items to process: {}", planned.len());
        for item in &planned {
            println!("  {} -> {}", item.input.display(), item.output.display());
        }
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(batch::run(&config));
    // Items abandoned after a timeout must not keep the process alive
    runtime.shutdown_background();
    let summary = result?;

    if let Some(report) = &config.report_path {
        batch::write_report(&summary, report)?;
        tracing::info!("Report written to {}", report.display());
    }

    Ok(())
}
