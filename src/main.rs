use banner_watch::cli::Cli;
use banner_watch::engine::Monitor;
use banner_watch::notify::notifier_from_config;
use banner_watch::output::SummaryWriter;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.into_config()?;

    let default_level = if cfg.check.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let notifier = notifier_from_config(&cfg.notify)?;
    info!(channel = notifier.name(), "notification channel ready");
    let monitor = Monitor::new(cfg.check.clone(), notifier)?;
    let mut writer = SummaryWriter::stdout(cfg.output.clone());

    let Some(period) = cfg.interval else {
        let summary = monitor.run_once().await?;
        writer.write_summary(&summary)?;
        return Ok(());
    };

    let runs = monitor
        .run_every(period, tokio::signal::ctrl_c(), |summary| {
            if let Err(err) = writer.write_summary(&summary) {
                error!(error = %err, "failed to write run summary");
            }
        })
        .await;
    info!(runs, "interrupted, stopping");

    Ok(())
}
