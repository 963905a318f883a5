//! Entry point for the hostwatch TUI. Parses args, resolves settings and runs the App.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use hostwatch::app::App;
use hostwatch::config::{data_dir, load_config, save_config, Cli, ViewerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = load_config().context("loading config")?;
    let cfg = ViewerConfig::resolve(&cli, &file)?;

    if cli.save {
        let path = save_config(&cfg.to_file())?;
        eprintln!("saved settings to {}", path.display());
    }
    if cli.dry_run {
        println!("url: {}", cfg.url);
        println!("report_dir: {}", cfg.report_dir.display());
        println!("tracking_secs: {}", cfg.tracking_duration.as_secs());
        return Ok(());
    }

    // The TUI owns the terminal, so logs go to a file.
    let _guard = init_logging();
    info!("hostwatch starting against {}", cfg.url);

    let mut app = App::new(&cfg);
    app.run(&cfg.url).await
}

fn init_logging() -> Option<WorkerGuard> {
    let dir = data_dir().join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::daily(dir, "hostwatch.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}
