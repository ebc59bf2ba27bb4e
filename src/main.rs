use std::sync::Arc;

use tokio_stream::StreamExt;
use tracing::{error, info};

use pager_notify::config::Settings;
use pager_notify::pipeline::{Classifier, Dispatcher, Notice};
use pager_notify::source::{tail_lines, wait_for_file};
use pager_notify::transport::{NtfyTransport, Transport};

/// Poll interval while waiting for the logfile to appear.
const SOURCE_WAIT_POLL: std::time::Duration = std::time::Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config_path =
        std::env::var("PAGER_NOTIFY_CONFIG").unwrap_or_else(|_| "./config.json".to_string());

    let settings = Settings::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error: failed to load settings from {config_path}: {e}");
        std::process::exit(1);
    });

    info!(
        config = %config_path,
        source = %settings.source.name,
        logfile = %settings.source.logfile.display(),
        profiles = settings.profiles.len(),
        "pager-notify v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    // validate() already ran in load(); compiling again here cannot fail
    let rules = settings.rule_set()?;
    let classifier = Classifier::new(rules, settings.source.name.clone());
    let transport: Arc<dyn Transport> = Arc::new(NtfyTransport::new()?);
    let dispatcher = Dispatcher::new(classifier, settings.profiles.clone(), transport)
        .with_gap(settings.dispatch_gap());

    dispatcher.announce(Notice::Online).await;

    let logfile = settings.source.logfile.clone();
    let logfile_display = logfile.display().to_string();
    if !logfile.exists() {
        dispatcher
            .announce(Notice::SourceWaiting {
                path: logfile_display.clone(),
            })
            .await;
        wait_for_file(&logfile, SOURCE_WAIT_POLL).await;
    }
    dispatcher
        .announce(Notice::SourceMonitoring {
            path: logfile_display,
        })
        .await;

    let mut lines = tail_lines(&logfile).await?;

    // Each line runs classify → route → dispatch to completion before the
    // next one, preserving per-source delivery order.
    while let Some(line) = lines.next().await {
        dispatcher.process_line(&line).await;
    }

    error!("Log source stream ended");
    Ok(())
}
