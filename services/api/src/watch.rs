use crate::report::{emit, scan_once, ScanArgs};
use clap::Args;
use grade_highlighter::config::AppConfig;
use grade_highlighter::error::AppError;
use grade_highlighter::telemetry;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Args, Debug)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub(crate) scan: ScanArgs,
    /// Override the configured debounce window in milliseconds
    #[arg(long)]
    pub(crate) debounce_ms: Option<u64>,
    /// How often the watched files are checked for changes, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub(crate) poll_ms: u64,
    /// Stop after this many rescans
    #[arg(long)]
    pub(crate) max_passes: Option<usize>,
}

/// Collapses bursts of change notifications into one rescan.
///
/// A burst ends once no notification has arrived for `window`.
pub(crate) struct RescanScheduler {
    window: Duration,
}

impl RescanScheduler {
    pub(crate) fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Waits for the next burst and returns how many notifications it held,
    /// or `None` once every sender is gone.
    pub(crate) async fn next_burst(&self, changes: &mut mpsc::Receiver<()>) -> Option<usize> {
        changes.recv().await?;
        let mut coalesced = 1;

        loop {
            match tokio::time::timeout(self.window, changes.recv()).await {
                Ok(Some(())) => coalesced += 1,
                Ok(None) | Err(_) => return Some(coalesced),
            }
        }
    }
}

pub(crate) async fn run_watch(args: WatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let window = args
        .debounce_ms
        .map(Duration::from_millis)
        .unwrap_or(config.highlight.rescan_debounce);
    let mut watched = vec![args.scan.table.clone()];
    watched.extend(args.scan.distribution.clone());
    watched.push(
        args.scan
            .settings
            .clone()
            .unwrap_or_else(|| config.highlight.settings_path.clone()),
    );

    info!(?watched, debounce_ms = window.as_millis() as u64, "watching for changes");

    let (sender, mut changes) = mpsc::channel(64);
    let poller = tokio::spawn(poll_changes(
        watched,
        Duration::from_millis(args.poll_ms.max(1)),
        sender,
    ));

    rescan(&config, &args.scan);

    let scheduler = RescanScheduler::new(window);
    let mut passes = 0;
    while let Some(coalesced) = scheduler.next_burst(&mut changes).await {
        debug!(coalesced, "change burst settled");
        rescan(&config, &args.scan);

        passes += 1;
        if args.max_passes.is_some_and(|max| passes >= max) {
            break;
        }
    }

    poller.abort();
    Ok(())
}

/// Runs one pass; failures are logged so the watch keeps going.
fn rescan(config: &AppConfig, args: &ScanArgs) {
    match scan_once(config, args).and_then(|rendered| emit(args, &rendered)) {
        Ok(()) => info!(table = %args.table.display(), "highlight pass written"),
        Err(err) => warn!(error = %err, "highlight pass failed"),
    }
}

async fn poll_changes(paths: Vec<PathBuf>, interval: Duration, sender: mpsc::Sender<()>) {
    let mut last_seen: Vec<Option<SystemTime>> = paths.iter().map(|path| modified(path)).collect();
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        let current: Vec<Option<SystemTime>> = paths.iter().map(|path| modified(path)).collect();
        if current != last_seen {
            last_seen = current;
            if sender.send(()).await.is_err() {
                return;
            }
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
}
