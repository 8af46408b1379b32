use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tracing::info;

use regsync_certs::{KvClient, find_certificates, sync_bundles};
use regsync_observe::{LoggerConfig, LoggerLevel, init_logger};

/// Sync `.crt`/`.key` pairs into key/value stores as `<name>.pem` bundles.
#[derive(Debug, Parser)]
#[command(name = "certsync", version)]
struct Cli {
    /// Directory holding the certificates.
    directory: PathBuf,

    /// Key/value base URLs, e.g. http://127.0.0.1:8500/v1/kv/certs/
    #[arg(required = true, num_args = 1..)]
    kv_urls: Vec<String>,

    /// Timeout in seconds for every request.
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Log filter.
    #[arg(long, default_value = "info")]
    log_level: LoggerLevel,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(&LoggerConfig {
        level: cli.log_level.clone(),
        ..Default::default()
    })?;

    let bundles = find_certificates(&cli.directory)?;
    info!(count = bundles.len(), dir = %cli.directory.display(), "certificate bundles found");

    let kv = KvClient::new(Duration::from_secs(cli.timeout_secs))?;
    for url in &cli.kv_urls {
        info!(%url, "checking key/value store");
        let report = sync_bundles(&kv, url, &bundles).await;
        info!(
            %url,
            checked = report.checked,
            updated = report.updated,
            failed = report.failed,
            "store checked"
        );
    }
    info!("done");
    Ok(())
}
