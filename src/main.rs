//! linkmon - Internet Connection Probe Agent Binary
//!
//! Loads the monitor configuration, wires the probes to the shared metric
//! registry, starts the per-job schedulers and serves the Prometheus
//! exporter until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use linkmon::{
    payload, start_web_server, DownloadProbe, JobSpec, Metrics, MonitorConfig, PingProbe,
    Scheduler, UploadProbe, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_INSTANCES, UPLOAD_PAYLOAD_BYTES,
};
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "linkmon")]
#[command(about = "Internet connection probe agent exporting Prometheus metrics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "monitor.yml")]
    config: PathBuf,

    /// Exporter bind address
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Configuration errors are the one fatal startup path; nothing is
    // served until the file loads and validates.
    let config = MonitorConfig::load_from_file(&cli.config)?;

    init_logging(config.log_level.into())?;
    info!("starting linkmon, metrics at http://{}/metrics", cli.listen);

    let metrics = Arc::new(Metrics::new()?);

    // The upload payload exists before the upload job can first fire.
    let scratch = payload::scratch_payload(UPLOAD_PAYLOAD_BYTES);

    let ping = Arc::new(PingProbe::new(config.icmp_dest_host.clone(), metrics.clone()));
    let download = Arc::new(DownloadProbe::new(config.download_url.clone(), metrics.clone())?);
    let upload = Arc::new(UploadProbe::new(
        config.upload_url.clone(),
        scratch,
        metrics.clone(),
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut scheduler = Scheduler::new(shutdown_rx.clone());
    scheduler.schedule(
        JobSpec::new(
            "ping",
            Duration::from_secs(config.jobs.ping.interval),
            DEFAULT_MAX_INSTANCES,
        ),
        ping,
    );
    scheduler.schedule(
        JobSpec::new("download", Duration::from_secs(config.jobs.download.interval), 1),
        download,
    );
    scheduler.schedule(
        JobSpec::new(
            "upload",
            Duration::from_secs(config.jobs.upload.interval),
            DEFAULT_MAX_INSTANCES,
        ),
        upload,
    );

    let mut server = {
        let listen = cli.listen.clone();
        let metrics = metrics.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { start_web_server(&listen, metrics, shutdown).await })
    };

    // An exporter that cannot bind is as fatal as a bad configuration file;
    // the probes must not keep running with nothing serving their metrics.
    let early_exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutting down linkmon...");
            None
        }
        result = &mut server => Some(result),
    };

    let _ = shutdown_tx.send(true);
    scheduler.join().await;

    match early_exit {
        None => server.await??,
        Some(result) => {
            result??;
            return Err("metrics exporter stopped unexpectedly".into());
        }
    }

    Ok(())
}

fn init_logging(level: Level) -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG wins over the configured logLevel when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
