//! Daemon: capture, hand off, deliver.

use anyhow::{Context, Result, anyhow};
use cardrelay_core::{RelayConfig, ScanSender, scan_channel};
use cardrelay_hardware::CaptureHandle;
use cardrelay_network::{HttpSender, HttpSenderConfig, Signer};
use cardrelay_storage::{Database, DatabaseConfig, DeliveryWorker, SqliteScanRepository};
use std::path::PathBuf;
use tracing::info;

pub async fn execute(config_path: PathBuf, database: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(&config_path, database)?;
    let signer = Signer::from_base64(&config.hmac_key).context("Invalid hmac_key")?;

    let sender = HttpSender::new(
        HttpSenderConfig::new(&config.collector_url).with_timeout(config.request_timeout),
    )
    .context("Failed to build collector client")?;

    let db = Database::new(DatabaseConfig::new(&config.database_path))
        .await
        .with_context(|| {
            format!(
                "Failed to open backlog database {}",
                config.database_path.display()
            )
        })?;

    let (scans_tx, scans_rx) = scan_channel();
    let mut capture = start_capture(&config, scans_tx)?;

    let mut worker = DeliveryWorker::new(
        SqliteScanRepository::new(db.pool().clone()),
        sender,
        signer,
        config.station_id.clone(),
        config.queue_poll,
    );
    let mut delivery = tokio::spawn(async move { worker.run(scans_rx).await });

    info!(station = %config.station_id, "cardrelayd running");

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            signal.context("Failed to listen for shutdown signal")
        }
        joined = &mut delivery => match joined {
            Ok(Ok(())) => Err(anyhow!("Delivery worker stopped")),
            Ok(Err(e)) => Err(anyhow::Error::new(e).context("Delivery worker failed")),
            Err(e) => Err(anyhow!("Delivery worker panicked: {e}")),
        },
        captured = capture.finished() => match captured {
            Ok(()) => Err(anyhow!("Every card reader disconnected")),
            Err(e) => Err(anyhow::Error::new(e).context("Capture failed")),
        },
    };

    capture.shutdown().await;
    if !delivery.is_finished() {
        delivery.abort();
        let _ = delivery.await;
    }
    db.close().await;

    outcome
}

#[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
fn start_capture(config: &RelayConfig, scans: ScanSender) -> Result<CaptureHandle> {
    use cardrelay_hardware::{CaptureManager, EvdevReader, InputDevice};

    let readers = EvdevReader::open_allowed(&config.allowed_devices)
        .context("No allowed card reader could be opened")?;

    let mut manager = CaptureManager::new(config.station_id.clone());
    for reader in readers {
        info!(
            name = %reader.info().name,
            path = %reader.path().display(),
            "Capturing from card reader"
        );
        manager.register(reader);
    }

    Ok(manager.start(scans))
}

#[cfg(not(all(feature = "hardware-evdev", target_os = "linux")))]
fn start_capture(_config: &RelayConfig, _scans: ScanSender) -> Result<CaptureHandle> {
    anyhow::bail!("Built without an input backend; enable `hardware-evdev` on Linux")
}
