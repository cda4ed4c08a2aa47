//! Durable backlog and delivery for the cardrelay daemon.
//!
//! Scans whose live send fails are written to a local SQLite table and
//! replayed after the next live send that succeeds. The `scans` table is
//! created by the workspace `migrations/` and is unique on `scan_id`, so
//! storing the same scan twice is harmless.
//!
//! # Components
//!
//! - [`Database`]: connection pool with WAL, full sync and embedded migrations
//! - [`ScanRepository`] / [`SqliteScanRepository`]: insert-or-ignore, stream
//!   in insertion order, delete by id
//! - [`DeliveryWorker`]: the single consumer of the scan channel
//!
//! # Example
//!
//! ```no_run
//! use cardrelay_core::{StationId, scan_channel};
//! use cardrelay_network::{HttpSender, HttpSenderConfig, Signer};
//! use cardrelay_storage::{Database, DatabaseConfig, DeliveryWorker, SqliteScanRepository};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("/var/database/robotarians.db")).await?;
//! let sender = HttpSender::new(HttpSenderConfig::new("https://collector.example/exec"))?;
//!
//! let mut worker = DeliveryWorker::new(
//!     SqliteScanRepository::new(db.pool().clone()),
//!     sender,
//!     Signer::from_base64("c2VjcmV0")?,
//!     StationId::new("lobby"),
//!     Duration::from_secs(30),
//! );
//!
//! let (_scans_tx, scans_rx) = scan_channel();
//! worker.run(scans_rx).await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod delivery;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use delivery::{DeliveryOutcome, DeliveryWorker, WorkerState, WorkerStats};
pub use error::{StorageError, StorageResult};
pub use models::PersistedScan;
pub use repositories::{ScanRepository, SqliteScanRepository};
