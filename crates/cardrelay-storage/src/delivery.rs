//! Delivery worker: live send, buffer on failure, flush after success.
//!
//! ```text
//!            recv_timeout
//! Idle ─────────────────────► SendingLive ──fail──► insert row ──► Idle
//!   ▲                              │
//!   │                           success
//!   │                              ▼
//!   └──── delete sent ids ◄── FlushingBacklog (whole backlog, one batch)
//! ```
//!
//! Delivery failures never leave this module: they turn into backlog rows.
//! Storage errors and a closed scan channel are returned to the caller.

use crate::error::{StorageError, StorageResult};
use crate::models::PersistedScan;
use crate::repositories::ScanRepository;
use cardrelay_core::{ScanEvent, ScanReceiver, StationId};
use cardrelay_network::{RemoteSender, SignedBatch, Signer};
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Where the worker is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Waiting on the scan channel
    #[default]
    Idle,
    /// Attempting delivery of a freshly captured scan
    SendingLive,
    /// Sending the stored backlog after a live success
    FlushingBacklog,
}

/// Running totals since the worker started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerStats {
    /// Scans accepted by the collector on their live send
    pub live_delivered: u64,
    /// Scans written to the backlog after a failed live send
    pub buffered: u64,
    /// Backlog rows removed after a confirmed flush
    pub flushed: u64,
    /// Flush attempts the collector did not accept
    pub failed_flushes: u64,
}

/// Result of handling one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Live send accepted; `flushed` backlog rows were delivered after it
    Delivered { flushed: u64 },
    /// Live send failed; the scan is now in the backlog
    Buffered,
}

/// Single consumer of the scan channel.
///
/// Owns the only handle to the backlog, so no coordination beyond the
/// store's own transactions is needed.
///
/// # Examples
///
/// ```
/// use cardrelay_core::{ScanEvent, StationId};
/// use cardrelay_network::Signer;
/// use cardrelay_network::mock::MockSender;
/// use cardrelay_storage::{Database, DeliveryOutcome, DeliveryWorker, SqliteScanRepository};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = Database::in_memory().await?;
///     let repo = SqliteScanRepository::new(db.pool().clone());
///     let station = StationId::new("lobby");
///
///     let mut worker = DeliveryWorker::new(
///         repo,
///         MockSender::always(false),
///         Signer::from_base64("c2VjcmV0")?,
///         station.clone(),
///         Duration::from_secs(30),
///     );
///
///     let outcome = worker.process(ScanEvent::new("123", station)).await?;
///     assert_eq!(outcome, DeliveryOutcome::Buffered);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct DeliveryWorker<R, S> {
    repo: R,
    sender: S,
    signer: Signer,
    station: StationId,
    poll: Duration,
    state: WorkerState,
    stats: WorkerStats,
}

impl<R, S> DeliveryWorker<R, S>
where
    R: ScanRepository,
    S: RemoteSender,
{
    /// Create a worker. `poll` bounds each wait on the scan channel.
    pub fn new(repo: R, sender: S, signer: Signer, station: StationId, poll: Duration) -> Self {
        Self {
            repo,
            sender,
            signer,
            station,
            poll,
            state: WorkerState::Idle,
            stats: WorkerStats::default(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// The backlog this worker writes to
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Consume scans until the channel fails.
    ///
    /// A poll timeout with nothing queued is not an error; the worker just
    /// waits again.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Channel` once the channel is closed, and any
    /// storage error raised while buffering or flushing.
    pub async fn run(&mut self, mut scans: ScanReceiver) -> StorageResult<()> {
        info!(station = %self.station, poll = ?self.poll, "Delivery worker started");

        loop {
            self.state = WorkerState::Idle;
            let scan = match scans.recv_timeout(self.poll).await {
                Ok(Some(scan)) => scan,
                Ok(None) => {
                    trace!("No scans within poll interval");
                    continue;
                }
                Err(e) => {
                    error!("Scan channel failed: {}", e);
                    return Err(StorageError::Channel(e));
                }
            };

            self.process(scan).await?;
        }
    }

    /// Run one delivery cycle for `scan`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the scan cannot be buffered or the backlog
    /// cannot be read or pruned. Delivery failures are not errors.
    pub async fn process(&mut self, scan: ScanEvent) -> StorageResult<DeliveryOutcome> {
        self.state = WorkerState::SendingLive;
        debug!(scan_id = %scan.scan_id, card = %scan.card_number, "Live send");

        let delivered = match self.signer.sign_batch(std::slice::from_ref(&scan)) {
            Ok(batch) => self.sender.send(&batch).await,
            Err(e) => {
                warn!(scan_id = %scan.scan_id, "Could not sign scan: {}", e);
                false
            }
        };

        let outcome = if delivered {
            self.stats.live_delivered += 1;
            info!(scan_id = %scan.scan_id, "Scan delivered");
            let flushed = self.flush_backlog().await?;
            DeliveryOutcome::Delivered { flushed }
        } else {
            self.repo.insert(&[PersistedScan::from_event(&scan)]).await?;
            self.stats.buffered += 1;
            info!(scan_id = %scan.scan_id, "Scan buffered for retry");
            DeliveryOutcome::Buffered
        };

        self.state = WorkerState::Idle;
        Ok(outcome)
    }

    /// Send the whole backlog as one batch; on success delete exactly the
    /// ids that were in it. Returns the number of rows removed.
    async fn flush_backlog(&mut self) -> StorageResult<u64> {
        self.state = WorkerState::FlushingBacklog;

        let mut rows: Vec<PersistedScan> = Vec::new();
        let mut backlog = self.repo.all();
        while let Some(row) = backlog.next().await {
            match row {
                Ok(row) => rows.push(row),
                Err(e @ StorageError::Corrupt { .. }) => warn!("Skipping backlog row: {}", e),
                Err(e) => return Err(e),
            }
        }
        drop(backlog);

        if rows.is_empty() {
            return Ok(0);
        }

        let Some(batch) = self.backlog_batch(&rows) else {
            return Ok(0);
        };

        if !self.sender.send(&batch).await {
            self.stats.failed_flushes += 1;
            warn!(pending = batch.len(), "Backlog flush not accepted, keeping rows");
            return Ok(0);
        }

        let removed = self.repo.delete(&batch.scan_ids).await?;
        self.stats.flushed += removed;
        info!(removed, "Backlog flushed");
        Ok(removed)
    }

    /// Sign the readable rows. Rows that no longer parse stay in the store.
    fn backlog_batch(&mut self, rows: &[PersistedScan]) -> Option<SignedBatch> {
        let scans: Vec<ScanEvent> = rows
            .iter()
            .filter_map(|row| match row.to_event(self.station.clone()) {
                Ok(scan) => Some(scan),
                Err(e) => {
                    warn!("Skipping backlog row: {}", e);
                    None
                }
            })
            .collect();

        if scans.is_empty() {
            return None;
        }

        match self.signer.sign_batch(&scans) {
            Ok(batch) => Some(batch),
            Err(e) => {
                self.stats.failed_flushes += 1;
                warn!("Could not sign backlog: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::repositories::SqliteScanRepository;
    use cardrelay_network::mock::MockSender;

    async fn worker(sender: MockSender) -> DeliveryWorker<SqliteScanRepository, MockSender> {
        let db = Database::in_memory().await.unwrap();
        DeliveryWorker::new(
            SqliteScanRepository::new(db.pool().clone()),
            sender,
            Signer::from_base64("c2VjcmV0").unwrap(),
            StationId::new("lobby"),
            Duration::from_millis(10),
        )
    }

    fn scan(card: &str) -> ScanEvent {
        ScanEvent::new(card, StationId::new("lobby"))
    }

    #[tokio::test]
    async fn test_live_success_with_empty_backlog() {
        let sender = MockSender::always(true);
        let mut worker = worker(sender.clone()).await;

        let outcome = worker.process(scan("1")).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Delivered { flushed: 0 });
        assert_eq!(sender.attempts(), 1);
        assert_eq!(worker.state(), WorkerState::Idle);
        assert_eq!(worker.stats().live_delivered, 1);
    }

    #[tokio::test]
    async fn test_live_failure_buffers() {
        let sender = MockSender::always(false);
        let mut worker = worker(sender.clone()).await;
        let a = scan("1");

        let outcome = worker.process(a.clone()).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Buffered);
        assert_eq!(sender.attempts(), 1);
        assert_eq!(worker.repository().count().await.unwrap(), 1);
        assert_eq!(worker.stats().buffered, 1);

        let batch = &sender.sent()[0];
        assert_eq!(batch.scan_ids, vec![a.scan_id]);
    }

    #[tokio::test]
    async fn test_success_flushes_backlog() {
        let sender = MockSender::scripted([false], true);
        let mut worker = worker(sender.clone()).await;
        let a = scan("1");
        let b = scan("2");

        worker.process(a.clone()).await.unwrap();
        let outcome = worker.process(b.clone()).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Delivered { flushed: 1 });
        assert_eq!(worker.repository().count().await.unwrap(), 0);

        // live A, live B, backlog [A]
        let sent = sender.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].scan_ids, vec![b.scan_id]);
        assert_eq!(sent[2].scan_ids, vec![a.scan_id]);
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_backlog() {
        let sender = MockSender::scripted([false, true, false], true);
        let mut worker = worker(sender.clone()).await;

        worker.process(scan("1")).await.unwrap();
        let outcome = worker.process(scan("2")).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Delivered { flushed: 0 });
        assert_eq!(worker.repository().count().await.unwrap(), 1);
        assert_eq!(worker.stats().failed_flushes, 1);
    }

    #[tokio::test]
    async fn test_null_row_does_not_block_flush() {
        let sender = MockSender::scripted([false], true);
        let mut worker = worker(sender.clone()).await;
        let a = scan("1");

        worker.process(a.clone()).await.unwrap();
        sqlx::query("INSERT INTO scans (card_number, time_stamp, scan_id) VALUES (NULL, ?, ?)")
            .bind(a.timestamp_string())
            .bind(cardrelay_core::ScanId::new().to_string())
            .execute(worker.repository().pool())
            .await
            .unwrap();

        let outcome = worker.process(scan("2")).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Delivered { flushed: 1 });
        assert_eq!(sender.sent()[2].scan_ids, vec![a.scan_id]);
        assert_eq!(worker.repository().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_row_left_in_place() {
        let sender = MockSender::always(true);
        let mut worker = worker(sender.clone()).await;
        let bad = PersistedScan {
            card_number: "9".to_string(),
            time_stamp: "not-a-time".to_string(),
            scan_id: "not-a-uuid".to_string(),
        };
        worker.repository().insert(&[bad]).await.unwrap();

        let outcome = worker.process(scan("1")).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Delivered { flushed: 0 });
        assert_eq!(sender.attempts(), 1);
        assert_eq!(worker.repository().count().await.unwrap(), 1);
    }
}
