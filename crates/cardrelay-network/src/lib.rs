//! Collector communication for cardrelay
//!
//! This crate signs scan batches and posts them to the remote collector.
//!
//! # Components
//!
//! - **Signer**: HMAC-SHA384 over the exact JSON body, base64 encoded
//! - **HttpSender**: one HTTPS POST per call, success reported as `bool`
//! - **MockSender**: scripted outcomes for exercising delivery logic
//!
//! # Example
//!
//! ```no_run
//! use cardrelay_core::{ScanEvent, StationId};
//! use cardrelay_network::{HttpSender, HttpSenderConfig, RemoteSender, Signer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signer = Signer::from_base64("c2VjcmV0")?;
//! let sender = HttpSender::new(HttpSenderConfig::new("https://collector.example/exec"))?;
//!
//! let batch = signer.sign_batch(&[ScanEvent::new("123", StationId::new("lobby"))])?;
//! let delivered = sender.send(&batch).await;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod mock;
mod signer;

pub use client::{HttpSender, HttpSenderConfig, RemoteSender, SenderError};
pub use signer::{SignedBatch, Signer, SignerError};
