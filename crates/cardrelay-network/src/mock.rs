//! Scripted sender for testing delivery logic without a collector.

use crate::client::RemoteSender;
use crate::signer::SignedBatch;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<bool>,
    fallback: bool,
    sent: Vec<SignedBatch>,
}

/// Sender whose outcomes are scripted in advance.
///
/// Each attempt pops the next scripted outcome; once the script runs out
/// the fallback applies. Every batch is recorded. Clones share state, so a
/// test can keep one clone to inspect what the worker sent.
///
/// # Examples
///
/// ```
/// use cardrelay_network::mock::MockSender;
///
/// let sender = MockSender::scripted([false, true], false);
/// assert_eq!(sender.attempts(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSender {
    state: Arc<Mutex<MockState>>,
}

impl MockSender {
    /// Sender that always reports `outcome`.
    pub fn always(outcome: bool) -> Self {
        Self::scripted([], outcome)
    }

    /// Sender that replays `outcomes`, then reports `fallback`.
    pub fn scripted(outcomes: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                script: outcomes.into_iter().collect(),
                fallback,
                sent: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue one more outcome.
    pub fn push_outcome(&self, outcome: bool) {
        self.lock().script.push_back(outcome);
    }

    /// Change the outcome used once the script is exhausted.
    pub fn set_fallback(&self, outcome: bool) {
        self.lock().fallback = outcome;
    }

    /// Every batch attempted so far, in order.
    pub fn sent(&self) -> Vec<SignedBatch> {
        self.lock().sent.clone()
    }

    /// Number of attempts so far.
    pub fn attempts(&self) -> usize {
        self.lock().sent.len()
    }
}

impl RemoteSender for MockSender {
    async fn send(&self, batch: &SignedBatch) -> bool {
        let mut state = self.lock();
        state.sent.push(batch.clone());
        let fallback = state.fallback;
        state.script.pop_front().unwrap_or(fallback)
    }
}
