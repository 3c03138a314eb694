use std::time::Duration;

use ramp_anchors::Anchor;
use ramp_core::{OffRampTransaction, OnRampTransaction};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time;

use crate::error::FlowError;

fn default_interval_ms() -> u64 {
    2_000
}

fn default_max_attempts() -> u32 {
    30
}

/// Fixed-interval polling parameters, caller-supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Milliseconds between polls.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// A `(sender, receiver)` pair for cooperative flow cancellation. Send
/// `true` to stop every poller holding the receiver.
pub fn cancellation() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Wait for the next tick or a cancellation signal.
async fn tick_or_cancel(
    ticker: &mut time::Interval,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), FlowError> {
    tokio::select! {
        _ = ticker.tick() => Ok(()),
        changed = cancel.changed() => {
            if changed.is_ok() && *cancel.borrow() {
                return Err(FlowError::Cancelled);
            }
            // Sender dropped: cancellation can no longer arrive.
            ticker.tick().await;
            Ok(())
        }
    }
}

/// Poll an off-ramp at a fixed interval until `done` accepts the observed
/// transaction.
///
/// One outstanding call per transaction; no retry on error, the first
/// failure propagates. A transaction that disappears mid-flight surfaces as
/// [`FlowError::TransactionVanished`] rather than being re-awaited.
pub async fn poll_off_ramp<P>(
    anchor: &dyn Anchor,
    id: &str,
    config: &PollConfig,
    cancel: &mut watch::Receiver<bool>,
    mut done: P,
) -> Result<OffRampTransaction, FlowError>
where
    P: FnMut(&OffRampTransaction) -> bool,
{
    let mut ticker = time::interval(Duration::from_millis(config.interval_ms));
    for attempt in 1..=config.max_attempts {
        tick_or_cancel(&mut ticker, cancel).await?;
        match anchor.get_off_ramp(id).await? {
            Some(tx) if done(&tx) => return Ok(tx),
            Some(tx) => {
                tracing::debug!(transaction_id = %id, status = %tx.status, attempt, "off-ramp poll");
            }
            None => return Err(FlowError::TransactionVanished(id.to_string())),
        }
    }
    Err(FlowError::PollTimeout {
        id: id.to_string(),
        attempts: config.max_attempts,
    })
}

/// Poll an on-ramp at a fixed interval until `done` accepts the observed
/// transaction.
pub async fn poll_on_ramp<P>(
    anchor: &dyn Anchor,
    id: &str,
    config: &PollConfig,
    cancel: &mut watch::Receiver<bool>,
    mut done: P,
) -> Result<OnRampTransaction, FlowError>
where
    P: FnMut(&OnRampTransaction) -> bool,
{
    let mut ticker = time::interval(Duration::from_millis(config.interval_ms));
    for attempt in 1..=config.max_attempts {
        tick_or_cancel(&mut ticker, cancel).await?;
        match anchor.get_on_ramp(id).await? {
            Some(tx) if done(&tx) => return Ok(tx),
            Some(tx) => {
                tracing::debug!(transaction_id = %id, status = %tx.status, attempt, "on-ramp poll");
            }
            None => return Err(FlowError::TransactionVanished(id.to_string())),
        }
    }
    Err(FlowError::PollTimeout {
        id: id.to_string(),
        attempts: config.max_attempts,
    })
}
