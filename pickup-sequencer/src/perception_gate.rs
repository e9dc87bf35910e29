use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use pickup_interface::{Error, ObjectSnapshot, Point3};
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    AwaitingSnapshot,
}

#[derive(Debug, Default)]
struct Latch {
    awaiting: bool,
    snapshot: Option<ObjectSnapshot>,
    // number of captured updates
    captures: u64,
}

/// Holds the latest object snapshot explicitly requested by the sequencer.
///
/// Updates of the perception feed are only captured between
/// [`request_snapshot`](Self::request_snapshot) and the next update; every
/// other update is dropped, so a captured snapshot never predates the
/// request. The last captured snapshot stays readable until the next capture
/// replaces it.
#[derive(Debug, Default)]
pub struct PerceptionGate {
    latch: Mutex<Latch>,
    captured: Notify,
}

impl PerceptionGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Latch> {
        self.latch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> GateState {
        if self.lock().awaiting {
            GateState::AwaitingSnapshot
        } else {
            GateState::Idle
        }
    }

    /// Starts waiting for the next feed update.
    pub fn request_snapshot(&self) {
        self.lock().awaiting = true;
        trace!("snapshot requested");
    }

    /// Handles one update of the perception feed. Returns true if the update
    /// was captured.
    pub fn on_feed_update(&self, objects: Vec<Point3<f64>>) -> bool {
        {
            let mut latch = self.lock();
            if !latch.awaiting {
                trace!(num_objects = objects.len(), "drop update, no request");
                return false;
            }
            debug!(num_objects = objects.len(), "snapshot captured");
            latch.snapshot = Some(ObjectSnapshot::new(objects));
            latch.captures += 1;
            latch.awaiting = false;
        }
        self.captured.notify_waiters();
        true
    }

    /// Returns the last captured snapshot, or `None` if nothing was ever
    /// captured.
    pub fn current_snapshot(&self) -> Option<ObjectSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Waits until the outstanding request is answered and returns the
    /// captured snapshot. Without an outstanding request, returns the last
    /// captured snapshot.
    ///
    /// Returns [`Error::PerceptionTimeout`] if nothing is captured within
    /// `timeout`.
    pub async fn wait_snapshot(&self, timeout: Duration) -> Result<ObjectSnapshot, Error> {
        let deadline = tokio::time::Instant::now() + timeout;
        let captures_at_start = {
            let latch = self.lock();
            match &latch.snapshot {
                Some(snapshot) if !latch.awaiting => return Ok(snapshot.clone()),
                _ => latch.captures,
            }
        };
        loop {
            let captured = self.captured.notified();
            tokio::pin!(captured);
            // Register before checking so that a capture in between is not lost.
            captured.as_mut().enable();
            {
                let latch = self.lock();
                if latch.captures > captures_at_start {
                    if let Some(snapshot) = &latch.snapshot {
                        return Ok(snapshot.clone());
                    }
                }
            }
            if tokio::time::timeout_at(deadline, captured).await.is_err() {
                return Err(Error::PerceptionTimeout {
                    timeout,
                    attempts: 1,
                });
            }
        }
    }

    /// Forwards every message of the feed to
    /// [`on_feed_update`](Self::on_feed_update) until the sender is dropped.
    pub fn attach(self: &Arc<Self>, feed: flume::Receiver<Vec<Point3<f64>>>) -> JoinHandle<()> {
        let gate = self.clone();
        tokio::spawn(async move {
            while let Ok(objects) = feed.recv_async().await {
                gate.on_feed_update(objects);
            }
            debug!("perception feed closed");
        })
    }
}
