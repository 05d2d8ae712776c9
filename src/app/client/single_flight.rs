//! Single-flight request slots
//!
//! Each logical operation (popular-movies page, movie detail) owns one slot.
//! Starting a request aborts the one still pending in the same slot, and a
//! request whose generation is no longer current resolves to
//! [`ClientError::Superseded`] even if its transport call already finished.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;
use tracing::{debug, error};

use crate::errors::{ClientError, ClientResult, ServerError};

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    active: Option<AbortHandle>,
}

/// At most one outstanding request per operation
#[derive(Debug)]
pub struct SingleFlight {
    label: &'static str,
    slot: Mutex<Slot>,
}

impl SingleFlight {
    /// Create an empty slot; `label` names the operation in logs
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            slot: Mutex::new(Slot::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `request` as the current request of this operation
    ///
    /// The request is spawned so it can be aborted by a later call.
    pub async fn run<F, T>(&self, request: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::spawn(request);

        let generation = {
            let mut slot = self.lock();
            if let Some(previous) = slot.active.take() {
                previous.abort();
                debug!("Cancelled pending {} request", self.label);
            }
            slot.generation += 1;
            slot.active = Some(handle.abort_handle());
            slot.generation
        };

        let outcome = handle.await;

        let current = {
            let mut slot = self.lock();
            if slot.generation == generation {
                slot.active = None;
                true
            } else {
                false
            }
        };

        if !current {
            debug!("Discarding superseded {} result", self.label);
            return Err(ClientError::Superseded);
        }

        match outcome {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ClientError::Superseded),
            Err(e) => {
                error!("{} request task failed: {}", self.label, e);
                Err(ServerError::General.into())
            }
        }
    }

    /// Abort the pending request, if any
    ///
    /// Returns `true` if a request was pending. Its caller receives
    /// [`ClientError::Superseded`].
    pub fn cancel(&self) -> bool {
        let mut slot = self.lock();
        slot.generation += 1;
        match slot.active.take() {
            Some(handle) => {
                handle.abort();
                debug!("Cancelled {} request", self.label);
                true
            }
            None => false,
        }
    }

    /// Whether a request is currently outstanding
    pub fn is_pending(&self) -> bool {
        self.lock().active.is_some()
    }
}
