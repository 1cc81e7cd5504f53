//! Sync scheduler: gates and serializes sync-pass requests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::IdentityProvider;
use crate::models::EntityKind;
use crate::worker::SyncRunner;

/// Per-kind pass bookkeeping, shared between the scheduler and the running
/// pass task. Exit and supersede decisions both take this lock, so a request
/// can never land between a pass's final flag check and its exit.
#[derive(Default)]
struct SlotState {
    running: bool,
    /// Set when a request arrives while a pass is running; the running task
    /// re-runs once after finishing. New requests replace, they never queue.
    rerun: bool,
}

struct Slot {
    runner: Arc<dyn SyncRunner>,
    state: Arc<Mutex<SlotState>>,
}

/// Decides whether a sync pass runs at all, and serializes passes per kind.
///
/// Anonymous (signed-out) mode never attempts network sync. At most one pass
/// runs per entity kind at a time; a request arriving mid-pass supersedes any
/// previously queued request for that kind.
pub struct SyncScheduler {
    identity: Arc<dyn IdentityProvider>,
    slots: Mutex<HashMap<EntityKind, Slot>>,
}

impl SyncScheduler {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            identity,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Register the runner for its entity kind, replacing any previous one
    pub fn register(&self, runner: Arc<dyn SyncRunner>) {
        let kind = runner.kind();
        self.lock_slots().insert(
            kind,
            Slot {
                runner,
                state: Arc::default(),
            },
        );
    }

    /// Request a sync pass for the given entity kind.
    ///
    /// No-op without a signed-in identity. Must be called within a Tokio
    /// runtime.
    pub fn request_sync(&self, kind: EntityKind) {
        let Some(user) = self.identity.current_user() else {
            tracing::debug!(%kind, "skipping sync request; no signed-in identity");
            return;
        };

        let slots = self.lock_slots();
        let Some(slot) = slots.get(&kind) else {
            tracing::warn!(%kind, "no sync runner registered");
            return;
        };

        {
            let mut state = lock_state(&slot.state);
            if state.running {
                state.rerun = true;
                tracing::debug!(%kind, "pass already running; superseding queued request");
                return;
            }
            state.running = true;
            state.rerun = false;
        }

        let runner = Arc::clone(&slot.runner);
        let state = Arc::clone(&slot.state);
        tracing::debug!(%kind, user = %user.id, "starting sync pass");
        tokio::spawn(async move {
            loop {
                match runner.run().await {
                    Ok(()) => tracing::debug!(kind = %runner.kind(), "sync pass succeeded"),
                    Err(error) => {
                        tracing::warn!(kind = %runner.kind(), %error, "sync pass failed; will retry on next request");
                    }
                }
                let mut guard = lock_state(&state);
                if guard.rerun {
                    guard.rerun = false;
                } else {
                    guard.running = false;
                    break;
                }
            }
        });
    }

    /// Whether a pass is currently running for the given kind
    #[must_use]
    pub fn is_running(&self, kind: EntityKind) -> bool {
        self.lock_slots()
            .get(&kind)
            .is_some_and(|slot| lock_state(&slot.state).running)
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<EntityKind, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock_state(state: &Mutex<SlotState>) -> MutexGuard<'_, SlotState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
