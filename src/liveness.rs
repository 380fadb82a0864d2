//! Liveness token gating state mutations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that is live from creation until [`dispose`](Self::dispose).
///
/// Executors and accumulators check it before every state write. Disposing
/// does not cancel an in-flight remote call; it only discards that call's
/// effect on state. Clones observe the same flag, so one token can be handed
/// to several executors owned by the same view.
#[derive(Clone, Debug)]
pub struct LivenessToken {
    live: Arc<AtomicBool>,
}

impl LivenessToken {
    pub fn new() -> Self {
        LivenessToken {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Mark the owner as gone. Irreversible.
    pub fn dispose(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            debug!("Liveness token disposed");
        }
    }
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}
