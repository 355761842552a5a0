use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative interrupt flag.
///
/// The editor raises it (typically from its interrupt key handler) and the
/// long-running loops poll it once per outer iteration. Clones share the
/// same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Clear a previous interrupt so the token can be reused for the next command.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
