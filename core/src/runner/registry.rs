use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

/// Outcome of best-effort child teardown. Teardown never fails the caller,
/// but keeping the reason around lets tests assert cleanup was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Clean,
    Ignored(String),
}

/// Registry of currently running children, keyed by PID.
///
/// Owned by the [`super::ProcessRunner`] instance; the map holds the kill
/// channels of in-flight waits. Killing a tracked child resolves its pending
/// wait with a nonzero exit rather than raising.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    inner: Mutex<HashMap<u32, mpsc::Sender<()>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, pid: u32, kill_tx: mpsc::Sender<()>) {
        self.lock().insert(pid, kill_tx);
    }

    pub(crate) fn remove(&self, pid: u32) {
        self.lock().remove(&pid);
    }

    /// Request the kill of a tracked child. Returns whether the request was
    /// delivered to a live runner loop.
    pub fn kill(&self, pid: u32) -> bool {
        match self.lock().get(&pid) {
            Some(tx) => tx.try_send(()).is_ok(),
            None => false,
        }
    }

    /// Kill every tracked child; returns how many kill requests landed.
    pub fn kill_all(&self) -> usize {
        let guard = self.lock();
        guard
            .values()
            .filter(|tx| tx.try_send(()).is_ok())
            .count()
    }

    pub fn running_pids(&self) -> Vec<u32> {
        self.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u32, mpsc::Sender<()>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_on_unknown_pid_is_false() {
        let registry = ProcessRegistry::new();
        assert!(!registry.kill(4242));
        assert_eq!(registry.kill_all(), 0);
    }

    #[test]
    fn register_and_remove() {
        let registry = ProcessRegistry::new();
        let (tx, mut rx) = mpsc::channel(1);
        registry.register(7, tx);
        assert_eq!(registry.running_pids(), vec![7]);

        assert!(registry.kill(7));
        assert!(rx.try_recv().is_ok());

        registry.remove(7);
        assert!(registry.is_empty());
        assert!(!registry.kill(7));
    }
}
