/// Lightweight progress reporting for a collection run.
/// Frontends implement this to surface status to operators; every method is optional.
pub trait Progress: Send {
    /// Called once with the number of top-level items about to be archived.
    fn begin(&mut self, _total: usize) {}

    /// One top-level item finished, including all of its sequence members.
    fn item_done(&mut self, _url: &str) {}

    /// One concrete item (or sequence member) failed and was recorded.
    fn item_failed(&mut self, _url: &str, _message: &str) {}

    /// Called at the end, completed or interrupted.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Emits a tracing event per step.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: usize,
    done: usize,
    failed: usize,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        self.failed = 0;
        tracing::info!(total, "[ARCHIVE] Archiving collection items");
    }

    fn item_done(&mut self, url: &str) {
        self.done += 1;
        tracing::info!(
            done = self.done,
            total = self.total,
            url,
            "[ARCHIVE] Item processed"
        );
    }

    fn item_failed(&mut self, url: &str, message: &str) {
        self.failed += 1;
        tracing::warn!(url, error = message, "[ARCHIVE] Item could not be archived");
    }

    fn finish(&mut self) {
        tracing::info!(
            done = self.done,
            total = self.total,
            failed = self.failed,
            "[ARCHIVE] Progress finished"
        );
    }
}
