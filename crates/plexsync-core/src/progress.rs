/// Observer for per-section progress, e.g. a progress bar
pub trait SyncProgress {
    fn section_started(&self, _title: &str, _total: usize) {}
    fn item_processed(&self) {}
    fn section_finished(&self) {}
}

/// Reports nothing
pub struct NoProgress;

impl SyncProgress for NoProgress {}
