use std::time::Instant;
use tracing::info;

/// Logs "<label> in <secs>s" when dropped
pub struct TimedPhase {
    label: String,
    started: Instant,
}

impl TimedPhase {
    pub fn start(label: impl Into<String>) -> Self {
        Self { label: label.into(), started: Instant::now() }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for TimedPhase {
    fn drop(&mut self) {
        info!("{} in {:.1}s", self.label, self.started.elapsed().as_secs_f64());
    }
}
