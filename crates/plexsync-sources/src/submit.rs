use std::fmt;

/// Kind of queued remote write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitKind {
    Collection,
    History,
    Ratings,
}

impl fmt::Display for SubmitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitKind::Collection => f.write_str("collection"),
            SubmitKind::History => f.write_str("history"),
            SubmitKind::Ratings => f.write_str("ratings"),
        }
    }
}

/// Result of submitting one chunk of the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub kind: SubmitKind,
    pub items: usize,
    /// Items the service reported as unknown
    pub not_found: usize,
    pub error: Option<String>,
}

/// Per-batch outcome of a queue flush.
///
/// Every batch is attempted even after a failure, so the report shows exactly
/// which writes reached the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub batches: Vec<BatchOutcome>,
}

impl FlushReport {
    pub fn push(&mut self, outcome: BatchOutcome) {
        self.batches.push(outcome);
    }

    pub fn is_success(&self) -> bool {
        self.batches.iter().all(|batch| batch.error.is_none())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|batch| batch.error.is_some())
    }

    /// Items in batches the service accepted
    pub fn submitted(&self) -> usize {
        self.batches
            .iter()
            .filter(|batch| batch.error.is_none())
            .map(|batch| batch.items)
            .sum()
    }

    pub fn failed_items(&self) -> usize {
        self.failed().map(|batch| batch.items).sum()
    }

    pub fn not_found(&self) -> usize {
        self.batches.iter().map(|batch| batch.not_found).sum()
    }
}

impl fmt::Display for FlushReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batches | Submitted: {} | Not found: {} | Failed: {}",
            self.batches.len(),
            self.submitted(),
            self.not_found(),
            self.failed_items()
        )
    }
}
