/// Counters for one reconciliation pass against one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Total number of mutating calls this pass issued.
    pub fn mutations(&self) -> usize {
        self.added + self.updated + self.deleted
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "added {}, updated {}, deleted {}, unchanged {}, skipped {}, failed {}",
            self.added, self.updated, self.deleted, self.unchanged, self.skipped, self.failed
        )
    }
}
