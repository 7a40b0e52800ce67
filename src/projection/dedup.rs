use std::collections::HashSet;

use crate::db::models::ProjectionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Duplicate,
    Ineligible,
}

/// Per-pass set of draftable UIDs already emitted.
#[derive(Debug, Default)]
pub struct DedupGate {
    seen: HashSet<String>,
}

impl DedupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the UID of an accepted candidate. Ineligible candidates never
    /// claim their UID, so a later eligible slot with the same UID can pass.
    pub fn admit(&mut self, record: &ProjectionRecord) -> Admission {
        if !record.eligible {
            return Admission::Ineligible;
        }
        if self.seen.contains(&record.draftable_uid) {
            return Admission::Duplicate;
        }
        self.seen.insert(record.draftable_uid.clone());
        Admission::Accepted
    }
}
