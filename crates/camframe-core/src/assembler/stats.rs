use std::collections::BTreeMap;

use serde::Serialize;

use crate::protocol::category::Category;

/// Running counters of one assembler instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblerStats {
    pub frames_completed: u64,
    /// Completed frames keyed by category code, in ascending order.
    pub frames_by_category: BTreeMap<u32, u64>,
    pub checksum_failures: u64,
    pub headers_rejected: u64,
    pub end_markers_missing: u64,
    pub bytes_received: u64,
    pub bytes_discarded: u64,
}

impl AssemblerStats {
    pub(crate) fn record_frame(&mut self, category: Category) {
        self.frames_completed += 1;
        *self.frames_by_category.entry(category.code()).or_default() += 1;
    }

    /// Frames dropped for any reason after a header was accepted.
    pub fn frames_dropped(&self) -> u64 {
        self.checksum_failures + self.end_markers_missing
    }

    pub fn count_for(&self, category: Category) -> u64 {
        self.frames_by_category
            .get(&category.code())
            .copied()
            .unwrap_or(0)
    }
}
