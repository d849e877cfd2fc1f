//! Reference pool diagnostics

use std::fmt;

use crate::foundation::any::short_type_name;

/// Snapshot of one collection's counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePoolInfo {
    /// Fully qualified payload type name
    pub type_name: &'static str,
    /// Instances resting in the free list
    pub unused_count: usize,
    /// Instances handed out and not yet released
    pub using_count: usize,
    /// Cumulative acquires
    pub acquire_count: usize,
    /// Cumulative releases
    pub release_count: usize,
    /// Cumulative pre-warmed instances
    pub add_count: usize,
    /// Cumulative instances dropped from the free list
    pub remove_count: usize,
}

impl fmt::Display for ReferencePoolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: unused {}, using {}, acquired {}, released {}, added {}, removed {}",
            short_type_name(self.type_name),
            self.unused_count,
            self.using_count,
            self.acquire_count,
            self.release_count,
            self.add_count,
            self.remove_count
        )
    }
}
