use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use crate::errors::DatabaseError;
use crate::sequence::SequenceSegment;
use crate::types::DatasetName;

/// Process-scoped cache of weakly-held sequence segments keyed by name.
///
/// While any strong reference to a materialized segment survives, lookups of
/// the same name return that exact instance. Once every reference is gone
/// the entry is dead and the next lookup rebuilds. Builder failures propagate
/// and never poison the entry, so the next call retries.
#[derive(Default)]
pub struct WeakSequenceCache {
    entries: RwLock<HashMap<DatasetName, Weak<SequenceSegment>>>,
}

impl WeakSequenceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live segment for `name`, building it when absent or dead.
    pub fn get_or_build(
        &self,
        name: &str,
        builder: impl FnOnce() -> Result<SequenceSegment, DatabaseError>,
    ) -> Result<Arc<SequenceSegment>, DatabaseError> {
        if let Some(live) = self.lookup(name) {
            return Ok(live);
        }
        let segment = Arc::new(builder()?);
        let mut entries = self.entries.write().expect("sequence cache poisoned");
        entries.insert(name.to_string(), Arc::downgrade(&segment));
        Ok(segment)
    }

    fn lookup(&self, name: &str) -> Option<Arc<SequenceSegment>> {
        let entries = self.entries.read().expect("sequence cache poisoned");
        entries.get(name).and_then(Weak::upgrade)
    }

    /// Number of entries whose segments are still alive.
    pub fn live_len(&self) -> usize {
        let entries = self.entries.read().expect("sequence cache poisoned");
        entries
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Drop entries whose segments have been collected.
    pub fn prune(&self) {
        let mut entries = self.entries.write().expect("sequence cache poisoned");
        entries.retain(|_, weak| weak.strong_count() > 0);
    }
}
