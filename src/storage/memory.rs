//! In-memory storage backend, used by tests and `--dry-run`

use crate::storage::traits::{SourceSnapshot, SourceStore, StorageResult};
use chrono::Utc;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    snapshots: BTreeMap<String, SourceSnapshot>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SourceStore for MemoryStore {
    fn save(&mut self, snapshot: &SourceSnapshot) -> StorageResult<()> {
        let mut stored = snapshot.clone();
        stored.updated_at = Some(Utc::now());
        self.snapshots.insert(stored.source_id.clone(), stored);
        self.saves += 1;
        Ok(())
    }

    fn load(&self, source_id: &str) -> StorageResult<Option<SourceSnapshot>> {
        Ok(self.snapshots.get(source_id).cloned())
    }

    fn load_all(&self) -> StorageResult<Vec<SourceSnapshot>> {
        Ok(self.snapshots.values().cloned().collect())
    }
}
