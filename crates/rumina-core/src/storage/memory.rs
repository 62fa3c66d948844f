//! In-Memory State Store
//!
//! Reference implementation of [`StateStore`]: a single map behind a mutex.
//! Compare-and-swap atomicity falls out of holding the map lock for the
//! whole version check + write.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{DueItem, Result, StateStore, StoreError};
use crate::state::LearnerItemState;

/// In-memory reference store
///
/// Suitable for tests, embedded use, and as the executable definition of
/// the store contract. All methods take `&self`; the store is `Send + Sync`
/// and can be shared as `Arc<MemoryStore>` across sessions and threads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(String, String), LearnerItemState>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), LearnerItemState>>> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("state map lock poisoned".to_string()))
    }
}

impl StateStore for MemoryStore {
    fn read(&self, user_id: &str, item_id: &str) -> Result<Option<LearnerItemState>> {
        let records = self.lock()?;
        Ok(records.get(&(user_id.to_string(), item_id.to_string())).cloned())
    }

    fn create(&self, user_id: &str, item_id: &str, state: &LearnerItemState) -> Result<()> {
        let mut records = self.lock()?;
        let key = (user_id.to_string(), item_id.to_string());
        if records.contains_key(&key) {
            return Err(StoreError::AlreadyTracked {
                user_id: user_id.to_string(),
                item_id: item_id.to_string(),
            });
        }
        records.insert(key, state.clone());
        Ok(())
    }

    fn compare_and_swap(
        &self,
        user_id: &str,
        item_id: &str,
        expected_version: u64,
        new_state: &LearnerItemState,
    ) -> Result<()> {
        let mut records = self.lock()?;
        let key = (user_id.to_string(), item_id.to_string());
        match records.get(&key) {
            Some(current) if current.version == expected_version => {
                records.insert(key, new_state.clone());
                Ok(())
            }
            // A vanished record counts as losing the race too
            _ => Err(StoreError::VersionConflict {
                expected: expected_version,
            }),
        }
    }

    fn due_before(&self, user_id: &str, as_of: DateTime<Utc>, limit: usize) -> Result<Vec<DueItem>> {
        let records = self.lock()?;
        let mut due: Vec<DueItem> = records
            .iter()
            .filter(|((user, _), state)| user == user_id && state.due_at <= as_of)
            .map(|((_, item), state)| DueItem {
                item_id: item.clone(),
                due_at: state.due_at,
            })
            .collect();
        due.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.item_id.cmp(&b.item_id)));
        due.truncate(limit);
        Ok(due)
    }

    fn tracked_count(&self, user_id: &str) -> Result<u64> {
        let records = self.lock()?;
        Ok(records.keys().filter(|(user, _)| user == user_id).count() as u64)
    }
}

// ============================================================================
// TESTS
// ============================================================================
