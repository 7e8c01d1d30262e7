//! In-memory block cursor.

use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use lookout_core::error::{StorageError, StorageResult};
use lookout_core::ports::CursorStore;

/// In-memory implementation of [`CursorStore`].
///
/// "Not set" is an explicit `None`, kept distinct from height 0 so
/// genesis is never conflated with "nothing ingested yet".
#[derive(Default)]
pub struct MemCursorStore {
    height: RwLock<Option<u64>>,
}

impl MemCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CursorStore for MemCursorStore {
    async fn current_height(&self) -> StorageResult<Option<u64>> {
        let height = self
            .height
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        Ok(*height)
    }

    async fn set_current_height(&self, height: u64) -> StorageResult<()> {
        let mut slot = self
            .height
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        debug!(height, "Cursor advanced");
        *slot = Some(height);
        Ok(())
    }
}
