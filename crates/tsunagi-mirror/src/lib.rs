// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! redb-backed realtime mirror.
//!
//! Holds, per platform handle, a bounded JSON list of abbreviated message
//! projections for low-latency UI reads. The mirror is written before the
//! authoritative store (temporary id) and superseded after it (authoritative
//! id); it is never the correctness boundary and can be rebuilt from SQLite
//! at any time.

use std::path::Path;

use async_trait::async_trait;
use redb::{ReadableTable, TableDefinition};

use tsunagi_config::model::MirrorConfig;
use tsunagi_core::traits::MirrorStore;
use tsunagi_core::types::MirrorEntry;
use tsunagi_core::TsunagiError;

const MIRROR_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("mirror");

/// Mirror store persisted in a single redb file.
pub struct RedbMirror {
    db: redb::Database,
    retain: usize,
}

impl RedbMirror {
    /// Open (creating if absent) the mirror at the configured path.
    pub fn open(config: &MirrorConfig) -> Result<Self, TsunagiError> {
        if let Some(parent) = Path::new(&config.path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(map_err)?;
        }
        let db = redb::Database::create(&config.path).map_err(map_err)?;
        Ok(Self {
            db,
            retain: config.retain,
        })
    }

    /// Read the handle's current list inside an open write transaction.
    fn load_entries(
        table: &redb::Table<'_, &str, &[u8]>,
        handle: &str,
    ) -> Result<Vec<MirrorEntry>, TsunagiError> {
        let raw = match table.get(handle).map_err(map_err)? {
            Some(guard) => guard.value().to_vec(),
            None => return Ok(Vec::new()),
        };
        serde_json::from_slice(&raw).map_err(|e| TsunagiError::Mirror {
            message: format!("corrupt mirror payload for handle {handle}"),
            source: Some(Box::new(e)),
        })
    }

    /// Read-modify-write the handle's list inside one write transaction,
    /// then trim to the retention bound.
    fn update_entries(
        &self,
        handle: &str,
        apply: impl FnOnce(&mut Vec<MirrorEntry>),
    ) -> Result<(), TsunagiError> {
        let txn = self.db.begin_write().map_err(map_err)?;
        {
            let mut table = txn.open_table(MIRROR_TABLE).map_err(map_err)?;
            let mut entries = Self::load_entries(&table, handle)?;
            apply(&mut entries);
            if entries.len() > self.retain {
                let excess = entries.len() - self.retain;
                entries.drain(..excess);
            }
            let payload = serde_json::to_vec(&entries).map_err(|e| TsunagiError::Mirror {
                message: "mirror payload serialization failed".to_string(),
                source: Some(Box::new(e)),
            })?;
            table.insert(handle, payload.as_slice()).map_err(map_err)?;
        }
        txn.commit().map_err(map_err)?;
        Ok(())
    }
}

#[async_trait]
impl MirrorStore for RedbMirror {
    async fn append(&self, handle: &str, entry: MirrorEntry) -> Result<(), TsunagiError> {
        self.update_entries(handle, |entries| entries.push(entry))
    }

    async fn supersede(
        &self,
        handle: &str,
        temp_id: &str,
        entry: MirrorEntry,
    ) -> Result<(), TsunagiError> {
        self.update_entries(handle, |entries| {
            match entries.iter_mut().find(|e| e.id == temp_id) {
                Some(slot) => *slot = entry,
                // Temporary entry already evicted; appending keeps the
                // mirror converging toward the authoritative store.
                None => entries.push(entry),
            }
        })
    }

    async fn recent(&self, handle: &str) -> Result<Vec<MirrorEntry>, TsunagiError> {
        let txn = self.db.begin_read().map_err(map_err)?;
        let table = match txn.open_table(MIRROR_TABLE) {
            Ok(table) => table,
            // No write has happened yet anywhere in the store.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(map_err(e)),
        };
        let raw = match table.get(handle).map_err(map_err)? {
            Some(guard) => guard.value().to_vec(),
            None => return Ok(Vec::new()),
        };
        serde_json::from_slice(&raw).map_err(|e| TsunagiError::Mirror {
            message: format!("corrupt mirror payload for handle {handle}"),
            source: Some(Box::new(e)),
        })
    }

    async fn probe(&self) -> Result<(), TsunagiError> {
        self.db.begin_read().map_err(map_err)?;
        Ok(())
    }
}

fn map_err<E: std::error::Error + Send + Sync + 'static>(err: E) -> TsunagiError {
    TsunagiError::Mirror {
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}
