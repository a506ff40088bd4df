//! Audit trail with a bounded retry buffer.
//!
//! Appends never fail the calling command. An entry the store refuses is kept
//! in a FIFO buffer (oldest dropped when full) and re-sent after the next
//! successful store write.

use std::collections::VecDeque;

use ecole_database::{encode, Record, StoreAdapter};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::entities::AuditLogEntry;

pub struct AuditTrail {
    capacity: usize,
    buffer: Mutex<VecDeque<AuditLogEntry>>,
}

impl AuditTrail {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: Mutex::new(VecDeque::new()),
        }
    }

    /// Persist `entry`, buffering it on failure. Returns whether it reached
    /// the store.
    pub async fn append(&self, store: &dyn StoreAdapter, entry: AuditLogEntry) -> bool {
        match send(store, &entry).await {
            Ok(()) => true,
            Err(err) => {
                warn!(action = %entry.action, error = %err, "audit append failed, buffering");
                self.buffer_entry(entry).await;
                false
            }
        }
    }

    async fn buffer_entry(&self, entry: AuditLogEntry) {
        if self.capacity == 0 {
            warn!(action = %entry.action, "audit retry buffer disabled, entry dropped");
            return;
        }

        let mut buffer = self.buffer.lock().await;
        while buffer.len() >= self.capacity {
            if let Some(dropped) = buffer.pop_front() {
                warn!(
                    action = %dropped.action,
                    id = %dropped.id,
                    "audit retry buffer full, dropping oldest entry"
                );
            }
        }
        buffer.push_back(entry);
    }

    /// Re-send buffered entries in order, stopping at the first failure.
    /// Returns how many were delivered.
    pub async fn drain(&self, store: &dyn StoreAdapter) -> usize {
        let mut buffer = self.buffer.lock().await;
        let mut delivered = 0;

        while let Some(entry) = buffer.pop_front() {
            match send(store, &entry).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    debug!(error = %err, remaining = buffer.len() + 1, "audit drain interrupted");
                    buffer.push_front(entry);
                    break;
                }
            }
        }

        if delivered > 0 {
            debug!(delivered, "audit retry buffer drained");
        }
        delivered
    }

    pub async fn buffered(&self) -> Vec<AuditLogEntry> {
        self.buffer.lock().await.iter().cloned().collect()
    }

    pub async fn buffered_len(&self) -> usize {
        self.buffer.lock().await.len()
    }
}

async fn send(store: &dyn StoreAdapter, entry: &AuditLogEntry) -> ecole_database::StoreResult<()> {
    let row = encode(entry)?;
    store.insert(AuditLogEntry::TABLE, row).await?;
    Ok(())
}
