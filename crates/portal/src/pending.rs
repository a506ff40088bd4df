//! Pending-operation queue for optimistic writes.
//!
//! Every optimistic command registers the change it made locally before the
//! store call. A confirmed write settles the operation; a failed one stays in
//! the queue until `retry_pending` sends it again. When a collection is
//! reloaded, the operations still queued for its table are replayed over the
//! fresh server rows so local work is not lost:
//!
//! - upserts re-add unconfirmed inserts and overlay fields on existing rows
//! - patches overlay their fields (last writer wins per field)
//! - deletes keep the entity deleted
//! - votes are merged by user id into the poll's options

use chrono::{DateTime, Utc};
use ecole_database::{codec, Record, Row, StoreResult, Table};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::utils::new_id;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingChange {
    /// Whole record, client-shaped (camelCase keys).
    Upsert { row: Row },
    /// Changed fields only, client-shaped.
    Patch { row: Row },
    Delete,
    Vote { option_id: String, user_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    InFlight,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOp {
    pub id: String,
    pub table: Table,
    pub entity_id: String,
    pub change: PendingChange,
    pub status: PendingStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    ops: Vec<PendingOp>,
}

impl PendingQueue {
    /// Queue a change that is about to be sent. Returns the operation id.
    pub fn register(
        &mut self,
        table: Table,
        entity_id: &str,
        change: PendingChange,
        now: DateTime<Utc>,
    ) -> String {
        if change == PendingChange::Delete {
            // Earlier changes to a deleted entity can no longer apply.
            self.ops
                .retain(|op| !(op.table == table && op.entity_id == entity_id));
        }

        let id = new_id();
        self.ops.push(PendingOp {
            id: id.clone(),
            table,
            entity_id: entity_id.to_string(),
            change,
            status: PendingStatus::InFlight,
            attempts: 1,
            created_at: now,
            last_error: None,
        });
        id
    }

    /// The store confirmed the operation.
    pub fn settle(&mut self, op_id: &str) {
        self.ops.retain(|op| op.id != op_id);
    }

    pub fn fail(&mut self, op_id: &str, error: impl Into<String>) {
        if let Some(op) = self.ops.iter_mut().find(|op| op.id == op_id) {
            op.status = PendingStatus::Failed;
            op.last_error = Some(error.into());
        }
    }

    /// Take the failed operations for a new attempt, marking them in flight.
    pub fn begin_retry(&mut self) -> Vec<PendingOp> {
        let mut retried = Vec::new();
        for op in &mut self.ops {
            if op.status == PendingStatus::Failed {
                op.status = PendingStatus::InFlight;
                op.attempts += 1;
                retried.push(op.clone());
            }
        }
        retried
    }

    pub fn all(&self) -> &[PendingOp] {
        &self.ops
    }

    pub fn failed_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| op.status == PendingStatus::Failed)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Replay queued operations for `T`'s table over freshly loaded values.
    pub fn reconcile<T: Record>(&self, fresh: Vec<T>) -> StoreResult<Vec<T>> {
        let ops: Vec<&PendingOp> = self.ops.iter().filter(|op| op.table == T::TABLE).collect();
        if ops.is_empty() {
            return Ok(fresh);
        }

        let mut rows = Vec::with_capacity(fresh.len());
        for value in &fresh {
            rows.push((value.id().to_string(), codec::to_client_row(value)?));
        }

        for op in ops {
            let position = rows.iter().position(|(id, _)| *id == op.entity_id);
            match (&op.change, position) {
                (PendingChange::Upsert { row }, Some(index)) => overlay(&mut rows[index].1, row),
                (PendingChange::Upsert { row }, None) => {
                    rows.push((op.entity_id.clone(), row.clone()));
                }
                (PendingChange::Patch { row }, Some(index)) => overlay(&mut rows[index].1, row),
                (PendingChange::Delete, Some(index)) => {
                    rows.remove(index);
                }
                (PendingChange::Vote { option_id, user_id }, Some(index)) => {
                    merge_vote(&mut rows[index].1, option_id, user_id);
                }
                (_, None) => {
                    debug!(table = %op.table, entity = %op.entity_id, "pending change has no server row");
                }
            }
        }

        let table = T::TABLE;
        let mut reconciled = Vec::with_capacity(rows.len());
        for (id, row) in rows {
            match codec::from_client_row::<T>(row) {
                Ok(value) => reconciled.push(value),
                Err(err) => {
                    warn!(%table, %id, error = %err, "dropping unreadable reconciled row");
                }
            }
        }
        Ok(reconciled)
    }
}

fn overlay(target: &mut Row, patch: &Row) {
    for (key, value) in patch {
        if key != "id" {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Move `user_id`'s vote onto `option_id` inside a client-shaped poll row.
pub(crate) fn merge_vote(poll: &mut Row, option_id: &str, user_id: &str) {
    let Some(Value::Array(options)) = poll.get_mut("options") else {
        return;
    };
    if !options
        .iter()
        .any(|option| option.get("id").and_then(Value::as_str) == Some(option_id))
    {
        return;
    }

    for option in options.iter_mut() {
        let is_target = option.get("id").and_then(Value::as_str) == Some(option_id);
        let Some(object) = option.as_object_mut() else {
            continue;
        };
        let voters = object
            .entry("voterIds")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(ids) = voters {
            ids.retain(|voter| voter.as_str() != Some(user_id));
            if is_target {
                ids.push(Value::String(user_id.to_string()));
            }
        }
    }
}
