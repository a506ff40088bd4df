//! In-process store adapter.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{merge_row, row_id, Filter, Row, StoreAdapter, StoreError, StoreResult, Table};

#[derive(Default)]
struct MemoryTables {
    tables: HashMap<Table, Vec<Row>>,
    offline: bool,
    offline_tables: HashSet<Table>,
}

impl MemoryTables {
    fn check_online(&self, table: Table) -> StoreResult<()> {
        if self.offline || self.offline_tables.contains(&table) {
            return Err(StoreError::Unavailable(format!(
                "memory store offline for {table}"
            )));
        }
        Ok(())
    }

    fn check_unique(&self, table: Table, candidate: &Row, skip_id: Option<&str>) -> StoreResult<()> {
        let Some(rows) = self.tables.get(&table) else {
            return Ok(());
        };

        for column in table.unique_columns() {
            let Some(value) = candidate.get(*column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = rows
                .iter()
                .filter(|row| skip_id.is_none() || row_id(row) != skip_id)
                .any(|row| row.get(*column) == Some(value));
            if clash {
                return Err(StoreError::Constraint(format!(
                    "duplicate value for {table}.{column}"
                )));
            }
        }
        Ok(())
    }
}

/// Store adapter holding every table in memory.
///
/// Clones share the same tables, so a test can keep a handle while the
/// portal owns another. `set_offline` / `set_table_offline` simulate an
/// unreachable backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryTables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content of a table.
    pub async fn seed(&self, table: Table, rows: Vec<Row>) {
        let mut inner = self.inner.write().await;
        inner.tables.insert(table, rows);
    }

    /// Current rows of a table, in insertion order.
    pub async fn rows(&self, table: Table) -> Vec<Row> {
        let inner = self.inner.read().await;
        inner.tables.get(&table).cloned().unwrap_or_default()
    }

    pub async fn set_offline(&self, offline: bool) {
        self.inner.write().await.offline = offline;
    }

    pub async fn set_table_offline(&self, table: Table, offline: bool) {
        let mut inner = self.inner.write().await;
        if offline {
            inner.offline_tables.insert(table);
        } else {
            inner.offline_tables.remove(&table);
        }
    }
}

#[async_trait]
impl StoreAdapter for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn select_all(&self, table: Table) -> StoreResult<Vec<Row>> {
        let inner = self.inner.read().await;
        inner.check_online(table)?;
        Ok(inner.tables.get(&table).cloned().unwrap_or_default())
    }

    async fn select_where(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Row>> {
        let inner = self.inner.read().await;
        inner.check_online(table)?;
        Ok(inner
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row> {
        let mut inner = self.inner.write().await;
        inner.check_online(table)?;

        if let Some(id) = row_id(&row) {
            let exists = inner
                .tables
                .get(&table)
                .map(|rows| rows.iter().any(|existing| row_id(existing) == Some(id)))
                .unwrap_or(false);
            if exists {
                return Err(StoreError::Constraint(format!("duplicate id {id} in {table}")));
            }
        }
        inner.check_unique(table, &row, None)?;

        debug!(%table, id = ?row_id(&row), "memory insert");
        inner.tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, patch: Row) -> StoreResult<Row> {
        let mut inner = self.inner.write().await;
        inner.check_online(table)?;
        inner.check_unique(table, &patch, Some(id))?;

        let row = inner
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or_else(|| StoreError::not_found(table, id))?;

        merge_row(row, patch);
        Ok(row.clone())
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.check_online(table)?;
        if let Some(rows) = inner.tables.get_mut(&table) {
            rows.retain(|row| row_id(row) != Some(id));
        }
        Ok(())
    }

    async fn upsert(&self, table: Table, key: &str, row: Row) -> StoreResult<Row> {
        let mut inner = self.inner.write().await;
        inner.check_online(table)?;

        let key_value = row
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::InvalidColumn(format!("upsert row has no {key}")))?;

        let rows = inner.tables.entry(table).or_default();
        if let Some(existing) = rows
            .iter_mut()
            .find(|existing| existing.get(key) == Some(&key_value))
        {
            merge_row(existing, row);
            return Ok(existing.clone());
        }

        let mut row = row;
        if !row.contains_key("id") {
            let id = match &key_value {
                Value::String(value) => value.clone(),
                other => other.to_string(),
            };
            row.insert("id".to_string(), Value::String(id));
        }
        rows.push(row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_update_delete_cycle() {
        let store = MemoryStore::new();
        store
            .insert(Table::Exams, row(json!({"id": "e1", "room": "S1"})))
            .await
            .unwrap();

        let updated = store
            .update(Table::Exams, "e1", row(json!({"room": "S2"})))
            .await
            .unwrap();
        assert_eq!(updated["room"], "S2");

        store.delete(Table::Exams, "e1").await.unwrap();
        assert!(store.select_all(Table::Exams).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(Table::Polls, "nope", row(json!({"active": false})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store
            .insert(Table::Users, row(json!({"id": "u1", "email": "a@x.com"})))
            .await
            .unwrap();

        let err = store
            .insert(Table::Users, row(json!({"id": "u2", "email": "a@x.com"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn upsert_by_key_merges_existing_row() {
        let store = MemoryStore::new();
        store
            .upsert(Table::AppSettings, "key", row(json!({"key": "school_name", "value": "A"})))
            .await
            .unwrap();
        store
            .upsert(Table::AppSettings, "key", row(json!({"key": "school_name", "value": "B"})))
            .await
            .unwrap();

        let rows = store.rows(Table::AppSettings).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["value"], "B");
        assert_eq!(rows[0]["id"], "school_name");
    }

    #[tokio::test]
    async fn offline_table_fails_only_that_table() {
        let store = MemoryStore::new();
        store.set_table_offline(Table::AuditLogs, true).await;

        assert!(store
            .insert(Table::AuditLogs, row(json!({"id": "l1"})))
            .await
            .is_err());
        assert!(store
            .insert(Table::Classes, row(json!({"id": "c1", "name": "6A"})))
            .await
            .is_ok());

        store.set_table_offline(Table::AuditLogs, false).await;
        assert!(store
            .insert(Table::AuditLogs, row(json!({"id": "l1"})))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn select_where_filters_rows() {
        let store = MemoryStore::new();
        store
            .seed(
                Table::Users,
                vec![
                    row(json!({"id": "u1", "email": "a@x.com"})),
                    row(json!({"id": "u2", "email": "b@x.com"})),
                ],
            )
            .await;

        let found = store
            .select_where(Table::Users, &Filter::eq("email", "b@x.com"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], "u2");
    }
}
