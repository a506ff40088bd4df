//! Ecole Database Crate
//!
//! This crate provides the persistent store adapters behind the portal. Every
//! adapter speaks the same narrow table protocol ([`StoreAdapter`]): JSON rows
//! with snake_case keys, addressed by table and string id.
//!
//! ## Adapters
//!
//! - [`MemoryStore`]: in-process tables, used for tests and offline demos
//! - [`SqliteStore`]: durable local store on top of sqlx
//! - [`RestStore`]: PostgREST-style remote table service over HTTP
//!
//! Entity structs never reach an adapter directly; they go through
//! [`codec::encode`] / [`codec::decode`], which apply the camelCase to
//! snake_case key mapping on every write and read.

use async_trait::async_trait;
use serde_json::Value;

pub mod codec;
pub mod connection;
pub mod memory;
pub mod migrations;
pub mod rest;
pub mod sqlite;
pub mod table;
pub mod types;

pub use codec::{decode, encode, Record};
pub use connection::prepare_database;
pub use memory::MemoryStore;
pub use migrations::run_migrations;
pub use rest::RestStore;
pub use sqlite::SqliteStore;
pub use table::Table;
pub use types::{StoreError, StoreResult};

/// A single table row as exchanged with a store adapter.
pub type Row = serde_json::Map<String, Value>;

/// Equality filter on one top-level column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether `row` satisfies the filter.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .map(|value| value == &self.value)
            .unwrap_or(self.value.is_null())
    }
}

/// Table-level operations offered by the backing store.
///
/// Rows use snake_case keys. `update` merges the patch into the stored row and
/// returns the result; `delete` succeeds whether or not the row existed;
/// `upsert` matches on `key` and merges into the existing row if one is found.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Short adapter name used in logs.
    fn name(&self) -> &'static str;

    async fn select_all(&self, table: Table) -> StoreResult<Vec<Row>>;

    async fn select_where(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Row>>;

    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row>;

    async fn update(&self, table: Table, id: &str, patch: Row) -> StoreResult<Row>;

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()>;

    async fn upsert(&self, table: Table, key: &str, row: Row) -> StoreResult<Row>;
}

/// Merge `patch` into `target`, leaving the `id` column untouched.
pub(crate) fn merge_row(target: &mut Row, patch: Row) {
    for (key, value) in patch {
        if key == "id" {
            continue;
        }
        target.insert(key, value);
    }
}

/// The string id of a row, if it carries one.
pub(crate) fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}
