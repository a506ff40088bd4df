//! Durable store adapter on top of SQLite.
//!
//! Every portal table lives in the single `records` table as a JSON document
//! keyed by `(table_name, id)`. Filters and unique checks go through
//! `json_extract`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use ecole_config::DatabaseConfig;
use serde_json::Value;
use sqlx::{sqlite::SqliteArguments, Arguments, Row as _, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::{
    connection::prepare_database, merge_row, migrations::run_migrations, row_id, Filter, Row,
    StoreAdapter, StoreError, StoreResult, Table,
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect, create the database file if needed and apply migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = prepare_database(config).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing, already migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn find_by_id(
        tx: &mut Transaction<'_, Sqlite>,
        table: Table,
        id: &str,
    ) -> StoreResult<Option<Row>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM records WHERE table_name = ? AND id = ?")
                .bind(table.as_str())
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        body.map(|body| parse_body(&body)).transpose()
    }

    async fn find_by_column(
        tx: &mut Transaction<'_, Sqlite>,
        table: Table,
        column: &str,
        value: &Value,
    ) -> StoreResult<Vec<(String, Row)>> {
        let (sql, args) = filtered_query("SELECT id, body FROM records", table, column, value)?;
        let rows = sqlx::query_with(&sql, args).fetch_all(&mut **tx).await?;

        rows.into_iter()
            .map(|row| -> StoreResult<(String, Row)> {
                let id: String = row.try_get("id")?;
                let body: String = row.try_get("body")?;
                Ok((id, parse_body(&body)?))
            })
            .collect()
    }

    async fn check_unique(
        tx: &mut Transaction<'_, Sqlite>,
        table: Table,
        candidate: &Row,
        skip_id: Option<&str>,
    ) -> StoreResult<()> {
        for column in table.unique_columns() {
            let Some(value) = candidate.get(*column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clashes = Self::find_by_column(tx, table, column, value).await?;
            if clashes.iter().any(|(id, _)| Some(id.as_str()) != skip_id) {
                return Err(StoreError::Constraint(format!(
                    "duplicate value for {table}.{column}"
                )));
            }
        }
        Ok(())
    }

    async fn write(
        tx: &mut Transaction<'_, Sqlite>,
        table: Table,
        id: &str,
        row: &Row,
    ) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO records (table_name, id, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (table_name, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(table.as_str())
        .bind(id)
        .bind(serde_json::to_string(row)?)
        .bind(&now)
        .bind(&now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StoreAdapter for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn select_all(&self, table: Table) -> StoreResult<Vec<Row>> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM records WHERE table_name = ? ORDER BY created_at, rowid",
        )
        .bind(table.as_str())
        .fetch_all(&self.pool)
        .await?;

        bodies.iter().map(|body| parse_body(body)).collect()
    }

    async fn select_where(&self, table: Table, filter: &Filter) -> StoreResult<Vec<Row>> {
        let (sql, args) = filtered_query("SELECT body FROM records", table, &filter.column, &filter.value)?;
        let rows = sqlx::query_with(&sql, args).fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row| -> StoreResult<Row> {
                let body: String = row.try_get("body")?;
                parse_body(&body)
            })
            .collect()
    }

    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row> {
        let id = row_id(&row)
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidColumn("insert row has no id".to_string()))?;

        let mut tx = self.pool.begin().await?;
        if Self::find_by_id(&mut tx, table, &id).await?.is_some() {
            return Err(StoreError::Constraint(format!("duplicate id {id} in {table}")));
        }
        Self::check_unique(&mut tx, table, &row, None).await?;
        Self::write(&mut tx, table, &id, &row).await?;
        tx.commit().await?;

        debug!(%table, %id, "sqlite insert");
        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, patch: Row) -> StoreResult<Row> {
        let mut tx = self.pool.begin().await?;
        let mut row = Self::find_by_id(&mut tx, table, id)
            .await?
            .ok_or_else(|| StoreError::not_found(table, id))?;

        Self::check_unique(&mut tx, table, &patch, Some(id)).await?;
        merge_row(&mut row, patch);
        Self::write(&mut tx, table, id, &row).await?;
        tx.commit().await?;

        debug!(%table, %id, "sqlite update");
        Ok(row)
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM records WHERE table_name = ? AND id = ?")
            .bind(table.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(%table, %id, "sqlite delete");
        Ok(())
    }

    async fn upsert(&self, table: Table, key: &str, row: Row) -> StoreResult<Row> {
        let key_value = row
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::InvalidColumn(format!("upsert row has no {key}")))?;

        let mut tx = self.pool.begin().await?;
        let existing = if key == "id" {
            let id = value_text(&key_value);
            Self::find_by_id(&mut tx, table, &id)
                .await?
                .map(|found| (id, found))
        } else {
            Self::find_by_column(&mut tx, table, key, &key_value)
                .await?
                .into_iter()
                .next()
        };

        let (id, stored) = match existing {
            Some((id, mut found)) => {
                merge_row(&mut found, row);
                (id, found)
            }
            None => {
                let mut fresh = row;
                let id = row_id(&fresh)
                    .map(str::to_string)
                    .unwrap_or_else(|| value_text(&key_value));
                fresh.insert("id".to_string(), Value::String(id.clone()));
                (id, fresh)
            }
        };

        Self::write(&mut tx, table, &id, &stored).await?;
        tx.commit().await?;

        debug!(%table, %id, key, "sqlite upsert");
        Ok(stored)
    }
}

fn parse_body(body: &str) -> StoreResult<Row> {
    Ok(serde_json::from_str(body)?)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Build `<select> WHERE table_name = ? AND json_extract(body, '$.<column>') <op> ?`.
fn filtered_query(
    select: &str,
    table: Table,
    column: &str,
    value: &Value,
) -> StoreResult<(String, SqliteArguments<'static>)> {
    if column.is_empty()
        || !column
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
    {
        return Err(StoreError::InvalidColumn(column.to_string()));
    }

    let mut args = SqliteArguments::default();
    args.add(table.as_str().to_string());

    let path = format!("$.{column}");
    let condition = match value {
        Value::Null => {
            args.add(path);
            "json_extract(body, ?) IS NULL"
        }
        Value::Bool(flag) => {
            args.add(path);
            args.add(i64::from(*flag));
            "json_extract(body, ?) = ?"
        }
        Value::Number(number) => {
            args.add(path);
            if let Some(integer) = number.as_i64() {
                args.add(integer);
            } else {
                args.add(number.as_f64().unwrap_or_default());
            }
            "json_extract(body, ?) = ?"
        }
        Value::String(text) => {
            args.add(path);
            args.add(text.clone());
            "json_extract(body, ?) = ?"
        }
        Value::Array(_) | Value::Object(_) => {
            args.add(path);
            args.add(value.to_string());
            "json(json_extract(body, ?)) = json(?)"
        }
    };

    let sql = format!(
        "{select} WHERE table_name = ? AND {condition} ORDER BY created_at, rowid"
    );
    Ok((sql, args))
}
