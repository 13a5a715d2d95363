//! Schema browsing: the table list of a schema and the columns of a table.
//!
//! Both go to the same per-schema host as an explain request and report
//! failures with the same [`OperationError`] variants.

pub(crate) mod fetch;


use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlPool;
use sqlx::Executor;

use crate::db::MySqlConnector;
use crate::error::{BackendError, OperationError};

/// Longest identifier MySQL accepts for databases and tables.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// One `DESCRIBE` row, serialized with the server's column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    #[serde(rename = "Field")]
    pub field: String,
    #[serde(rename = "Type")]
    pub column_type: String,
    /// `YES` or `NO`
    #[serde(rename = "Null")]
    pub null: String,
    #[serde(rename = "Key")]
    pub key: Option<String>,
    #[serde(rename = "Default")]
    pub default: Option<String>,
    #[serde(rename = "Extra")]
    pub extra: Option<String>,
}

/// True for names made only of ASCII letters, digits, `_` and `-`, at most
/// [`MAX_IDENTIFIER_LEN`] long.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_IDENTIFIER_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub(crate) fn check_schema(schema: &str) -> Result<(), OperationError> {
    if is_valid_identifier(schema) {
        Ok(())
    } else {
        Err(OperationError::schema_selection(
            BackendError::new(format!("invalid database name '{}'", schema)),
            schema,
        ))
    }
}

fn check_table(table: &str) -> Result<(), OperationError> {
    if is_valid_identifier(table) {
        Ok(())
    } else {
        Err(OperationError::QueryExecution(format!("invalid table name '{}'", table)))
    }
}

/// Names of all tables and views in `schema`.
pub async fn list_tables(connector: &MySqlConnector, schema: &str) -> Result<Vec<String>, OperationError> {
    check_schema(schema)?;
    let pool = connector.open_pool(schema);
    let result = list_tables_in(&pool, schema).await;
    pool.close().await;
    result
}

/// Columns of `schema`.`table`.
pub async fn describe_table(
    connector: &MySqlConnector,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnInfo>, OperationError> {
    check_schema(schema)?;
    check_table(table)?;
    let pool = connector.open_pool(schema);
    let result = describe_table_in(&pool, schema, table).await;
    pool.close().await;
    result
}

async fn list_tables_in(pool: &MySqlPool, schema: &str) -> Result<Vec<String>, OperationError> {
    let mut conn = use_schema(pool, schema).await?;
    fetch::fetch_table_names(&mut conn)
        .await
        .map_err(|e| OperationError::QueryExecution(BackendError::from(e).message))
}

async fn describe_table_in(pool: &MySqlPool, schema: &str, table: &str) -> Result<Vec<ColumnInfo>, OperationError> {
    let mut conn = use_schema(pool, schema).await?;
    let columns = fetch::fetch_columns(&mut conn, table)
        .await
        .map_err(|e| OperationError::QueryExecution(BackendError::from(e).message))?;
    tracing::debug!(schema, table, columns = columns.len(), "Described table");
    Ok(columns)
}

async fn use_schema(
    pool: &MySqlPool,
    schema: &str,
) -> Result<sqlx::pool::PoolConnection<sqlx::MySql>, OperationError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| OperationError::schema_selection(e, schema))?;
    let sql = format!("USE `{}`", fetch::escape_mysql_identifier(schema));
    (&mut *conn)
        .execute(sqlx::raw_sql(&sql))
        .await
        .map_err(|e| OperationError::schema_selection(e, schema))?;
    Ok(conn)
}
