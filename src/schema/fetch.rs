use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Executor, Row};

use super::ColumnInfo;

// Metadata columns (SHOW TABLES, DESCRIBE, SHOW EXPLAIN) are sometimes returned
// as binary blobs by sqlx. These helpers try String first, then fall back to
// Vec<u8> -> UTF-8 so callers always get a usable value.
pub(crate) fn is_col_str(row: &MySqlRow, col: &str) -> String {
    row.try_get::<String, _>(col)
        .or_else(|_| {
            row.try_get::<Vec<u8>, _>(col)
                .map(|b| String::from_utf8_lossy(&b).into_owned())
        })
        .unwrap_or_default()
}

pub(crate) fn is_col_str_opt(row: &MySqlRow, col: &str) -> Option<String> {
    let s = row.try_get::<Option<String>, _>(col)
        .ok()
        .flatten()
        .or_else(|| {
            row.try_get::<Option<Vec<u8>>, _>(col)
                .ok()
                .flatten()
                .map(|b| String::from_utf8_lossy(&b).into_owned())
        })?;
    if s.is_empty() { None } else { Some(s) }
}

/// Numeric metadata column that may arrive unsigned, signed or as text
/// depending on server version.
pub(crate) fn is_col_u64(row: &MySqlRow, col: &str) -> Option<u64> {
    if let Ok(v) = row.try_get::<Option<u64>, _>(col) {
        return v;
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(col) {
        return v.and_then(|n| u64::try_from(n).ok());
    }
    is_col_str_opt(row, col).and_then(|s| s.trim().parse().ok())
}

/// Escape a MySQL identifier for use in backtick-quoted contexts.
/// Doubles any backtick characters within the name.
pub(crate) fn escape_mysql_identifier(name: &str) -> String {
    name.replace('`', "``")
}

/// Table names of the connection's current schema.
pub(crate) async fn fetch_table_names(conn: &mut MySqlConnection) -> Result<Vec<String>, sqlx::Error> {
    let rows = conn.fetch_all(sqlx::raw_sql("SHOW TABLES")).await?;
    // The only column is named after the schema (`Tables_in_<db>`)
    let names = rows
        .iter()
        .map(|row| {
            row.try_get::<String, _>(0)
                .or_else(|_| {
                    row.try_get::<Vec<u8>, _>(0)
                        .map(|b| String::from_utf8_lossy(&b).into_owned())
                })
                .unwrap_or_default()
        })
        .filter(|name| !name.is_empty())
        .collect();
    Ok(names)
}

pub(crate) async fn fetch_columns(conn: &mut MySqlConnection, table: &str) -> Result<Vec<ColumnInfo>, sqlx::Error> {
    let sql = format!("DESCRIBE `{}`", escape_mysql_identifier(table));
    let rows = conn.fetch_all(sqlx::raw_sql(&sql)).await?;

    let columns = rows
        .iter()
        .map(|row| ColumnInfo {
            field: is_col_str(row, "Field"),
            column_type: is_col_str(row, "Type"),
            null: is_col_str(row, "Null"),
            key: is_col_str_opt(row, "Key"),
            default: is_col_str_opt(row, "Default"),
            extra: is_col_str_opt(row, "Extra"),
        })
        .collect();

    Ok(columns)
}
