use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlRow;

use crate::schema::fetch::{is_col_str_opt, is_col_u64};

/// One row of `SHOW EXPLAIN` output.
///
/// Field names serialize with the server's column names so clients can render
/// the table exactly as the server reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRow {
    pub id: Option<u64>,
    pub select_type: Option<String>,
    pub table: Option<String>,
    #[serde(rename = "type")]
    pub access_type: Option<String>,
    pub possible_keys: Option<String>,
    pub key: Option<String>,
    pub key_len: Option<String>,
    #[serde(rename = "ref")]
    pub ref_columns: Option<String>,
    pub rows: Option<u64>,
    /// Free-text annotation ("Using where; Using filesort"). The tip engine may
    /// wrap parts of it in a danger marker.
    #[serde(rename = "Extra")]
    pub extra: Option<String>,
}

impl PlanRow {
    pub(crate) fn from_row(row: &MySqlRow) -> Self {
        Self {
            id: is_col_u64(row, "id"),
            select_type: is_col_str_opt(row, "select_type"),
            table: is_col_str_opt(row, "table"),
            access_type: is_col_str_opt(row, "type"),
            possible_keys: is_col_str_opt(row, "possible_keys"),
            key: is_col_str_opt(row, "key"),
            key_len: is_col_str_opt(row, "key_len"),
            ref_columns: is_col_str_opt(row, "ref"),
            rows: is_col_u64(row, "rows"),
            extra: is_col_str_opt(row, "Extra"),
        }
    }

    /// `id.position` label used in advice text; position is 1-based.
    pub fn label(&self, index: usize) -> String {
        match self.id {
            Some(id) => format!("{}.{}", id, index + 1),
            None => format!("NULL.{}", index + 1),
        }
    }
}

/// Decode a full `SHOW EXPLAIN` result set. Columns outside the classic ten
/// (e.g. `filtered`) are ignored.
pub(crate) fn decode_plan(rows: &[MySqlRow]) -> Vec<PlanRow> {
    rows.iter().map(PlanRow::from_row).collect()
}
