pub mod announcements;
pub mod auth;
pub mod items;
pub mod orders;
pub mod reports;
pub mod reviews;
pub mod wallet;

use rusqlite::{types::Type, Row};

/// Reads a JSON-encoded string list stored in a TEXT column.
pub(crate) fn json_list(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
