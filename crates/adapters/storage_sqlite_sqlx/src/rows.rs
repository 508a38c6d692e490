//! Column decoding and write helpers shared by every record interface.

use sqlx::Row;
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};

use servicedb_domain::domain_id::DomainId;
use servicedb_domain::error::ServiceDbError;
use servicedb_domain::id::RecordId;
use servicedb_domain::query::Query;
use servicedb_domain::time::{self, Timestamp};

use crate::error::StorageError;

pub(crate) fn decode_error(err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn record_id(row: &SqliteRow, column: &str) -> Result<RecordId, sqlx::Error> {
    row.try_get::<u32, _>(column).map(RecordId::new)
}

pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> Result<Timestamp, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    time::from_storage(&raw).map_err(decode_error)
}

/// Identity assigned to the row an `INSERT` just wrote.
pub(crate) fn inserted_id(result: &SqliteQueryResult) -> Result<RecordId, StorageError> {
    let rowid = result.last_insert_rowid();
    u32::try_from(rowid)
        .map(RecordId::new)
        .map_err(|_| StorageError::IdOverflow(rowid))
}

pub(crate) fn affected(result: &SqliteQueryResult) -> bool {
    result.rows_affected() > 0
}

pub(crate) fn unsupported(domain: DomainId, query: &Query) -> ServiceDbError {
    ServiceDbError::UnsupportedQuery {
        domain,
        query: query.name(),
    }
}

/// `%text%` for a `LIKE` comparison; `%`, `_` and `\` in `text` match
/// literally when the statement uses `ESCAPE '\'`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
