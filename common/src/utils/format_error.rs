//! Mapping of database errors to service errors.

use crate::errors::AppError;

/// Columns with a unique constraint, in the order they are reported.
const UNIQUE_FIELDS: [&str; 3] = ["nickname", "email", "title"];

/// Converts a `sqlx` error into an [`AppError`].
///
/// Unique violations become `Conflict` naming the offending field; a missing
/// row becomes `NotFound`. The only foreign key is `posts.author_id`, so a
/// foreign key violation means the author no longer exists. Everything else
/// is an opaque query failure.
pub fn from_sqlx(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::NotFound("record".to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            conflict_for(db.message())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::NotFound("author".to_string())
        }
        other => AppError::DatabaseQuery(other.to_string()),
    }
}

fn conflict_for(message: &str) -> AppError {
    let field = UNIQUE_FIELDS
        .iter()
        .find(|field| message.contains(*field))
        .copied()
        .unwrap_or("value");
    AppError::Conflict(format!("{field} already taken"))
}
