//! IN-list fetch functions for relations.

use futures::future::BoxFuture;
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{Encode, FromRow, QueryBuilder, Type};
use tracing::debug;

use crate::error::{AdapterError, AdapterResult};

/// Future returned by the fetch functions of this crate.
pub type FetchFuture<R> = BoxFuture<'static, AdapterResult<Vec<R>>>;

/// Checks that `identifier` can be spliced into SQL as a table or column
/// name: ASCII letters, digits and `_`, not starting with a digit.
pub fn validate_identifier(identifier: &str) -> AdapterResult<()> {
    let mut chars = identifier.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(AdapterError::InvalidIdentifier {
            identifier: identifier.to_string(),
        })
    }
}

/// Returns a relation fetch function that loads every row of `table` whose
/// `column` is one of the requested keys.
///
/// The query is `SELECT * FROM <table> WHERE <column> IN (?, ...)` with one
/// bound parameter per key. An empty key set returns no rows without
/// touching the database. Identifiers are validated when the fetch runs,
/// so an invalid name surfaces as the relation's error.
///
/// ```ignore
/// many(RelationSpec::new(
///     "books",
///     author,
///     |a: &Author| Some(a.id),
///     |b: &Book| b.author_id.unwrap_or_default(),
///     fetch_in::<Book, i64>(&pool, "books", "author_id"),
/// ))
/// .await
/// ```
pub fn fetch_in<R, K>(
    pool: &SqlitePool,
    table: &str,
    column: &str,
) -> impl FnOnce(Vec<K>) -> FetchFuture<R> + Send + 'static
where
    R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static,
    K: for<'q> Encode<'q, Sqlite> + Type<Sqlite> + Send + 'static,
{
    let pool = pool.clone();
    let table = table.to_string();
    let column = column.to_string();
    move |keys: Vec<K>| -> FetchFuture<R> {
        Box::pin(async move {
            validate_identifier(&table)?;
            validate_identifier(&column)?;
            if keys.is_empty() {
                return Ok(Vec::new());
            }

            let key_count = keys.len();
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new(format!("SELECT * FROM {table} WHERE {column} IN ("));
            let mut separated = builder.separated(", ");
            for key in keys {
                separated.push_bind(key);
            }
            separated.push_unseparated(")");

            let rows = builder.build_query_as::<R>().fetch_all(&pool).await?;
            debug!(
                table = %table,
                column = %column,
                keys = key_count,
                rows = rows.len(),
                "fetched relation rows"
            );
            Ok::<_, AdapterError>(rows)
        })
    }
}
