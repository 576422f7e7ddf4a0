//! SQLite integration tests for the adapter.
//!
//! Every test opens its own in-memory database (single connection) and
//! seeds a small authors/books schema.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lode-sqlx --test sqlite_tests
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lode_core::{many, Engine, EngineConfig, Handle, LoadError, LoadResult, Model, RelationSpec};
use lode_sqlx::{fetch_in, AdapterError, BoundPool, PoolConfig};
use sqlx::FromRow;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, FromRow)]
struct Author {
    id: i64,
    name: String,
    #[sqlx(skip)]
    handle: Handle,
}

#[derive(Debug, FromRow)]
struct Book {
    id: i64,
    author_id: Option<i64>,
    title: String,
    #[sqlx(skip)]
    handle: Handle,
}

impl Model for Author {
    fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Model for Book {
    fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Author {
    async fn books(&self, db: &BoundPool, queries: &AtomicUsize) -> LoadResult<Vec<Arc<Book>>> {
        let fetch = db.fetch_in::<Book, i64>("books", "author_id");
        many(RelationSpec::new(
            "books",
            self,
            |a: &Author| Some(a.id),
            |b: &Book| b.author_id.unwrap_or_default(),
            |keys| {
                queries.fetch_add(1, Ordering::SeqCst);
                fetch(keys)
            },
        ))
        .await
    }
}

async fn seeded(engine: Engine) -> BoundPool {
    let db = BoundPool::connect(&PoolConfig::default(), engine)
        .await
        .unwrap();
    sqlx::raw_sql(
        "CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE books (id INTEGER PRIMARY KEY, author_id INTEGER, title TEXT NOT NULL);
         INSERT INTO authors (id, name) VALUES (1, 'Le Guin'), (2, 'Lem'), (3, 'Borges');
         INSERT INTO books (id, author_id, title) VALUES
             (1, 1, 'The Dispossessed'),
             (2, 2, 'Solaris'),
             (3, 1, 'The Lathe of Heaven'),
             (4, NULL, 'Beowulf');",
    )
    .execute(db.pool())
    .await
    .unwrap();
    db
}

// =============================================================================
// Section 1: fetch_in
// =============================================================================

#[tokio::test]
async fn test_fetch_in_loads_rows_for_keys() {
    let db = seeded(Engine::new()).await;

    let books = fetch_in::<Book, i64>(db.pool(), "books", "author_id")(vec![1, 3])
        .await
        .unwrap();

    let mut titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["The Dispossessed", "The Lathe of Heaven"]);
    assert!(books.iter().all(|b| !b.handle.is_bound()));
}

#[tokio::test]
async fn test_fetch_in_with_no_keys_skips_query() {
    let db = seeded(Engine::new()).await;
    db.pool().close().await;

    let books = fetch_in::<Book, i64>(db.pool(), "books", "author_id")(Vec::new())
        .await
        .unwrap();

    assert!(books.is_empty());
}

#[tokio::test]
async fn test_fetch_in_rejects_invalid_identifiers() {
    let db = seeded(Engine::new()).await;

    let err = fetch_in::<Book, i64>(db.pool(), "books", "author_id) OR (1=1")(vec![1])
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::InvalidIdentifier { .. }));
}

#[tokio::test]
async fn test_fetch_in_reports_database_errors() {
    let db = seeded(Engine::new()).await;

    let err = fetch_in::<Book, i64>(db.pool(), "missing_table", "author_id")(vec![1])
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Database(_)));
}

// =============================================================================
// Section 2: BoundPool
// =============================================================================

#[tokio::test]
async fn test_fetch_all_binds_rows_into_one_batch() {
    let db = seeded(Engine::new()).await;

    let authors: Vec<Arc<Author>> = db
        .fetch_all("SELECT id, name FROM authors ORDER BY id")
        .await
        .unwrap();

    assert_eq!(authors.len(), 3);
    assert_eq!(authors[2].name, "Borges");
    assert_eq!(authors[0].handle.batch_len(), Some(3));
    assert!(authors[0].handle.shares_batch_with(&authors[2].handle));
}

#[tokio::test]
async fn test_fetch_all_partitions_with_engine_config() {
    let db = seeded(Engine::with_config(EngineConfig::default().with_batch_size(2))).await;

    let authors: Vec<Arc<Author>> = db
        .fetch_all("SELECT id, name FROM authors ORDER BY id")
        .await
        .unwrap();

    assert!(authors[0].handle.shares_batch_with(&authors[1].handle));
    assert!(!authors[1].handle.shares_batch_with(&authors[2].handle));
}

#[tokio::test]
async fn test_bind_rows_binds_rows_loaded_elsewhere() {
    let db = seeded(Engine::new()).await;
    let rows: Vec<Book> = sqlx::query_as("SELECT id, author_id, title FROM books")
        .fetch_all(db.pool())
        .await
        .unwrap();

    let books = db.bind_rows(rows);

    assert_eq!(books[0].handle.batch_len(), Some(4));
}

// =============================================================================
// Section 3: Relations over SQLite
// =============================================================================

#[tokio::test]
async fn test_relation_issues_one_query_per_batch() {
    // Arrange
    let db = seeded(Engine::new()).await;
    let queries = AtomicUsize::new(0);
    let authors: Vec<Arc<Author>> = db
        .fetch_all("SELECT id, name FROM authors ORDER BY id")
        .await
        .unwrap();

    // Act
    let mut counts = Vec::new();
    for author in &authors {
        counts.push(author.books(&db, &queries).await.unwrap().len());
    }

    // Assert
    assert_eq!(counts, vec![2, 1, 0]);
    assert_eq!(queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_relation_passes_database_error_through() {
    let db = seeded(Engine::new()).await;
    let authors: Vec<Arc<Author>> = db
        .fetch_all("SELECT id, name FROM authors ORDER BY id")
        .await
        .unwrap();
    sqlx::query("DROP TABLE books")
        .execute(db.pool())
        .await
        .unwrap();
    let queries = AtomicUsize::new(0);

    let first = authors[0].books(&db, &queries).await.unwrap_err();
    let second = authors[1].books(&db, &queries).await.unwrap_err();

    assert!(matches!(
        first.downcast_upstream::<AdapterError>(),
        Some(AdapterError::Database(_))
    ));
    assert!(matches!(second, LoadError::Upstream(_)));
    assert_eq!(queries.load(Ordering::SeqCst), 1);
}
