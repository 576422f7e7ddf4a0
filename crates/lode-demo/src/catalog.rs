//! Catalog models and their batched accessors.
//!
//! Each accessor looks like a per-model call but loads for the whole batch
//! the model was bound with: listing the books of every author costs one
//! query, and listing the chapters of all those books costs one more.

use std::collections::HashMap;
use std::sync::Arc;

use lode_core::{
    many, one, resolve, resolver_fn, Handle, LoadResult, Model, RelationSpec, ResolveSpec,
};
use lode_sqlx::{AdapterResult, BoundPool};
use sqlx::sqlite::Sqlite;
use sqlx::{FromRow, QueryBuilder};

const SCHEMA: &str = include_str!("../sql/schema.sql");
const SEED: &str = include_str!("../sql/seed.sql");

#[derive(Debug, FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
    #[sqlx(skip)]
    pub handle: Handle,
}

#[derive(Debug, FromRow)]
pub struct Book {
    pub id: i64,
    pub author_id: Option<i64>,
    pub title: String,
    #[sqlx(skip)]
    pub handle: Handle,
}

#[derive(Debug, FromRow)]
pub struct Chapter {
    pub id: i64,
    pub book_id: i64,
    pub title: String,
    #[sqlx(skip)]
    pub handle: Handle,
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

impl Model for Chapter {
    fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Author {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            handle: Handle::new(),
        }
    }

    /// Books written by this author.
    pub async fn books(&self, db: &BoundPool) -> LoadResult<Vec<Arc<Book>>> {
        many(RelationSpec::new(
            "books",
            self,
            |author: &Author| Some(author.id),
            |book: &Book| book.author_id.unwrap_or_default(),
            db.fetch_in::<Book, i64>("books", "author_id"),
        ))
        .await
    }

    /// Chapter count across all books, composed from the relation accessors.
    pub async fn num_chapters(&self, db: &BoundPool) -> LoadResult<i64> {
        let mut total = 0;
        for book in self.books(db).await? {
            total += book.chapters(db).await?.len() as i64;
        }
        Ok(total)
    }

    /// Chapter count computed with one grouped query for the whole batch.
    pub async fn num_chapters_using_query(&self, db: &BoundPool) -> LoadResult<i64> {
        let pool = db.pool().clone();
        resolve(ResolveSpec::new(
            "num_chapters_using_query",
            self,
            |authors: Vec<Arc<Author>>| async move {
                let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                    "SELECT b.author_id, COUNT(c.id) FROM books b \
                     JOIN chapters c ON c.book_id = b.id WHERE b.author_id IN (",
                );
                let mut separated = builder.separated(", ");
                for author in &authors {
                    separated.push_bind(author.id);
                }
                separated.push_unseparated(") GROUP BY b.author_id");

                let counts: HashMap<i64, i64> = builder
                    .build_query_as::<(i64, i64)>()
                    .fetch_all(&pool)
                    .await?
                    .into_iter()
                    .collect();
                Ok::<_, sqlx::Error>(resolver_fn(move |author: &Author| {
                    counts.get(&author.id).copied().unwrap_or_default()
                }))
            },
        ))
        .await
    }
}

impl Book {
    /// Chapters of this book.
    pub async fn chapters(&self, db: &BoundPool) -> LoadResult<Vec<Arc<Chapter>>> {
        many(RelationSpec::new(
            "chapters",
            self,
            |book: &Book| Some(book.id),
            |chapter: &Chapter| chapter.book_id,
            db.fetch_in::<Chapter, i64>("chapters", "book_id"),
        ))
        .await
    }

    /// The author, or `None` for anonymous books.
    pub async fn author(&self, db: &BoundPool) -> LoadResult<Option<Arc<Author>>> {
        one(RelationSpec::new(
            "author",
            self,
            |book: &Book| book.author_id,
            |author: &Author| author.id,
            db.fetch_in::<Author, i64>("authors", "id"),
        ))
        .await
    }
}

/// Creates the schema and loads the sample data.
pub async fn prepare(db: &BoundPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(db.pool()).await?;
    sqlx::raw_sql(SEED).execute(db.pool()).await?;
    Ok(())
}

/// All authors, bound together.
pub async fn load_authors(db: &BoundPool) -> AdapterResult<Vec<Arc<Author>>> {
    db.fetch_all("SELECT id, name FROM authors ORDER BY id").await
}

/// All books, bound together.
pub async fn load_books(db: &BoundPool) -> AdapterResult<Vec<Arc<Book>>> {
    db.fetch_all("SELECT id, author_id, title FROM books ORDER BY id")
        .await
}
