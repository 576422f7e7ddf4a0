//! lode-demo: authors, books and chapters loaded through lode
//!
//! The catalog lives in SQLite (in memory by default). Authors are loaded
//! with one query and bound together; every relation level below them then
//! costs exactly one more query, however many parents it has.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 lode-demo                   │
//! ├─────────────────────────────────────────────┤
//! │  catalog.rs       - Models and accessors    │
//! │  config.rs        - Layered configuration   │
//! │  observability.rs - Logging setup           │
//! │  main.rs          - CLI entry point         │
//! └─────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod observability;

use std::sync::Arc;

use lode_core::LoadResult;
use lode_sqlx::BoundPool;

pub use catalog::{Author, Book, Chapter};
pub use config::{ConfigLoadError, DemoConfig};
pub use observability::{init_logging, LoggingConfig};

/// Renders every author with their books and chapters, followed by every
/// book with its author.
pub async fn render_catalog(
    db: &BoundPool,
    authors: &[Arc<Author>],
    books: &[Arc<Book>],
) -> LoadResult<Vec<String>> {
    let mut lines = Vec::new();

    for author in authors {
        let counted = author.num_chapters(db).await?;
        let queried = author.num_chapters_using_query(db).await?;
        lines.push(format!(
            "Author {}: {} ({} chapters, {} by query)",
            author.id, author.name, counted, queried
        ));
        for book in author.books(db).await? {
            lines.push(format!("  Book {}: {}", book.id, book.title));
            for chapter in book.chapters(db).await? {
                lines.push(format!("    Chapter {}: {}", chapter.id, chapter.title));
            }
        }
    }

    for book in books {
        let author = match book.author(db).await? {
            Some(author) => author.name.clone(),
            None => "anonymous".to_string(),
        };
        lines.push(format!("{} by {}", book.title, author));
    }

    Ok(lines)
}
