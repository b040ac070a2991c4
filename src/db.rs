use crate::error::{CatalogError, Result};
use crate::storage::BookStore;
use crate::types::{Book, Provenance, ReadingStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// SQLite-backed catalog store. The UNIQUE constraint on `isbn` is the
/// backstop for check-then-insert races between independent importers.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS books (
                id               TEXT PRIMARY KEY,
                isbn             TEXT NOT NULL UNIQUE,
                title            TEXT NOT NULL,
                author           TEXT,
                genre            TEXT,
                publication_year INTEGER,
                publisher        TEXT,
                page_count       INTEGER,
                cover_image_url  TEXT,
                status           TEXT NOT NULL,
                source           TEXT NOT NULL,
                api_checked_at   TEXT,
                api_updated_at   TEXT
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_book(row: &Row<'_>) -> rusqlite::Result<Book> {
        let id: String = row.get("id")?;
        let status: String = row.get("status")?;
        let source: String = row.get("source")?;
        Ok(Book {
            id: Uuid::parse_str(&id).ok(),
            isbn: row.get("isbn")?,
            title: row.get("title")?,
            author: row.get("author")?,
            genre: row.get("genre")?,
            publication_year: row.get("publication_year")?,
            publisher: row.get("publisher")?,
            page_count: row.get("page_count")?,
            cover_image_url: row.get("cover_image_url")?,
            status: status.parse().unwrap_or(ReadingStatus::Unknown),
            source: source.parse().unwrap_or(Provenance::Unknown),
            api_checked_at: parse_timestamp(row.get::<_, Option<String>>("api_checked_at")?),
            api_updated_at: parse_timestamp(row.get::<_, Option<String>>("api_updated_at")?),
        })
    }
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

/// Maps a UNIQUE-constraint failure on insert to the duplicate-ISBN error the
/// importer treats as a skippable conflict.
fn map_insert_error(e: rusqlite::Error, isbn: &str) -> CatalogError {
    if let rusqlite::Error::SqliteFailure(inner, _) = &e {
        if inner.code == rusqlite::ErrorCode::ConstraintViolation {
            return CatalogError::DuplicateIsbn(isbn.to_string());
        }
    }
    CatalogError::Database(e)
}

#[async_trait]
impl BookStore for SqliteStore {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM books WHERE isbn = ?1")?;
        let mut rows = stmt.query(params![isbn])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_book(row)?)),
            None => Ok(None),
        }
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM books WHERE isbn = ?1",
            params![isbn],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn save(&self, book: &mut Book) -> Result<()> {
        if book.title.is_none() {
            return Err(CatalogError::Conflict(format!(
                "book with ISBN {} has no title",
                book.isbn
            )));
        }

        let conn = self.conn.lock().unwrap();
        match book.id {
            None => {
                let id = Uuid::new_v4();
                conn.execute(
                    "INSERT INTO books (id, isbn, title, author, genre, publication_year,
                                        publisher, page_count, cover_image_url, status,
                                        source, api_checked_at, api_updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        id.to_string(),
                        book.isbn,
                        book.title,
                        book.author,
                        book.genre,
                        book.publication_year,
                        book.publisher,
                        book.page_count,
                        book.cover_image_url,
                        book.status.as_str(),
                        book.source.as_str(),
                        format_timestamp(book.api_checked_at),
                        format_timestamp(book.api_updated_at),
                    ],
                )
                .map_err(|e| map_insert_error(e, &book.isbn))?;
                book.id = Some(id);
                debug!("Created book '{}' with id {}", book.title_or_placeholder(), id);
            }
            Some(id) => {
                let stored_isbn: Option<String> = conn
                    .query_row(
                        "SELECT isbn FROM books WHERE id = ?1",
                        params![id.to_string()],
                        |row| row.get(0),
                    )
                    .ok();
                match stored_isbn {
                    None => {
                        return Err(CatalogError::Conflict(format!(
                            "no stored book with id {id}"
                        )))
                    }
                    // The natural key is immutable once persisted.
                    Some(stored) if stored != book.isbn => {
                        return Err(CatalogError::Conflict(format!(
                            "attempt to change ISBN of stored book {id}"
                        )))
                    }
                    Some(_) => {}
                }
                conn.execute(
                    "UPDATE books SET title = ?2, author = ?3, genre = ?4,
                                      publication_year = ?5, publisher = ?6, page_count = ?7,
                                      cover_image_url = ?8, status = ?9, source = ?10,
                                      api_checked_at = ?11, api_updated_at = ?12
                     WHERE id = ?1",
                    params![
                        id.to_string(),
                        book.title,
                        book.author,
                        book.genre,
                        book.publication_year,
                        book.publisher,
                        book.page_count,
                        book.cover_image_url,
                        book.status.as_str(),
                        book.source.as_str(),
                        format_timestamp(book.api_checked_at),
                        format_timestamp(book.api_updated_at),
                    ],
                )?;
                debug!("Updated book '{}' with id {}", book.title_or_placeholder(), id);
            }
        }
        Ok(())
    }

    async fn delete_by_isbn(&self, isbn: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM books WHERE isbn = ?1", params![isbn])?;
        if affected == 0 {
            return Err(CatalogError::NotFound(isbn.to_string()));
        }
        debug!("Deleted book with ISBN {}", isbn);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Book>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM books ORDER BY isbn")?;
        let books = stmt
            .query_map([], Self::row_to_book)?
            .collect::<rusqlite::Result<Vec<Book>>>()?;
        Ok(books)
    }
}
