use crate::error::{CatalogError, Result};
use crate::types::Book;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Storage trait for the persisted book catalog.
///
/// `isbn` is the natural key: the store guarantees no two persisted records
/// share one, and that guarantee is the only protection against concurrent
/// importers racing between lookup and insert.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;
    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool>;

    /// Insert when `book.id` is empty (a surrogate id is assigned), update in
    /// place otherwise. Rejects records without a title and inserts that
    /// would duplicate an ISBN.
    async fn save(&self, book: &mut Book) -> Result<()>;

    async fn delete_by_isbn(&self, isbn: &str) -> Result<()>;
    async fn all(&self) -> Result<Vec<Book>>;
}

/// In-memory store for tests and ephemeral runs.
pub struct InMemoryStore {
    books: Mutex<HashMap<Uuid, Book>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for InMemoryStore {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let books = self.books.lock().unwrap();
        Ok(books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool> {
        let books = self.books.lock().unwrap();
        Ok(books.values().any(|b| b.isbn == isbn))
    }

    async fn save(&self, book: &mut Book) -> Result<()> {
        if book.title.is_none() {
            return Err(CatalogError::Conflict(format!(
                "book with ISBN {} has no title",
                book.isbn
            )));
        }

        let mut books = self.books.lock().unwrap();
        match book.id {
            None => {
                if books.values().any(|b| b.isbn == book.isbn) {
                    return Err(CatalogError::DuplicateIsbn(book.isbn.clone()));
                }
                let id = Uuid::new_v4();
                book.id = Some(id);
                books.insert(id, book.clone());
                debug!("Created book '{}' with id {}", book.title_or_placeholder(), id);
            }
            Some(id) => {
                let existing = books.get(&id).ok_or_else(|| {
                    CatalogError::Conflict(format!("no stored book with id {id}"))
                })?;
                // The natural key is immutable once persisted.
                if existing.isbn != book.isbn {
                    return Err(CatalogError::Conflict(format!(
                        "attempt to change ISBN of stored book {id}"
                    )));
                }
                books.insert(id, book.clone());
                debug!("Updated book '{}' with id {}", book.title_or_placeholder(), id);
            }
        }
        Ok(())
    }

    async fn delete_by_isbn(&self, isbn: &str) -> Result<()> {
        let mut books = self.books.lock().unwrap();
        let id = books
            .iter()
            .find(|(_, b)| b.isbn == isbn)
            .map(|(id, _)| *id)
            .ok_or_else(|| CatalogError::NotFound(isbn.to_string()))?;
        books.remove(&id);
        debug!("Deleted book with ISBN {}", isbn);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Book>> {
        let books = self.books.lock().unwrap();
        let mut list: Vec<Book> = books.values().cloned().collect();
        list.sort_by(|a, b| a.isbn.cmp(&b.isbn));
        Ok(list)
    }
}
