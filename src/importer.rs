use crate::storage::BookStore;
use crate::types::{Book, Provenance};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Outcome counters for one import batch.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: usize,
    pub skipped_existing: usize,
    pub skipped_missing_isbn: usize,
    pub errors: Vec<String>,
}

/// Deduplicating importer for decoded book batches.
///
/// Import is best-effort and partial-success by design: a record that cannot
/// be persisted is logged and skipped, and the batch keeps going. The
/// existence check and the insert are not atomic against the store; the
/// store's ISBN uniqueness constraint resolves any race, and the resulting
/// save failure is handled like every other per-record conflict.
pub struct Importer {
    store: Arc<dyn BookStore>,
}

impl Importer {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Persists the new records of a decoded batch, in input order, tagging
    /// each with the batch's provenance. Records already in the catalog are
    /// never overwritten.
    #[instrument(skip(self, books), fields(source = %source, total = books.len()))]
    pub async fn import_batch(&self, books: Vec<Book>, source: Provenance) -> ImportSummary {
        let mut summary = ImportSummary {
            total: books.len(),
            ..ImportSummary::default()
        };

        if books.is_empty() {
            info!("[{}] contains no books to import", source);
            return summary;
        }

        for mut book in books {
            if book.missing_isbn() {
                warn!(
                    "[{}] '{}' has no ISBN, skipping import",
                    source,
                    book.title_or_placeholder()
                );
                summary.skipped_missing_isbn += 1;
                continue;
            }

            match self.store.find_by_isbn(&book.isbn).await {
                Ok(Some(_)) => {
                    info!(
                        "[{}] '{}' (ISBN: {}) already in catalog, skipping import",
                        source,
                        book.title_or_placeholder(),
                        book.isbn
                    );
                    summary.skipped_existing += 1;
                }
                Ok(None) => {
                    // Promote to persisted state: the store assigns the
                    // surrogate id, the importer owns the provenance tag.
                    book.id = None;
                    book.source = source;

                    match self.store.save(&mut book).await {
                        Ok(()) => {
                            info!(
                                "[{}] Imported '{}' (ISBN: {})",
                                source,
                                book.title_or_placeholder(),
                                book.isbn
                            );
                            summary.imported += 1;
                        }
                        Err(e) => {
                            error!(
                                "[{}] Error while saving '{}' (ISBN: {}): {}",
                                source,
                                book.title_or_placeholder(),
                                book.isbn,
                                e
                            );
                            summary.errors.push(format!("{}: {}", book.isbn, e));
                        }
                    }
                }
                Err(e) => {
                    // A failed lookup is isolated exactly like a failed save.
                    error!(
                        "[{}] Lookup failed for ISBN {}: {}",
                        source, book.isbn, e
                    );
                    summary.errors.push(format!("{}: {}", book.isbn, e));
                }
            }
        }

        info!(
            "[{}] Import finished: {} imported, {} existing, {} without ISBN, {} errors",
            source,
            summary.imported,
            summary.skipped_existing,
            summary.skipped_missing_isbn,
            summary.errors.len()
        );
        summary
    }
}
