use crate::error::{CatalogError, Result};
use crate::storage::BookStore;
use crate::types::{Book, BookMetadataSource};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Refreshes stored records from the external metadata source under a
/// non-destructive merge policy: a stored field is overwritten only when the
/// remote side actually has a differing value for it.
pub struct Reconciler {
    store: Arc<dyn BookStore>,
    remote: Arc<dyn BookMetadataSource>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn BookStore>, remote: Arc<dyn BookMetadataSource>) -> Self {
        Self { store, remote }
    }

    /// Reconciles the stored record with the given ISBN against the remote
    /// source. Fails with `NotFound` when the ISBN is not in the catalog; a
    /// remote miss is not an error. The check timestamp records every
    /// attempt, the update timestamp only actual field changes.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, isbn: &str) -> Result<Book> {
        let mut local = self
            .store
            .find_by_isbn(isbn)
            .await?
            .ok_or_else(|| CatalogError::NotFound(isbn.to_string()))?;

        // The attempt itself is recorded even if nothing else changes.
        local.api_checked_at = Some(Utc::now());

        let Some(remote) = self.remote.fetch_by_isbn(isbn).await else {
            warn!(
                "ISBN {} not found on {}, only updating check timestamp",
                isbn,
                self.remote.source_name()
            );
            self.store.save(&mut local).await?;
            return Ok(local);
        };

        let mut changed = false;
        merge_field(&mut local.title, remote.title, &mut changed);
        merge_field(&mut local.author, remote.author, &mut changed);
        merge_field(&mut local.publication_year, remote.publication_year, &mut changed);
        merge_field(&mut local.publisher, remote.publisher, &mut changed);
        // The remote default of zero pages means "unknown", never a real count.
        merge_field(
            &mut local.page_count,
            remote.page_count.filter(|n| *n > 0),
            &mut changed,
        );
        merge_field(&mut local.cover_image_url, remote.cover_image_url, &mut changed);

        if changed {
            local.api_updated_at = Some(Utc::now());
            info!(
                "'{}' (ISBN: {}) updated with data from {}",
                local.title_or_placeholder(),
                local.isbn,
                self.remote.source_name()
            );
        } else {
            info!(
                "Data for '{}' (ISBN: {}) is already up to date",
                local.title_or_placeholder(),
                local.isbn
            );
        }

        self.store.save(&mut local).await?;
        Ok(local)
    }
}

/// The one place the overwrite rule lives: a field is taken from the remote
/// record iff the remote value is present and differs from the stored one.
fn merge_field<T: PartialEq>(local: &mut Option<T>, remote: Option<T>, changed: &mut bool) {
    if let Some(value) = remote {
        if local.as_ref() != Some(&value) {
            *local = Some(value);
            *changed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::merge_field;

    #[test]
    fn absent_remote_value_never_clears_local() {
        let mut local = Some("kept".to_string());
        let mut changed = false;
        merge_field(&mut local, None, &mut changed);
        assert_eq!(local.as_deref(), Some("kept"));
        assert!(!changed);
    }

    #[test]
    fn equal_remote_value_does_not_mark_change() {
        let mut local = Some(42);
        let mut changed = false;
        merge_field(&mut local, Some(42), &mut changed);
        assert!(!changed);
    }

    #[test]
    fn differing_remote_value_overwrites_and_marks_change() {
        let mut local: Option<i32> = None;
        let mut changed = false;
        merge_field(&mut local, Some(7), &mut changed);
        assert_eq!(local, Some(7));
        assert!(changed);
    }
}
