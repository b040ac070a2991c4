use crate::config::OpenLibraryConfig;
use crate::dates::resolve_year;
use crate::types::{Book, BookMetadataSource};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub const OPEN_LIBRARY_SOURCE: &str = "open_library";

/// Client for the Open Library books API.
///
/// One GET per lookup, keyed by ISBN. Every failure mode — network error,
/// non-success status, malformed payload, no matching entry — is downgraded
/// to `None`, so enrichment stays a best-effort augmentation.
pub struct OpenLibraryClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenLibraryClient {
    pub fn new(config: &OpenLibraryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Maps one API response body to a canonical record. Pure, so the wire
    /// format handling is testable without a network.
    fn parse_response(isbn: &str, body: &str) -> Option<Book> {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "{}" {
            warn!("No response from Open Library for ISBN {}", isbn);
            return None;
        }

        let root: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                error!("Error while reading Open Library response for ISBN {}: {}", isbn, e);
                return None;
            }
        };

        let key = format!("ISBN:{isbn}");
        let entry = match root.get(key.as_str()) {
            Some(e) if e.is_object() && !e.as_object().is_some_and(|o| o.is_empty()) => e,
            _ => {
                warn!("No book found in Open Library response for ISBN {}", isbn);
                return None;
            }
        };

        // Title is required in the remote schema; an entry without one is
        // treated as no match.
        let title = match entry.get("title").and_then(Value::as_str) {
            Some(t) => t.to_string(),
            None => {
                warn!("Open Library entry for ISBN {} has no title", isbn);
                return None;
            }
        };

        let publication_year =
            resolve_year(entry.get("publish_date").and_then(Value::as_str));

        // Genre is deliberately never taken from this source; its subject
        // data is too inconsistent to propagate.
        Some(Book {
            isbn: isbn.to_string(),
            title: Some(title),
            author: first_name(entry, "authors"),
            publisher: first_name(entry, "publishers"),
            page_count: entry
                .get("number_of_pages")
                .and_then(Value::as_i64)
                .map(|n| n as i32),
            cover_image_url: entry
                .get("cover")
                .and_then(|c| c.get("large"))
                .and_then(Value::as_str)
                .map(str::to_string),
            publication_year,
            ..Book::default()
        })
    }
}

/// First `name` attribute from an array-valued field like `authors` or
/// `publishers`, or `None` when the field is absent, empty, or unshaped.
fn first_name(entry: &Value, field: &str) -> Option<String> {
    entry
        .get(field)?
        .as_array()?
        .first()?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

#[async_trait::async_trait]
impl BookMetadataSource for OpenLibraryClient {
    fn source_name(&self) -> &'static str {
        OPEN_LIBRARY_SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch_by_isbn(&self, isbn: &str) -> Option<Book> {
        let url = format!(
            "{}/books?bibkeys=ISBN:{}&jscmd=data&format=json",
            self.base_url, isbn
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                error!("Open Library request for ISBN {} failed: {}", isbn, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Open Library responded with status {} for ISBN {}",
                response.status().as_u16(),
                isbn
            );
            return None;
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                error!("Failed to read Open Library response for ISBN {}: {}", isbn, e);
                return None;
            }
        };

        debug!("Open Library response for ISBN {}: {}", isbn, body);
        Self::parse_response(isbn, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISBN: &str = "9780451524935";

    fn entry_body(entry: &str) -> String {
        format!(r#"{{"ISBN:{ISBN}": {entry}}}"#)
    }

    #[test]
    fn maps_a_full_entry() {
        let body = entry_body(
            r#"{
                "title": "1984",
                "authors": [{"name": "George Orwell"}, {"name": "Someone Else"}],
                "publishers": [{"name": "Secker & Warburg"}],
                "number_of_pages": 328,
                "publish_date": "Jun 8, 1949",
                "cover": {"large": "https://covers.openlibrary.org/b/id/1-L.jpg"}
            }"#,
        );

        let book = OpenLibraryClient::parse_response(ISBN, &body).unwrap();
        assert_eq!(book.isbn, ISBN);
        assert_eq!(book.title.as_deref(), Some("1984"));
        assert_eq!(book.author.as_deref(), Some("George Orwell"));
        assert_eq!(book.publisher.as_deref(), Some("Secker & Warburg"));
        assert_eq!(book.page_count, Some(328));
        assert_eq!(book.publication_year, Some(1949));
        assert_eq!(
            book.cover_image_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/1-L.jpg")
        );
        // Never taken from this source.
        assert_eq!(book.genre, None);
    }

    #[test]
    fn empty_payload_and_missing_entry_mean_absent() {
        assert!(OpenLibraryClient::parse_response(ISBN, "").is_none());
        assert!(OpenLibraryClient::parse_response(ISBN, "{}").is_none());
        assert!(
            OpenLibraryClient::parse_response(ISBN, r#"{"ISBN:other": {"title": "X"}}"#).is_none()
        );
        assert!(OpenLibraryClient::parse_response(ISBN, &entry_body("{}")).is_none());
    }

    #[test]
    fn malformed_payload_means_absent_not_error() {
        assert!(OpenLibraryClient::parse_response(ISBN, "not json at all").is_none());
        assert!(OpenLibraryClient::parse_response(ISBN, r#"{"ISBN:9780451524935": 42}"#).is_none());
    }

    #[test]
    fn entry_without_title_is_no_match() {
        let body = entry_body(r#"{"authors": [{"name": "A"}]}"#);
        assert!(OpenLibraryClient::parse_response(ISBN, &body).is_none());
    }

    #[test]
    fn zero_page_count_is_passed_through_for_the_merge_to_guard() {
        let body = entry_body(r#"{"title": "T", "number_of_pages": 0}"#);
        let book = OpenLibraryClient::parse_response(ISBN, &body).unwrap();
        assert_eq!(book.page_count, Some(0));
    }

    #[test]
    fn unshaped_author_array_is_tolerated() {
        let body = entry_body(r#"{"title": "T", "authors": ["just a string"]}"#);
        let book = OpenLibraryClient::parse_response(ISBN, &body).unwrap();
        assert_eq!(book.author, None);
    }
}
