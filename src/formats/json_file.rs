use crate::error::{CatalogError, Result};
use crate::types::Book;
use serde_json::Value;

/// JSON layout: a single object whose `books` field holds the record array,
/// e.g. `{ "books": [ {..}, {..} ] }`. The array is extracted first, then
/// every element is decoded; one bad element fails the whole document.
pub(super) fn decode(bytes: &[u8]) -> Result<Vec<Book>> {
    let root: Value =
        serde_json::from_slice(bytes).map_err(|e| CatalogError::decode("JSON", e))?;

    let entries = root
        .get("books")
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::decode("JSON", "expected an object with a 'books' array"))?;

    entries
        .iter()
        .map(|entry| serde_json::from_value(entry.clone()).map_err(|e| CatalogError::decode("JSON", e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Provenance, ReadingStatus};

    #[test]
    fn decodes_records_from_the_collection_field() {
        let input = br#"{
            "books": [
                {"isbn": "9780451524935", "title": "1984", "author": "George Orwell", "status": "READ"},
                {"isbn": "9780547928227", "title": "The Hobbit", "page_count": 310}
            ]
        }"#;

        let books = decode(input).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].status, ReadingStatus::Read);
        assert_eq!(books[1].page_count, Some(310));
        // Decoders never assign provenance; the importer does.
        assert_eq!(books[0].source, Provenance::Unknown);
    }

    #[test]
    fn missing_status_defaults_to_unknown() {
        let input = br#"{"books": [{"isbn": "9780001", "title": "T"}]}"#;
        let books = decode(input).unwrap();
        assert_eq!(books[0].status, ReadingStatus::Unknown);
    }

    #[test]
    fn payload_without_collection_field_is_a_decode_error() {
        let err = decode(br#"[{"isbn": "9780001"}]"#).unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = decode(b"{ not json").unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
    }
}
