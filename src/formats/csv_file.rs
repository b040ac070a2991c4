use crate::error::{CatalogError, Result};
use crate::types::Book;

/// CSV layout: a header row naming the canonical fields, one record per
/// comma-separated row. Cells left empty decode to the optional-field
/// defaults.
pub(super) fn decode(bytes: &[u8]) -> Result<Vec<Book>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .trim(csv::Trim::All)
        .from_reader(bytes);

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<Book>, _>>()
        .map_err(|e| CatalogError::decode("CSV", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReadingStatus;

    #[test]
    fn decodes_rows_positionally_by_header() {
        let input = b"isbn,title,author,publication_year,status\n\
            9780451524935,1984,George Orwell,1949,READ\n\
            9780141439518,Pride and Prejudice,Jane Austen,1813,PLANNED\n";

        let books = decode(input).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].isbn, "9780451524935");
        assert_eq!(books[0].title.as_deref(), Some("1984"));
        assert_eq!(books[0].publication_year, Some(1949));
        assert_eq!(books[0].status, ReadingStatus::Read);
        assert_eq!(books[1].author.as_deref(), Some("Jane Austen"));
    }

    #[test]
    fn empty_cells_become_defaults() {
        let input = b"isbn,title,author,genre,publication_year,status\n\
            9780001,Some Title,,,,\n";

        let books = decode(input).unwrap();
        assert_eq!(books[0].author, None);
        assert_eq!(books[0].publication_year, None);
        assert_eq!(books[0].status, ReadingStatus::Unknown);
    }

    #[test]
    fn structurally_invalid_document_fails_whole_batch() {
        // Second row has a non-numeric year; nothing is returned.
        let input = b"isbn,title,publication_year\n\
            9780001,Good Row,1990\n\
            9780002,Bad Row,not-a-year\n";

        let err = decode(input).unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
    }
}
