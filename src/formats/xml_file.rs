use crate::error::{CatalogError, Result};
use crate::types::Book;
use quick_xml::events::Event;
use quick_xml::Reader;

/// XML layout: a `<books>` list element containing one `<book>` child per
/// record, whose children map to the canonical fields:
///
/// ```text
/// <books>
///   <book><isbn>..</isbn><title>..</title>..</book>
/// </books>
/// ```
pub(super) fn decode(bytes: &[u8]) -> Result<Vec<Book>> {
    let xml = std::str::from_utf8(bytes)
        .map_err(|e| CatalogError::decode("XML", format!("not valid UTF-8: {e}")))?;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut books = Vec::new();
    let mut buf = Vec::new();

    let mut in_book = false;
    let mut current_element = String::new();
    let mut current_book = Book::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "book" {
                    in_book = true;
                    current_book = Book::default();
                } else if in_book {
                    current_element = name;
                }
            }
            Ok(Event::Text(ref e)) if in_book => {
                let text = e
                    .unescape()
                    .map_err(|err| CatalogError::decode("XML", err))?
                    .to_string();
                assign_field(&mut current_book, &current_element, &text)?;
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "book" {
                    in_book = false;
                    books.push(std::mem::take(&mut current_book));
                }
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(CatalogError::decode("XML", e)),
        }
        buf.clear();
    }

    Ok(books)
}

fn assign_field(book: &mut Book, element: &str, text: &str) -> Result<()> {
    match element {
        "isbn" => book.isbn = text.to_string(),
        "title" => book.title = Some(text.to_string()),
        "author" => book.author = Some(text.to_string()),
        "genre" => book.genre = Some(text.to_string()),
        "publisher" => book.publisher = Some(text.to_string()),
        "cover_image_url" => book.cover_image_url = Some(text.to_string()),
        "publication_year" => {
            book.publication_year = Some(text.parse().map_err(|_| {
                CatalogError::decode("XML", format!("invalid publication_year '{text}'"))
            })?)
        }
        "page_count" => {
            book.page_count = Some(text.parse().map_err(|_| {
                CatalogError::decode("XML", format!("invalid page_count '{text}'"))
            })?)
        }
        "status" => {
            book.status = text
                .parse()
                .map_err(|e| CatalogError::decode("XML", e))?
        }
        // Unknown child elements are ignored; provenance and timestamps can
        // never be set from a payload.
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Provenance, ReadingStatus};

    #[test]
    fn decodes_book_elements() {
        let input = br#"<books>
            <book>
                <isbn>9780451524935</isbn>
                <title>1984</title>
                <author>George Orwell</author>
                <publication_year>1949</publication_year>
                <status>READ</status>
            </book>
            <book>
                <isbn>9780547928227</isbn>
                <title>The Hobbit</title>
                <page_count>310</page_count>
            </book>
        </books>"#;

        let books = decode(input).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].isbn, "9780451524935");
        assert_eq!(books[0].publication_year, Some(1949));
        assert_eq!(books[0].status, ReadingStatus::Read);
        assert_eq!(books[1].status, ReadingStatus::Unknown);
        assert_eq!(books[1].source, Provenance::Unknown);
    }

    #[test]
    fn source_element_in_payload_is_ignored() {
        let input = br#"<books><book><isbn>9780001</isbn><source>CSV</source></book></books>"#;
        let books = decode(input).unwrap();
        assert_eq!(books[0].source, Provenance::Unknown);
    }

    #[test]
    fn mismatched_end_tag_is_a_decode_error() {
        let input = br#"<books><book><isbn>9780001</isbn></wrong></books>"#;
        let err = decode(input).unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
    }

    #[test]
    fn bad_numeric_field_fails_whole_batch() {
        let input = br#"<books>
            <book><isbn>9780001</isbn><page_count>many</page_count></book>
        </books>"#;
        let err = decode(input).unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
    }
}
