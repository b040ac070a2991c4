use anyhow::Result;
use chrono::Utc;
use shelfkeeper::db::SqliteStore;
use shelfkeeper::error::CatalogError;
use shelfkeeper::storage::BookStore;
use shelfkeeper::types::{Book, Provenance, ReadingStatus};
use tempfile::tempdir;

fn sample(isbn: &str) -> Book {
    Book {
        isbn: isbn.to_string(),
        title: Some("The Hobbit".to_string()),
        author: Some("J. R. R. Tolkien".to_string()),
        genre: Some("Fantasy".to_string()),
        publication_year: Some(1937),
        publisher: Some("Allen & Unwin".to_string()),
        page_count: Some(310),
        status: ReadingStatus::Read,
        source: Provenance::Json,
        ..Book::default()
    }
}

#[tokio::test]
async fn insert_assigns_id_and_round_trips() -> Result<()> {
    let dir = tempdir()?;
    let store = SqliteStore::open(dir.path().join("catalog.db"))?;

    let mut book = sample("9780547928227");
    book.api_checked_at = Some(Utc::now());
    store.save(&mut book).await?;
    assert!(book.id.is_some());

    let stored = store.find_by_isbn("9780547928227").await?.unwrap();
    assert_eq!(stored.id, book.id);
    assert_eq!(stored.title.as_deref(), Some("The Hobbit"));
    assert_eq!(stored.publication_year, Some(1937));
    assert_eq!(stored.status, ReadingStatus::Read);
    assert_eq!(stored.source, Provenance::Json);
    assert_eq!(stored.api_checked_at, book.api_checked_at);
    assert_eq!(stored.api_updated_at, None);
    Ok(())
}

#[tokio::test]
async fn duplicate_isbn_insert_is_rejected_by_the_constraint() -> Result<()> {
    let dir = tempdir()?;
    let store = SqliteStore::open(dir.path().join("catalog.db"))?;

    store.save(&mut sample("9780547928227")).await?;

    let mut duplicate = sample("9780547928227");
    let err = store.save(&mut duplicate).await.unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateIsbn(_)));
    // The rejected record was never promoted.
    assert!(duplicate.id.is_none());
    Ok(())
}

#[tokio::test]
async fn titleless_record_is_a_conflict() -> Result<()> {
    let dir = tempdir()?;
    let store = SqliteStore::open(dir.path().join("catalog.db"))?;

    let mut titleless = Book {
        isbn: "9780001".to_string(),
        ..Book::default()
    };
    let err = store.save(&mut titleless).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn update_keeps_the_isbn_immutable() -> Result<()> {
    let dir = tempdir()?;
    let store = SqliteStore::open(dir.path().join("catalog.db"))?;

    let mut book = sample("9780547928227");
    store.save(&mut book).await?;

    book.page_count = Some(372);
    store.save(&mut book).await?;
    let stored = store.find_by_isbn("9780547928227").await?.unwrap();
    assert_eq!(stored.page_count, Some(372));

    book.isbn = "9780000000000".to_string();
    let err = store.save(&mut book).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn delete_and_exists() -> Result<()> {
    let dir = tempdir()?;
    let store = SqliteStore::open(dir.path().join("catalog.db"))?;

    store.save(&mut sample("9780547928227")).await?;
    assert!(store.exists_by_isbn("9780547928227").await?);

    store.delete_by_isbn("9780547928227").await?;
    assert!(!store.exists_by_isbn("9780547928227").await?);

    let err = store.delete_by_isbn("9780547928227").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn all_lists_by_isbn() -> Result<()> {
    let dir = tempdir()?;
    let store = SqliteStore::open(dir.path().join("catalog.db"))?;

    store.save(&mut sample("9780002")).await?;
    store.save(&mut sample("9780001")).await?;

    let all = store.all().await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].isbn, "9780001");
    assert_eq!(all[1].isbn, "9780002");
    Ok(())
}
