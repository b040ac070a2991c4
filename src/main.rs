use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

mod apis;
mod config;
mod dates;
mod db;
mod error;
mod formats;
mod importer;
mod logging;
mod reconcile;
mod storage;
mod types;

use crate::apis::open_library::OpenLibraryClient;
use crate::config::Config;
use crate::db::SqliteStore;
use crate::error::CatalogError;
use crate::formats::BookFormat;
use crate::importer::Importer;
use crate::reconcile::Reconciler;
use crate::storage::{BookStore, InMemoryStore};
use crate::types::{Book, Provenance, ReadingStatus};

#[derive(Parser)]
#[command(name = "shelfkeeper")]
#[command(about = "Book catalog importer with Open Library enrichment")]
#[command(version = "0.1.0")]
struct Cli {
    /// Use an ephemeral in-memory catalog instead of the SQLite database
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a book file (CSV, JSON or XML) into the catalog
    Import {
        /// Path to the file to import
        file: PathBuf,
        /// File format; inferred from the extension when omitted
        #[arg(long)]
        format: Option<String>,
    },
    /// Refresh a stored book with data from Open Library
    Enrich {
        /// ISBN of the book to refresh
        isbn: String,
    },
    /// Add a single book to the catalog
    Add {
        isbn: String,
        title: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        publisher: Option<String>,
        #[arg(long)]
        pages: Option<i32>,
        /// Reading status: reading, read, planned or unknown
        #[arg(long)]
        status: Option<String>,
    },
    /// List the catalog
    List,
    /// Delete a book by ISBN
    Delete { isbn: String },
}

fn open_store(cli: &Cli, config: &Config) -> Result<Arc<dyn BookStore>, CatalogError> {
    if cli.in_memory {
        Ok(Arc::new(InMemoryStore::new()))
    } else {
        Ok(Arc::new(SqliteStore::open(&config.storage.database_path)?))
    }
}

async fn run_import(
    store: Arc<dyn BookStore>,
    file: &PathBuf,
    format: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = match format {
        Some(name) => name.parse::<BookFormat>()?,
        None => BookFormat::from_path(file)?,
    };

    println!("📥 Importing {} file {}...", format, file.display());
    let bytes = std::fs::read(file)?;
    let books = formats::decode(&bytes, format)?;

    let importer = Importer::new(store);
    let summary = importer.import_batch(books, format.provenance()).await;

    println!("\n📊 Import results for {}:", file.display());
    println!("   Total records: {}", summary.total);
    println!("   Imported: {}", summary.imported);
    println!("   Already in catalog: {}", summary.skipped_existing);
    println!("   Without ISBN: {}", summary.skipped_missing_isbn);
    println!("   Errors: {}", summary.errors.len());

    if !summary.errors.is_empty() {
        println!("\n⚠️  Errors encountered:");
        for err in &summary.errors {
            println!("   - {err}");
        }
    }
    Ok(())
}

/// Direct single-record insert, the CRUD-surface path: records added here are
/// tagged with API provenance and rejected on duplicate or missing ISBN.
async fn add_book(
    store: Arc<dyn BookStore>,
    mut book: Book,
) -> Result<Book, CatalogError> {
    if book.missing_isbn() {
        return Err(CatalogError::MissingIsbn);
    }
    if store.exists_by_isbn(&book.isbn).await? {
        return Err(CatalogError::DuplicateIsbn(book.isbn.clone()));
    }
    book.id = None;
    book.source = Provenance::Api;
    store.save(&mut book).await?;
    Ok(book)
}

fn print_book(book: &Book) {
    println!(
        "   {} | {} | {} | {} | {} | {}",
        book.isbn,
        book.title_or_placeholder(),
        book.author.as_deref().unwrap_or("-"),
        book.publication_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string()),
        book.status.label(),
        book.source.label(),
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let store = open_store(&cli, &config)?;

    match &cli.command {
        Commands::Import { file, format } => {
            run_import(store, file, format.clone()).await?;
        }
        Commands::Enrich { isbn } => {
            println!("🔄 Fetching Open Library data for ISBN {isbn}...");
            let remote = Arc::new(OpenLibraryClient::new(&config.open_library));
            let reconciler = Reconciler::new(store, remote);

            match reconciler.reconcile(isbn).await {
                Ok(book) => {
                    println!("✅ Catalog entry is current:");
                    print_book(&book);
                }
                Err(CatalogError::NotFound(isbn)) => {
                    error!("Book with ISBN {} not in catalog", isbn);
                    println!("❌ Book with ISBN {isbn} not in catalog");
                }
                Err(e) => {
                    error!("Enrichment failed: {}", e);
                    println!("❌ Enrichment failed: {e}");
                }
            }
        }
        Commands::Add {
            isbn,
            title,
            author,
            genre,
            year,
            publisher,
            pages,
            status,
        } => {
            let status = match status {
                Some(raw) => raw.parse::<ReadingStatus>()?,
                None => ReadingStatus::Unknown,
            };
            let book = Book {
                isbn: isbn.clone(),
                title: Some(title.clone()),
                author: author.clone(),
                genre: genre.clone(),
                publication_year: *year,
                publisher: publisher.clone(),
                page_count: *pages,
                status,
                ..Book::default()
            };

            match add_book(store, book).await {
                Ok(book) => {
                    info!("Added '{}' (ISBN: {})", book.title_or_placeholder(), book.isbn);
                    println!("✅ Added book:");
                    print_book(&book);
                }
                Err(e) => {
                    error!("Add failed: {}", e);
                    println!("❌ {e}");
                }
            }
        }
        Commands::List => {
            let books = store.all().await?;
            if books.is_empty() {
                println!("📚 Catalog is empty");
            } else {
                println!("📚 {} books in catalog:", books.len());
                for book in &books {
                    print_book(book);
                }
            }
        }
        Commands::Delete { isbn } => match store.delete_by_isbn(isbn).await {
            Ok(()) => println!("🗑️  Deleted book with ISBN {isbn}"),
            Err(CatalogError::NotFound(isbn)) => {
                println!("❌ Book with ISBN {isbn} does not exist")
            }
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
