mod csv_file;
mod json_file;
mod xml_file;

use crate::error::{CatalogError, Result};
use crate::types::{Book, Provenance};
use std::path::Path;
use tracing::{info, instrument};

/// Declared serialization of an inbound book file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    Csv,
    Json,
    Xml,
}

impl BookFormat {
    pub fn name(&self) -> &'static str {
        match self {
            BookFormat::Csv => "CSV",
            BookFormat::Json => "JSON",
            BookFormat::Xml => "XML",
        }
    }

    /// Provenance tag records which pass through the importer go under.
    pub fn provenance(&self) -> Provenance {
        match self {
            BookFormat::Csv => Provenance::Csv,
            BookFormat::Json => Provenance::Json,
            BookFormat::Xml => Provenance::Xml,
        }
    }

    /// Infer the format from a file extension, for the CLI import path.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(BookFormat::Csv),
            Some("json") => Ok(BookFormat::Json),
            Some("xml") => Ok(BookFormat::Xml),
            other => Err(CatalogError::Config(format!(
                "Cannot infer book format from file extension {:?}; pass --format",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

impl std::fmt::Display for BookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for BookFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(BookFormat::Csv),
            "json" => Ok(BookFormat::Json),
            "xml" => Ok(BookFormat::Xml),
            other => Err(format!("unknown book format '{other}'")),
        }
    }
}

/// Decodes a whole document into canonical records, provenance unset.
///
/// Decoding is all-or-nothing: a structurally invalid document fails with
/// `CatalogError::Decode` and never yields a partial record list.
#[instrument(skip(bytes), fields(format = %format, bytes = bytes.len()))]
pub fn decode(bytes: &[u8], format: BookFormat) -> Result<Vec<Book>> {
    let books = match format {
        BookFormat::Csv => csv_file::decode(bytes)?,
        BookFormat::Json => json_file::decode(bytes)?,
        BookFormat::Xml => xml_file::decode(bytes)?,
    };
    info!("Decoded {} records from {} document", books.len(), format);
    Ok(books)
}
