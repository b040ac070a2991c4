use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Reading progress of a cataloged book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReadingStatus {
    Reading,
    Read,
    Planned,
    #[default]
    Unknown,
}

impl ReadingStatus {
    /// Canonical storage token, matching the serialized wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Reading => "READING",
            ReadingStatus::Read => "READ",
            ReadingStatus::Planned => "PLANNED",
            ReadingStatus::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable label for list output and web views.
    pub fn label(&self) -> &'static str {
        match self {
            ReadingStatus::Reading => "Reading",
            ReadingStatus::Read => "Read",
            ReadingStatus::Planned => "Planned",
            ReadingStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "READING" => Ok(ReadingStatus::Reading),
            "READ" => Ok(ReadingStatus::Read),
            "PLANNED" => Ok(ReadingStatus::Planned),
            "UNKNOWN" | "" => Ok(ReadingStatus::Unknown),
            other => Err(format!("unknown reading status '{other}'")),
        }
    }
}

/// Which ingestion path produced a persisted record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provenance {
    Csv,
    Json,
    Xml,
    Api,
    #[default]
    Unknown,
}

impl Provenance {
    /// Canonical storage token, matching the serialized wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Csv => "CSV",
            Provenance::Json => "JSON",
            Provenance::Xml => "XML",
            Provenance::Api => "API",
            Provenance::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provenance::Csv => "CSV file",
            Provenance::Json => "JSON file",
            Provenance::Xml => "XML file",
            Provenance::Api => "API",
            Provenance::Unknown => "Unknown",
        }
    }
}

impl std::str::FromStr for Provenance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CSV" => Ok(Provenance::Csv),
            "JSON" => Ok(Provenance::Json),
            "XML" => Ok(Provenance::Xml),
            "API" => Ok(Provenance::Api),
            "UNKNOWN" | "" => Ok(Provenance::Unknown),
            other => Err(format!("unknown provenance '{other}'")),
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical bibliographic record, shared by every decoder, the importer,
/// the Open Library client, and the stores.
///
/// `id` is the storage surrogate; `isbn` is the natural key used for
/// deduplication. Inbound payloads can never set the surrogate id, the
/// provenance tag, or the reconciliation timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    #[serde(skip_deserializing)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub isbn: String,
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default, deserialize_with = "de_reading_status")]
    pub status: ReadingStatus,
    #[serde(skip_deserializing, default)]
    pub source: Provenance,
    #[serde(skip_deserializing)]
    pub api_checked_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing)]
    pub api_updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// True when the natural key is absent; such records are unimportable.
    pub fn missing_isbn(&self) -> bool {
        self.isbn.trim().is_empty()
    }

    /// Title for log lines, where a record may not have one yet.
    pub fn title_or_placeholder(&self) -> &str {
        self.title.as_deref().unwrap_or("<untitled>")
    }
}

/// Tolerant status decoding: absent columns and empty cells both mean
/// the status was not provided, which normalizes to Unknown.
fn de_reading_status<'de, D>(deserializer: D) -> std::result::Result<ReadingStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(ReadingStatus::Unknown),
        Some(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Seam to the external bibliographic service.
///
/// Lookups are best-effort by construction: implementors downgrade network
/// failures and malformed payloads to `None` after logging, so callers never
/// see a hard error from enrichment.
#[async_trait::async_trait]
pub trait BookMetadataSource: Send + Sync {
    /// Identifier for this metadata source, used in diagnostics.
    fn source_name(&self) -> &'static str;

    /// Fetch book details by ISBN. `None` means "no usable match".
    async fn fetch_by_isbn(&self, isbn: &str) -> Option<Book>;
}
