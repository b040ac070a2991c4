pub mod apis;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod formats;
pub mod importer;
pub mod logging;
pub mod reconcile;
pub mod storage;
pub mod types;
