//! Browse a folder of PDFs, pick detected tables on a page preview and
//! export them to xlsx workbooks.

pub mod app;
pub mod config;
pub mod export;
pub mod extract;
pub mod folder;
pub mod geometry;
pub mod pdf;
pub mod preview;
pub mod selection;
pub mod tables;
pub mod types;

pub use config::AppConfig;
pub use types::{BBox, ExtractedTable, PickerError, Result, TableCache, TableKey};
