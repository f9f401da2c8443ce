// PDF folder listing and the filename filter behind the file list
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{PickerError, Result};

/// Names of the PDF files directly inside `dir`, sorted.
pub fn scan_folder(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(PickerError::NotAFolder(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_pdf_name(&name) {
            names.push(name);
        }
    }
    names.sort();

    debug!("Found {} PDFs in {}", names.len(), dir.display());
    Ok(names)
}

pub fn is_pdf_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

/// The unfiltered folder listing and the view currently shown in the list.
#[derive(Debug, Clone, Default)]
pub struct PdfList {
    folder: PathBuf,
    all: Vec<String>,
    filtered: Vec<String>,
    filter: String,
}

impl PdfList {
    /// Replaces the listing; the filter is reset.
    pub fn load(&mut self, folder: PathBuf, names: Vec<String>) {
        self.folder = folder;
        self.all = names;
        self.apply_filter("");
    }

    /// Case-insensitive substring match, always over the full listing.
    pub fn apply_filter(&mut self, text: &str) {
        self.filter = text.to_string();
        let needle = text.trim().to_lowercase();
        self.filtered = if needle.is_empty() {
            self.all.clone()
        } else {
            self.all
                .iter()
                .filter(|name| name.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        };
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn all(&self) -> &[String] {
        &self.all
    }

    pub fn visible(&self) -> &[String] {
        &self.filtered
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.filtered.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.folder.join(name)
    }
}
