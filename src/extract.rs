// Background table extraction for one document
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::pdf::{load_page_content, with_pdfium};
use crate::tables::{TableFinder, TableSettings};
use crate::types::{Result, TableCache};

/// Runs `finder` over every page and caches each page's tables, including
/// pages where nothing was found.
pub fn extract_document(lib_path: &Path, pdf_path: &Path, finder: &dyn TableFinder) -> Result<TableCache> {
    let start = Instant::now();

    let cache = with_pdfium(lib_path, |pdfium| {
        let document = pdfium.load_pdf_from_file(pdf_path, None)?;
        let mut cache = TableCache::new(document.pages().len() as usize);

        for (page_num, page) in document.pages().iter().enumerate() {
            let content = load_page_content(&page)?;
            let tables = finder.find_tables(&content);
            debug!("Page {}: {} table(s)", page_num + 1, tables.len());
            cache.insert_page(page_num, tables);
        }
        Ok(cache)
    })?;

    debug!(
        "Extracted {} table(s) from {} page(s) of {} in {:?}",
        cache.table_count(),
        cache.total_pages,
        pdf_path.display(),
        start.elapsed()
    );
    Ok(cache)
}

/// Everything the worker needs, moved onto its thread.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub generation: u64,
    pub pdf_name: String,
    pub pdf_path: PathBuf,
    pub lib_path: PathBuf,
    pub settings: TableSettings,
}

#[derive(Debug)]
pub struct ExtractionOutcome {
    pub generation: u64,
    pub pdf_name: String,
    pub result: std::result::Result<TableCache, String>,
}

pub struct ExtractionWorker;

impl ExtractionWorker {
    /// Starts one detached extraction. The returned channel yields exactly
    /// one outcome, after which `notify` is called.
    pub fn spawn<N>(job: ExtractionJob, notify: N) -> Receiver<ExtractionOutcome>
    where
        N: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            info!("Extracting tables from {}", job.pdf_name);
            let result = run_job(&job);
            if let Err(e) = &result {
                error!("Extraction of {} failed: {e}", job.pdf_name);
            }

            let outcome = ExtractionOutcome {
                generation: job.generation,
                pdf_name: job.pdf_name,
                result,
            };
            // The receiver is gone when the app closed mid-load
            let _ = tx.send(outcome);
            notify();
        });

        rx
    }
}

fn run_job(job: &ExtractionJob) -> std::result::Result<TableCache, String> {
    let finder = job.settings.finder();
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        extract_document(&job.lib_path, &job.pdf_path, finder.as_ref())
    })) {
        Ok(Ok(cache)) => Ok(cache),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("extraction panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("extraction panicked: {s}")
    } else {
        "extraction panicked".to_string()
    }
}
