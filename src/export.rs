// Writing detected tables to an xlsx workbook next to the source PDF
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::selection::Selection;
use crate::types::{ExtractedTable, Result, TableCache, TableKey};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportKind {
    Selected,
    All,
}

impl ExportKind {
    fn file_suffix(self) -> &'static str {
        match self {
            ExportKind::Selected => "_selected_tables.xlsx",
            ExportKind::All => "_all_tables.xlsx",
        }
    }
}

/// `<dir>/<stem>_selected_tables.xlsx` or `<dir>/<stem>_all_tables.xlsx`.
pub fn export_path(pdf_path: &Path, kind: ExportKind) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    pdf_path.with_file_name(format!("{stem}{}", kind.file_suffix()))
}

pub type ExportPlan<'a> = Vec<(TableKey, &'a ExtractedTable)>;

/// Selected tables in page-major order. Keys without a cached table and
/// tables without rows are skipped.
pub fn plan_selected<'a>(cache: &'a TableCache, selection: &Selection) -> ExportPlan<'a> {
    selection
        .iter()
        .filter_map(|key| cache.get(*key).map(|table| (*key, table)))
        .filter(|(_, table)| !table.is_empty())
        .collect()
}

/// Every non-empty table, pages ascending.
pub fn plan_all(cache: &TableCache) -> ExportPlan<'_> {
    cache
        .pages()
        .flat_map(|(page, tables)| {
            tables
                .iter()
                .enumerate()
                .map(move |(index, table)| (TableKey::new(page, index), table))
        })
        .filter(|(_, table)| !table.is_empty())
        .collect()
}

/// One sheet per planned table, named after its key. `None` cells stay blank.
pub fn write_workbook(path: &Path, plan: &[(TableKey, &ExtractedTable)]) -> Result<()> {
    let mut workbook = Workbook::new();

    for (key, table) in plan {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(key.sheet_name())?;

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                if let Some(text) = cell.as_deref().filter(|t| !t.is_empty()) {
                    worksheet.write_string(row_idx as u32, col_idx as u16, text)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing was written.
    Info { title: String, message: String },
    Written { path: PathBuf, count: usize, kind: ExportKind },
}

impl ExportOutcome {
    fn info(title: &str, message: &str) -> Self {
        ExportOutcome::Info {
            title: title.to_string(),
            message: message.to_string(),
        }
    }

    /// Title and body of the dialog shown to the user.
    pub fn dialog(&self) -> (String, String) {
        match self {
            ExportOutcome::Info { title, message } => (title.clone(), message.clone()),
            ExportOutcome::Written { path, count, .. } => (
                "Exported".to_string(),
                format!("{count} table(s) exported to:\n{}", path.display()),
            ),
        }
    }

    /// Status bar text, only for a written workbook.
    pub fn status(&self) -> Option<String> {
        match self {
            ExportOutcome::Info { .. } => None,
            ExportOutcome::Written { path, count, kind } => {
                let file = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Some(match kind {
                    ExportKind::Selected => format!("Exported {count} selected table(s) to {file}"),
                    ExportKind::All => format!("Exported {count} table(s) to {file}"),
                })
            }
        }
    }
}

pub fn export_selected(pdf_path: &Path, cache: &TableCache, selection: &Selection) -> Result<ExportOutcome> {
    if selection.is_empty() {
        return Ok(ExportOutcome::info("No Selection", "Select tables first."));
    }
    write_plan(pdf_path, &plan_selected(cache, selection), ExportKind::Selected)
}

pub fn export_all(pdf_path: &Path, cache: &TableCache) -> Result<ExportOutcome> {
    if cache.is_empty() {
        return Ok(ExportOutcome::info("No Tables", "No tables found."));
    }
    write_plan(pdf_path, &plan_all(cache), ExportKind::All)
}

fn write_plan(pdf_path: &Path, plan: &[(TableKey, &ExtractedTable)], kind: ExportKind) -> Result<ExportOutcome> {
    if plan.is_empty() {
        return Ok(ExportOutcome::info("No Data", "No data to export."));
    }

    let path = export_path(pdf_path, kind);
    write_workbook(&path, plan)?;
    info!("Wrote {} sheet(s) to {}", plan.len(), path.display());

    Ok(ExportOutcome::Written { path, count: plan.len(), kind })
}
