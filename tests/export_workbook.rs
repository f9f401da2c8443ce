// tests/export_workbook.rs
use calamine::{open_workbook, Data, Reader, Xlsx};
use rstest::rstest;
use std::path::{Path, PathBuf};

use tablepicker::export::{export_all, export_selected, ExportKind, ExportOutcome};
use tablepicker::selection::Selection;
use tablepicker::{BBox, ExtractedTable, TableCache, TableKey};

fn table(rows: &[&[Option<&str>]]) -> ExtractedTable {
    ExtractedTable::new(
        rows.iter()
            .map(|row| row.iter().map(|c| c.map(str::to_string)).collect())
            .collect(),
        BBox::new(50.0, 50.0, 300.0, 200.0),
    )
}

/// Page 1: two tables. Page 2: nothing. Page 3: one table plus an empty one.
fn sample_cache() -> TableCache {
    let mut cache = TableCache::new(3);
    cache.insert_page(
        0,
        vec![
            table(&[&[Some("Item"), Some("Qty")], &[Some("Nut"), Some("4")]]),
            table(&[&[Some("Total"), None, Some("12")]]),
        ],
    );
    cache.insert_page(1, vec![]);
    cache.insert_page(2, vec![table(&[&[Some("x")]]), table(&[])]);
    cache
}

fn pdf_in(dir: &Path) -> PathBuf {
    dir.join("report.pdf")
}

fn sheet_names(path: &Path) -> Vec<String> {
    let workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.sheet_names().to_vec()
}

#[rstest]
#[case(&[(0, 0)], &["Page1_Table1"])]
#[case(&[(2, 0), (0, 1)], &["Page1_Table2", "Page3_Table1"])]
#[case(&[(0, 0), (0, 1), (2, 0)], &["Page1_Table1", "Page1_Table2", "Page3_Table1"])]
fn test_selected_tables_become_sheets(#[case] keys: &[(usize, usize)], #[case] expected: &[&str]) {
    let dir = tempfile::tempdir().unwrap();
    let cache = sample_cache();
    let mut selection = Selection::new();
    for &(page, index) in keys {
        assert!(selection.toggle(TableKey::new(page, index), cache.page(page).len()));
    }

    let outcome = export_selected(&pdf_in(dir.path()), &cache, &selection).unwrap();
    let path = dir.path().join("report_selected_tables.xlsx");
    assert_eq!(
        outcome,
        ExportOutcome::Written { path: path.clone(), count: expected.len(), kind: ExportKind::Selected }
    );
    assert_eq!(sheet_names(&path), expected);
}

#[test]
fn test_cell_values_are_written_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let cache = sample_cache();

    export_all(&pdf_in(dir.path()), &cache).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(dir.path().join("report_all_tables.xlsx")).unwrap();
    assert_eq!(workbook.sheet_names().to_vec(), vec!["Page1_Table1", "Page1_Table2", "Page3_Table1"]);

    let first = workbook.worksheet_range("Page1_Table1").unwrap();
    assert_eq!(first.get_value((0, 0)), Some(&Data::String("Item".to_string())));
    assert_eq!(first.get_value((1, 1)), Some(&Data::String("4".to_string())));

    let second = workbook.worksheet_range("Page1_Table2").unwrap();
    assert_eq!(second.get_value((0, 0)), Some(&Data::String("Total".to_string())));
    assert!(matches!(second.get_value((0, 1)), None | Some(Data::Empty)));
    assert_eq!(second.get_value((0, 2)), Some(&Data::String("12".to_string())));
}

#[test]
fn test_empty_selection_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = export_selected(&pdf_in(dir.path()), &sample_cache(), &Selection::new()).unwrap();

    assert_eq!(outcome.dialog(), ("No Selection".to_string(), "Select tables first.".to_string()));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_selection_of_only_empty_tables_reports_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut selection = Selection::new();
    selection.toggle(TableKey::new(2, 1), 2);

    let outcome = export_selected(&pdf_in(dir.path()), &sample_cache(), &selection).unwrap();
    assert_eq!(outcome.dialog(), ("No Data".to_string(), "No data to export.".to_string()));
    assert!(!dir.path().join("report_selected_tables.xlsx").exists());
}

#[test]
fn test_pages_without_tables_report_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut cache = TableCache::new(2);
    cache.insert_page(0, vec![]);
    cache.insert_page(1, vec![]);

    let outcome = export_all(&pdf_in(dir.path()), &cache).unwrap();
    assert_eq!(outcome.dialog().0, "No Data");
    assert!(outcome.status().is_none());
}

#[test]
fn test_written_outcome_texts() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = export_all(&pdf_in(dir.path()), &sample_cache()).unwrap();
    let path = dir.path().join("report_all_tables.xlsx");

    assert_eq!(outcome.dialog().1, format!("3 table(s) exported to:\n{}", path.display()));
    assert_eq!(outcome.status().unwrap(), "Exported 3 table(s) to report_all_tables.xlsx");
}
