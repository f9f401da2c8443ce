// Core types shared by extraction, selection, export and the UI
use std::collections::BTreeMap;
use std::path::PathBuf;

/// PDF points per inch; page geometry is expressed in these units.
pub const POINTS_PER_INCH: f32 = 72.0;

// Rectangle in PDF points, top-left origin (y grows downward)
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Builds a box from two arbitrary corners, normalizing the order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A selection key: which table on which page.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableKey {
    pub page: usize,
    pub index: usize,
}

impl TableKey {
    pub const fn new(page: usize, index: usize) -> Self {
        Self { page, index }
    }

    /// Sheet name used on export, one-based: `Page<N>_Table<M>`.
    pub fn sheet_name(&self) -> String {
        format!("Page{}_Table{}", self.page + 1, self.index + 1)
    }
}

// One detected table: the cell matrix plus where it sits on the page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTable {
    pub rows: Vec<Vec<Option<String>>>,
    pub bbox: BBox,
}

impl ExtractedTable {
    pub fn new(rows: Vec<Vec<Option<String>>>, bbox: BBox) -> Self {
        Self { rows, bbox }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every table on every page of the loaded document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCache {
    pub total_pages: usize,
    pages: BTreeMap<usize, Vec<ExtractedTable>>,
}

impl TableCache {
    pub fn new(total_pages: usize) -> Self {
        Self {
            total_pages,
            pages: BTreeMap::new(),
        }
    }

    pub fn insert_page(&mut self, page: usize, tables: Vec<ExtractedTable>) {
        self.pages.insert(page, tables);
    }

    /// Tables on `page`; empty when the page was never extracted.
    pub fn page(&self, page: usize) -> &[ExtractedTable] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, key: TableKey) -> Option<&ExtractedTable> {
        self.pages.get(&key.page).and_then(|tables| tables.get(key.index))
    }

    /// Pages in ascending order, each with its tables.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &[ExtractedTable])> {
        self.pages.iter().map(|(page, tables)| (*page, tables.as_slice()))
    }

    pub fn table_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    /// True when nothing was extracted, e.g. the document failed to open.
    /// A document whose pages hold no tables is not empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

// Which controls are currently usable, recomputed from app state every frame
bitflags::bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Controls: u16 {
        const FILE_LIST       = 0b0000_0001;
        const FILTER          = 0b0000_0010;
        const PREV_PAGE       = 0b0000_0100;
        const NEXT_PAGE       = 0b0000_1000;
        const SELECT_ALL      = 0b0001_0000;
        const EXPORT_SELECTED = 0b0010_0000;
        const EXPORT_ALL      = 0b0100_0000;
        const EXIT            = 0b1000_0000;
        const PICK_FOLDER     = 0b1_0000_0000;
    }
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum PickerError {
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    #[error("not a folder: {0}")]
    NotAFolder(PathBuf),
}

impl From<pdfium_render::prelude::PdfiumError> for PickerError {
    fn from(err: pdfium_render::prelude::PdfiumError) -> Self {
        PickerError::Pdf(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PickerError>;
