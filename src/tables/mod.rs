//! Table finding on a single page.
//!
//! Finders work on [`PageContent`], a backend-independent snapshot of a page
//! (characters and ruling edges in top-left PDF points), so they can be
//! exercised without the native pdfium library.

pub mod lines;
pub mod text;
pub mod words;

use serde::{Deserialize, Serialize};

use crate::types::{BBox, ExtractedTable, PickerError, Result};

pub use lines::LinesFinder;
pub use text::TextFinder;

/// One glyph with its box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChar {
    pub ch: char,
    pub bbox: BBox,
}

impl TextChar {
    pub fn new(ch: char, bbox: BBox) -> Self {
        Self { ch, bbox }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A straight ruling line. Horizontal edges have `y0 == y1`, vertical ones
/// `x0 == x1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge {
    pub orientation: Orientation,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Edge {
    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Self { orientation: Orientation::Horizontal, x0: x0.min(x1), y0: y, x1: x0.max(x1), y1: y }
    }

    pub fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Self { orientation: Orientation::Vertical, x0: x, y0: y0.min(y1), x1: x, y1: y0.max(y1) }
    }

    pub fn length(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.y1 - self.y0,
        }
    }

    /// A thin painted shape (a filled bar) read as one line along its long
    /// side. Shapes thick in both directions are not lines.
    pub fn from_thin_shape(bbox: &BBox, thickness: f32) -> Option<Edge> {
        let (cx, cy) = bbox.center();
        if bbox.height() <= thickness && bbox.width() > thickness {
            Some(Edge::horizontal(cy, bbox.x0, bbox.x1))
        } else if bbox.width() <= thickness && bbox.height() > thickness {
            Some(Edge::vertical(cx, bbox.y0, bbox.y1))
        } else {
            None
        }
    }

    /// Axis-aligned straight runs of a path. A run whose ends differ by at
    /// most `tolerance` across its direction counts as straight; curves and
    /// slanted lines contribute nothing.
    pub fn from_path(steps: &[PathStep], tolerance: f32) -> Vec<Edge> {
        let mut edges = Vec::new();
        let mut current = None;
        let mut start = None;

        for step in steps {
            match *step {
                PathStep::MoveTo(x, y) => {
                    current = Some((x, y));
                    start = current;
                }
                PathStep::LineTo(x, y) => {
                    if let Some(from) = current {
                        edges.extend(straight_run(from, (x, y), tolerance));
                    }
                    current = Some((x, y));
                }
                PathStep::CurveTo(x, y) => current = Some((x, y)),
                PathStep::Close => {
                    if let (Some(from), Some(to)) = (current, start) {
                        edges.extend(straight_run(from, to, tolerance));
                    }
                    current = start;
                }
            }
        }
        edges
    }
}

fn straight_run((x0, y0): (f32, f32), (x1, y1): (f32, f32), tolerance: f32) -> Option<Edge> {
    let (dx, dy) = ((x1 - x0).abs(), (y1 - y0).abs());
    if dy <= tolerance && dx > tolerance {
        Some(Edge::horizontal((y0 + y1) / 2.0, x0, x1))
    } else if dx <= tolerance && dy > tolerance {
        Some(Edge::vertical((x0 + x1) / 2.0, y0, y1))
    } else {
        None
    }
}

/// One step of a painted path, in top-left page points.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathStep {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    /// Bezier (or unknown) segment; only its end point matters.
    CurveTo(f32, f32),
    /// Closes the current subpath back to its last `MoveTo`.
    Close,
}

/// Everything a finder needs to know about one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub width: f32,
    pub height: f32,
    pub chars: Vec<TextChar>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Ruling lines only.
    #[default]
    Lines,
    /// Text alignment only.
    Text,
    /// Ruling lines, falling back to text alignment on pages without any.
    Auto,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TableSettings {
    pub strategy: Strategy,
    /// Edges this close to each other (points) are snapped onto one line.
    pub snap_tolerance: f32,
    /// Collinear edges separated by at most this gap are joined.
    pub join_tolerance: f32,
    /// How far an edge may stop short of a crossing edge and still intersect it.
    pub intersection_tolerance: f32,
    /// Shorter edges are discarded.
    pub edge_min_length: f32,
    /// Fewest rows an unruled table may have (text strategy). Ruled tables
    /// are kept whatever their size.
    pub min_rows: usize,
    /// Fewest columns an unruled table may have (text strategy).
    pub min_cols: usize,
    /// Words whose vertical centres are this close share a row (text strategy).
    pub row_tolerance: f32,
    /// Word left edges this close share a column (text strategy).
    pub col_tolerance: f32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::Lines,
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            intersection_tolerance: 3.0,
            edge_min_length: 3.0,
            min_rows: 2,
            min_cols: 2,
            row_tolerance: 5.0,
            col_tolerance: 10.0,
        }
    }
}

impl TableSettings {
    pub fn validate(&self) -> Result<()> {
        let tolerances = [
            ("snap_tolerance", self.snap_tolerance),
            ("join_tolerance", self.join_tolerance),
            ("intersection_tolerance", self.intersection_tolerance),
            ("edge_min_length", self.edge_min_length),
            ("row_tolerance", self.row_tolerance),
            ("col_tolerance", self.col_tolerance),
        ];
        for (name, value) in tolerances {
            if !(value >= 0.0) {
                let message = format!("tables.{name} must not be negative, got {value}");
                return Err(PickerError::Config(message));
            }
        }
        if self.min_rows == 0 || self.min_cols == 0 {
            let message = "tables.min_rows and tables.min_cols must be at least 1";
            return Err(PickerError::Config(message.to_string()));
        }
        Ok(())
    }

    /// The finder configured by `strategy`.
    pub fn finder(&self) -> Box<dyn TableFinder> {
        match self.strategy {
            Strategy::Lines => Box::new(LinesFinder::new(self.clone())),
            Strategy::Text => Box::new(TextFinder::new(self.clone())),
            Strategy::Auto => Box::new(AutoFinder {
                lines: LinesFinder::new(self.clone()),
                text: TextFinder::new(self.clone()),
            }),
        }
    }
}

/// Detects tables on one page. Results are in reading order.
pub trait TableFinder: Send + Sync {
    fn find_tables(&self, page: &PageContent) -> Vec<ExtractedTable>;
}

struct AutoFinder {
    lines: LinesFinder,
    text: TextFinder,
}

impl TableFinder for AutoFinder {
    fn find_tables(&self, page: &PageContent) -> Vec<ExtractedTable> {
        let tables = self.lines.find_tables(page);
        if tables.is_empty() {
            self.text.find_tables(page)
        } else {
            tables
        }
    }
}

/// Top-to-bottom, then left-to-right.
pub(crate) fn sort_reading_order(tables: &mut [ExtractedTable]) {
    tables.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Characters for `text` laid out left to right from (x, top), 6pt wide, 10pt tall.
    pub fn word(text: &str, x: f32, top: f32) -> Vec<TextChar> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let x0 = x + i as f32 * 6.0;
                TextChar::new(ch, BBox::new(x0, top, x0 + 6.0, top + 10.0))
            })
            .collect()
    }

    /// A fully ruled grid with the given column and row boundaries.
    pub fn grid(xs: &[f32], ys: &[f32]) -> Vec<Edge> {
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (top, bottom) = (ys[0], ys[ys.len() - 1]);
        let mut edges: Vec<Edge> = ys.iter().map(|&y| Edge::horizontal(y, left, right)).collect();
        edges.extend(xs.iter().map(|&x| Edge::vertical(x, top, bottom)));
        edges
    }
}
