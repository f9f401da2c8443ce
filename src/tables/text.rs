// Unruled-table detection from text alignment
use super::words::{group_words, Word};
use super::{sort_reading_order, PageContent, TableFinder, TableSettings};
use crate::types::ExtractedTable;

pub struct TextFinder {
    settings: TableSettings,
}

impl TextFinder {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    /// Cluster words into rows by vertical centre.
    fn cluster_rows(&self, words: Vec<Word>) -> Vec<Vec<Word>> {
        let mut rows: Vec<Vec<Word>> = Vec::new();

        for word in words {
            let (_, cy) = word.bbox.center();
            let found = rows.iter().position(|row| {
                row.first()
                    .map(|first| (first.bbox.center().1 - cy).abs() <= self.settings.row_tolerance)
                    .unwrap_or(false)
            });
            match found {
                Some(i) => rows[i].push(word),
                None => rows.push(vec![word]),
            }
        }

        for row in &mut rows {
            row.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        }
        rows.sort_by(|a, b| {
            let ay = a.first().map(|w| w.bbox.y0).unwrap_or(0.0);
            let by = b.first().map(|w| w.bbox.y0).unwrap_or(0.0);
            ay.total_cmp(&by)
        });
        rows
    }

    /// Runs of consecutive rows with a similar number of words.
    fn find_regions(&self, rows: Vec<Vec<Word>>) -> Vec<Vec<Vec<Word>>> {
        let mut regions = Vec::new();
        let mut current: Vec<Vec<Word>> = Vec::new();
        let mut expected_cols: Option<usize> = None;

        for row in rows {
            let count = row.len();

            if count < self.settings.min_cols {
                if current.len() >= self.settings.min_rows {
                    regions.push(std::mem::take(&mut current));
                }
                current.clear();
                expected_cols = None;
                continue;
            }

            match expected_cols {
                Some(expected) if count.abs_diff(expected) <= 1 => current.push(row),
                _ => {
                    if current.len() >= self.settings.min_rows {
                        regions.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(row);
                    expected_cols = Some(count);
                }
            }
        }

        if current.len() >= self.settings.min_rows {
            regions.push(current);
        }
        regions
    }

    fn column_boundaries(&self, region: &[Vec<Word>]) -> Vec<f32> {
        let mut lefts: Vec<f32> = region.iter().flat_map(|row| row.iter().map(|w| w.bbox.x0)).collect();
        lefts.sort_by(f32::total_cmp);

        let Some(&first) = lefts.first() else {
            return Vec::new();
        };

        let mut boundaries = vec![first];
        for &x in &lefts[1..] {
            if let Some(&last) = boundaries.last() {
                if x - last > self.settings.col_tolerance {
                    boundaries.push(x);
                }
            }
        }

        let right = region
            .iter()
            .flat_map(|row| row.iter().map(|w| w.bbox.x1))
            .fold(f32::MIN, f32::max);
        boundaries.push(right);
        boundaries
    }

    fn build_table(&self, region: &[Vec<Word>]) -> Option<ExtractedTable> {
        let boundaries = self.column_boundaries(region);
        let num_cols = boundaries.len().saturating_sub(1);
        if num_cols < self.settings.min_cols {
            return None;
        }

        let rows = region
            .iter()
            .map(|row| {
                let mut cells = vec![String::new(); num_cols];
                for word in row {
                    let col = column_index(word.bbox.center().0, &boundaries);
                    if cells[col].is_empty() {
                        cells[col] = word.text.clone();
                    } else {
                        cells[col].push(' ');
                        cells[col].push_str(&word.text);
                    }
                }
                cells.into_iter().map(Some).collect()
            })
            .collect();

        let bbox = region
            .iter()
            .flatten()
            .map(|w| w.bbox)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default();

        Some(ExtractedTable::new(rows, bbox))
    }
}

impl TableFinder for TextFinder {
    fn find_tables(&self, page: &PageContent) -> Vec<ExtractedTable> {
        let words = group_words(&page.chars);
        if words.len() < self.settings.min_rows * self.settings.min_cols {
            return Vec::new();
        }

        let rows = self.cluster_rows(words);
        let mut tables: Vec<ExtractedTable> = self
            .find_regions(rows)
            .iter()
            .filter_map(|region| self.build_table(region))
            .collect();
        sort_reading_order(&mut tables);
        tables
    }
}

fn column_index(center_x: f32, boundaries: &[f32]) -> usize {
    boundaries
        .windows(2)
        .position(|w| center_x >= w[0] && center_x < w[1])
        .unwrap_or_else(|| {
            if boundaries.first().map(|&b| center_x < b).unwrap_or(false) {
                0
            } else {
                boundaries.len().saturating_sub(2)
            }
        })
}
