// Ruled-table detection: edges -> intersections -> cells -> tables
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::trace;

use super::words::text_within;
use super::{sort_reading_order, Edge, Orientation, PageContent, TableFinder, TableSettings};
use crate::types::{BBox, ExtractedTable};

pub struct LinesFinder {
    settings: TableSettings,
}

impl LinesFinder {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }
}

impl TableFinder for LinesFinder {
    fn find_tables(&self, page: &PageContent) -> Vec<ExtractedTable> {
        let edges = merge_edges(&page.edges, &self.settings);
        let intersections = find_intersections(&edges, self.settings.intersection_tolerance);
        let cells = intersections_to_cells(&intersections);
        let groups = cells_to_tables(&cells);
        trace!(
            "lines finder: {} edges, {} intersections, {} cells, {} groups",
            edges.len(),
            intersections.len(),
            cells.len(),
            groups.len()
        );

        let mut tables: Vec<ExtractedTable> = groups
            .into_iter()
            .map(|group| build_table(&group, page))
            .collect();
        sort_reading_order(&mut tables);
        tables
    }
}

/// Drops short edges, snaps near-collinear ones together and joins the
/// pieces of broken lines.
pub(crate) fn merge_edges(edges: &[Edge], settings: &TableSettings) -> Vec<Edge> {
    let long: Vec<Edge> = edges
        .iter()
        .copied()
        .filter(|e| e.length() >= settings.edge_min_length)
        .collect();

    let mut merged = Vec::new();
    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        let mut group: Vec<Edge> = long.iter().copied().filter(|e| e.orientation == orientation).collect();
        snap(&mut group, settings.snap_tolerance);
        merged.extend(join(group, settings.join_tolerance));
    }
    merged
}

// Position of an edge across its direction (y for horizontal, x for vertical)
fn offset(edge: &Edge) -> f32 {
    match edge.orientation {
        Orientation::Horizontal => edge.y0,
        Orientation::Vertical => edge.x0,
    }
}

fn set_offset(edge: &mut Edge, value: f32) {
    match edge.orientation {
        Orientation::Horizontal => {
            edge.y0 = value;
            edge.y1 = value;
        }
        Orientation::Vertical => {
            edge.x0 = value;
            edge.x1 = value;
        }
    }
}

// Start and end along the edge's direction
fn span(edge: &Edge) -> (f32, f32) {
    match edge.orientation {
        Orientation::Horizontal => (edge.x0, edge.x1),
        Orientation::Vertical => (edge.y0, edge.y1),
    }
}

fn snap(edges: &mut [Edge], tolerance: f32) {
    edges.sort_by(|a, b| offset(a).total_cmp(&offset(b)));

    let mut start = 0;
    while start < edges.len() {
        let mut end = start + 1;
        while end < edges.len() && offset(&edges[end]) - offset(&edges[end - 1]) <= tolerance {
            end += 1;
        }
        let cluster = &mut edges[start..end];
        let mean = cluster.iter().map(offset).sum::<f32>() / cluster.len() as f32;
        for edge in cluster.iter_mut() {
            set_offset(edge, mean);
        }
        start = end;
    }
}

fn join(mut edges: Vec<Edge>, tolerance: f32) -> Vec<Edge> {
    edges.sort_by(|a, b| {
        offset(a)
            .total_cmp(&offset(b))
            .then(span(a).0.total_cmp(&span(b).0))
    });

    let mut joined: Vec<Edge> = Vec::new();
    for edge in edges {
        if let Some(last) = joined.last_mut() {
            if offset(last) == offset(&edge) && span(&edge).0 <= span(last).1 + tolerance {
                let end = span(last).1.max(span(&edge).1);
                match last.orientation {
                    Orientation::Horizontal => last.x1 = end,
                    Orientation::Vertical => last.y1 = end,
                }
                continue;
            }
        }
        joined.push(edge);
    }
    joined
}

#[derive(Debug, Clone)]
pub(crate) struct Intersection {
    pub x: f32,
    pub y: f32,
    horizontal: BTreeSet<usize>,
    vertical: BTreeSet<usize>,
}

fn point_key(x: f32, y: f32) -> (u32, u32) {
    (x.to_bits(), y.to_bits())
}

/// Crossing points of horizontal and vertical edges, sorted top-to-bottom
/// then left-to-right. Each point remembers which edges pass through it.
pub(crate) fn find_intersections(edges: &[Edge], tolerance: f32) -> Vec<Intersection> {
    let mut points: HashMap<(u32, u32), Intersection> = HashMap::new();

    for (vi, v) in edges.iter().enumerate().filter(|(_, e)| e.orientation == Orientation::Vertical) {
        for (hi, h) in edges.iter().enumerate().filter(|(_, e)| e.orientation == Orientation::Horizontal) {
            let crosses = v.x0 >= h.x0 - tolerance
                && v.x0 <= h.x1 + tolerance
                && h.y0 >= v.y0 - tolerance
                && h.y0 <= v.y1 + tolerance;
            if !crosses {
                continue;
            }
            let point = points.entry(point_key(v.x0, h.y0)).or_insert_with(|| Intersection {
                x: v.x0,
                y: h.y0,
                horizontal: BTreeSet::new(),
                vertical: BTreeSet::new(),
            });
            point.horizontal.insert(hi);
            point.vertical.insert(vi);
        }
    }

    let mut sorted: Vec<Intersection> = points.into_values().collect();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    sorted
}

fn share_edge(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> bool {
    a.intersection(b).next().is_some()
}

/// Smallest rectangles whose four corners are intersections connected by edges.
pub(crate) fn intersections_to_cells(points: &[Intersection]) -> Vec<BBox> {
    let lookup: HashMap<(u32, u32), &Intersection> =
        points.iter().map(|p| (point_key(p.x, p.y), p)).collect();

    let mut cells = Vec::new();
    for (i, top_left) in points.iter().enumerate() {
        let rest = &points[i + 1..];
        let below = rest.iter().filter(|p| p.x == top_left.x);
        let right: Vec<&Intersection> = rest.iter().filter(|p| p.y == top_left.y).collect();

        'search: for bottom_left in below {
            if !share_edge(&top_left.vertical, &bottom_left.vertical) {
                continue;
            }
            for top_right in &right {
                if !share_edge(&top_left.horizontal, &top_right.horizontal) {
                    continue;
                }
                let Some(bottom_right) = lookup.get(&point_key(top_right.x, bottom_left.y)) else {
                    continue;
                };
                if share_edge(&bottom_right.horizontal, &bottom_left.horizontal)
                    && share_edge(&bottom_right.vertical, &top_right.vertical)
                {
                    cells.push(BBox::new(top_left.x, top_left.y, top_right.x, bottom_left.y));
                    break 'search;
                }
            }
        }
    }
    cells
}

/// Groups cells that share a corner. Groups of a single cell are not tables.
pub(crate) fn cells_to_tables(cells: &[BBox]) -> Vec<Vec<BBox>> {
    let mut parent: Vec<usize> = (0..cells.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut corner_owner: HashMap<(u32, u32), usize> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let corners = [(cell.x0, cell.y0), (cell.x1, cell.y0), (cell.x0, cell.y1), (cell.x1, cell.y1)];
        for (x, y) in corners {
            match corner_owner.get(&point_key(x, y)) {
                Some(&other) => {
                    let (a, b) = (find(&mut parent, i), find(&mut parent, other));
                    if a != b {
                        parent[b] = a;
                    }
                }
                None => {
                    corner_owner.insert(point_key(x, y), i);
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<BBox>> = BTreeMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(*cell);
    }
    groups.into_values().filter(|g| g.len() > 1).collect()
}

fn distinct(values: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut values: Vec<f32> = values.collect();
    values.sort_by(f32::total_cmp);
    values.dedup();
    values
}

/// Lays cells out on the grid of distinct cell tops and lefts; grid slots
/// not covered by a cell's top-left corner are `None`.
fn build_table(cells: &[BBox], page: &PageContent) -> ExtractedTable {
    let bbox = cells
        .iter()
        .skip(1)
        .fold(cells[0], |acc, cell| acc.union(cell));

    let columns = distinct(cells.iter().map(|c| c.x0));
    let tops = distinct(cells.iter().map(|c| c.y0));

    let rows = tops
        .iter()
        .map(|&y| {
            columns
                .iter()
                .map(|&x| {
                    cells
                        .iter()
                        .find(|c| c.x0 == x && c.y0 == y)
                        .map(|c| text_within(&page.chars, c))
                })
                .collect()
        })
        .collect();

    ExtractedTable::new(rows, bbox)
}
