// PDF points -> canvas pixels, and click hit-testing against drawn tables
use crate::types::{BBox, POINTS_PER_INCH};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl ScreenRect {
    /// Inclusive on every edge.
    pub fn contains(&self, p: ScreenPoint) -> bool {
        self.x0 <= p.x && p.x <= self.x1 && self.y0 <= p.y && p.y <= self.y1
    }

    /// Top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [ScreenPoint; 4] {
        [
            ScreenPoint::new(self.x0, self.y0),
            ScreenPoint::new(self.x1, self.y0),
            ScreenPoint::new(self.x1, self.y1),
            ScreenPoint::new(self.x0, self.y1),
        ]
    }
}

/// The affine map shared by drawing and hit-testing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PageTransform {
    pub scale: f32,
    pub border: f32,
}

impl PageTransform {
    pub fn new(dpi: f32, border: f32) -> Self {
        Self {
            scale: dpi / POINTS_PER_INCH,
            border,
        }
    }

    pub fn to_screen(&self, bbox: &BBox) -> ScreenRect {
        ScreenRect {
            x0: bbox.x0 * self.scale + self.border,
            y0: bbox.y0 * self.scale + self.border,
            x1: bbox.x1 * self.scale + self.border,
            y1: bbox.y1 * self.scale + self.border,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HitTarget {
    Handle(usize),
    Body,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Hit {
    pub index: usize,
    pub target: HitTarget,
}

/// Handles win over rectangle bodies; within each pass the lowest table
/// index wins.
pub fn hit_test(
    transform: &PageTransform,
    bboxes: &[BBox],
    click: ScreenPoint,
    handle_radius: f32,
) -> Option<Hit> {
    let rects: Vec<ScreenRect> = bboxes.iter().map(|b| transform.to_screen(b)).collect();
    let r2 = handle_radius * handle_radius;

    for (index, rect) in rects.iter().enumerate() {
        for (corner, c) in rect.corners().iter().enumerate() {
            let (dx, dy) = (click.x - c.x, click.y - c.y);
            if dx * dx + dy * dy <= r2 {
                return Some(Hit { index, target: HitTarget::Handle(corner) });
            }
        }
    }

    rects
        .iter()
        .position(|rect| rect.contains(click))
        .map(|index| Hit { index, target: HitTarget::Body })
}
