// Pdfium access: binding, page text and ruling geometry, page rendering
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::tables::{Edge, PageContent, PathStep, TextChar};
use crate::types::{BBox, PickerError, Result, POINTS_PER_INCH};

/// Filled shapes no thicker than this (points) count as ruling lines.
const RULE_THICKNESS: f32 = 2.0;

/// Path runs this close to axis-aligned count as straight.
const AXIS_TOLERANCE: f32 = 0.5;

// Each Pdfium instance initialises pdfium's global state and tears it down
// on drop, so two instances must never be alive at once.
static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

fn pdfium_guard() -> MutexGuard<'static, ()> {
    // A panic inside an earlier operation leaves nothing to repair
    PDFIUM_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Binds pdfium for one operation. Operations from the worker and the UI
/// thread run one at a time.
pub fn with_pdfium<F, R>(lib_path: &Path, f: F) -> Result<R>
where
    F: FnOnce(&Pdfium) -> Result<R>,
{
    let _guard = pdfium_guard();

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| PickerError::Pdf(format!("cannot load pdfium from {}: {e}", lib_path.display())))?;

    let pdfium = Pdfium::new(bindings);
    f(&pdfium)
}

/// Looks up a zero-based page, mapping an out-of-range index to
/// [`PickerError::PageOutOfRange`].
pub fn get_page<'a>(document: &PdfDocument<'a>, page: usize) -> Result<PdfPage<'a>> {
    let total = document.pages().len() as usize;
    if page >= total {
        return Err(PickerError::PageOutOfRange { page, total });
    }
    let index = u16::try_from(page).map_err(|_| PickerError::PageOutOfRange { page, total })?;
    Ok(document.pages().get(index)?)
}

/// Characters and ruling edges of one page, in top-left points.
pub fn load_page_content(page: &PdfPage) -> Result<PageContent> {
    let width = page.width().value;
    let height = page.height().value;

    let mut chars = Vec::new();
    let text = page.text()?;
    for char_info in text.chars().iter() {
        let Some(ch) = char_info.unicode_char() else {
            continue;
        };
        if let Ok(bounds) = char_info.loose_bounds() {
            chars.push(TextChar::new(ch, flip(&bounds, height)));
        }
    }

    let mut edges = Vec::new();
    for object in page.objects().iter() {
        let Some(path) = object.as_path_object() else {
            continue;
        };

        let path_edges = Edge::from_path(&path_steps(path, height), AXIS_TOLERANCE);
        if !path_edges.is_empty() {
            edges.extend(path_edges);
            continue;
        }

        // Bars painted without usable segments
        match object.bounds() {
            Ok(quad) => edges.extend(Edge::from_thin_shape(&flip(&quad.to_rect(), height), RULE_THICKNESS)),
            Err(e) => warn!("Skipping path object without bounds: {e}"),
        }
    }

    debug!("Page content: {} chars, {} edges", chars.len(), edges.len());
    Ok(PageContent { width, height, chars, edges })
}

/// Renders a page at `dpi`, returning RGBA pixels.
pub fn render_page(page: &PdfPage, dpi: f32) -> Result<RgbaImage> {
    let target_width = ((page.width().value * dpi / POINTS_PER_INCH).round() as i32).max(1);
    let config = PdfRenderConfig::new()
        .set_target_width(target_width)
        .render_form_data(true)
        .render_annotations(true)
        .set_format(PdfBitmapFormat::BGRA);

    let bitmap = page.render_with_config(&config)?;
    let width = bitmap.width().max(0) as u32;
    let height = bitmap.height().max(0) as u32;
    bgra_to_rgba(&bitmap.as_raw_bytes(), width, height)
}

/// Converts a BGRA buffer (rows possibly padded) to an RGBA image.
pub fn bgra_to_rgba(src: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
    let stride = if height == 0 { 0 } else { src.len() / height as usize };
    if stride < width as usize * 4 {
        return Err(PickerError::Pdf(format!(
            "bitmap buffer too small: {} bytes for {width}x{height}",
            src.len()
        )));
    }

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height as usize {
        let row = &src[y * stride..y * stride + width as usize * 4];
        for px in row.chunks_exact(4) {
            pixels.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| PickerError::Pdf("rendered bitmap has inconsistent size".to_string()))
}

/// Segments of a path object in top-left page points.
fn path_steps(path: &PdfPagePathObject, page_height: f32) -> Vec<PathStep> {
    let mut steps = Vec::new();
    for segment in path.segments().iter() {
        let (x, y) = segment.point();
        let (x, y) = (x.value, page_height - y.value);
        steps.push(match segment.segment_type() {
            PdfPathSegmentType::MoveTo => PathStep::MoveTo(x, y),
            PdfPathSegmentType::LineTo => PathStep::LineTo(x, y),
            _ => PathStep::CurveTo(x, y),
        });
        if segment.is_close() {
            steps.push(PathStep::Close);
        }
    }
    steps
}

// PDF space has its origin bottom-left
fn flip(rect: &PdfRect, page_height: f32) -> BBox {
    BBox::new(
        rect.left().value,
        page_height - rect.top().value,
        rect.right().value,
        page_height - rect.bottom().value,
    )
}
