// Page preview: rendered page on a white bordered canvas
use image::{imageops, Rgba, RgbaImage};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use crate::config::RenderConfig;
use crate::pdf::{get_page, render_page, with_pdfium};
use crate::types::Result;

/// Renders one page and pads it with `render.border` white pixels. The
/// border is a whole number of pixels (checked by `AppConfig::validate`), so
/// the overlay transform uses the same offset as the padding.
pub fn render_preview(
    lib_path: &Path,
    pdf_path: &Path,
    page: usize,
    render: &RenderConfig,
) -> Result<RgbaImage> {
    let start = Instant::now();

    let preview = with_pdfium(lib_path, |pdfium| {
        let document = pdfium.load_pdf_from_file(pdf_path, None)?;
        let pdf_page = get_page(&document, page)?;
        let rendered = render_page(&pdf_page, render.dpi)?;
        Ok(add_border(&rendered, border_pixels(render.border)))
    })?;

    debug!("Rendered page {} of {} in {:?}", page + 1, pdf_path.display(), start.elapsed());
    Ok(preview)
}

fn border_pixels(border: f32) -> u32 {
    border.max(0.0) as u32
}

/// Pastes `image` onto an opaque white canvas `border` pixels larger on
/// every side.
pub fn add_border(image: &RgbaImage, border: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        image.width() + 2 * border,
        image.height() + 2 * border,
        Rgba([255, 255, 255, 255]),
    );
    imageops::overlay(&mut canvas, image, i64::from(border), i64::from(border));
    canvas
}
