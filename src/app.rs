// Windowed UI: file list, page preview with table overlays, export actions
use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::export::{export_all, export_selected, ExportOutcome};
use crate::extract::{ExtractionJob, ExtractionOutcome, ExtractionWorker};
use crate::folder::{scan_folder, PdfList};
use crate::geometry::{hit_test, PageTransform, ScreenPoint};
use crate::preview::render_preview;
use crate::selection::Selection;
use crate::types::{Controls, ExtractedTable, TableCache, TableKey};

const RECT_STROKE: f32 = 5.0;
const HANDLE_STROKE: f32 = 2.0;
const UNSELECTED: egui::Color32 = egui::Color32::RED;
const SELECTED: egui::Color32 = egui::Color32::BLUE;
const HANDLE_UNSELECTED: egui::Color32 = egui::Color32::from_rgb(255, 165, 0);
const HANDLE_SELECTED: egui::Color32 = egui::Color32::from_rgb(0, 128, 0);

/// The page currently on the canvas.
struct ShownPage {
    texture: egui::TextureHandle,
    size: egui::Vec2,
}

struct Dialog {
    title: String,
    message: String,
}

pub struct TablePickerApp {
    config: AppConfig,
    lib_path: PathBuf,
    transform: PageTransform,

    pdfs: PdfList,
    filter_text: String,
    highlighted: Option<usize>,
    selected_pdf: Option<String>,

    current_page: usize,
    cache: TableCache,
    selection: Selection,
    shown: Option<ShownPage>,

    status_message: String,
    loading: bool,
    generation: u64,
    extraction_rx: Option<Receiver<ExtractionOutcome>>,
    folder_rx: Option<Receiver<Option<PathBuf>>>,
    dialog: Option<Dialog>,
}

impl TablePickerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, initial_folder: Option<PathBuf>) -> Self {
        let mut app = Self::with_config(config);
        if let Some(folder) = initial_folder {
            app.load_folder(folder);
        }
        app
    }

    pub fn with_config(config: AppConfig) -> Self {
        let lib_path = config.pdfium_library_path();
        let transform = PageTransform::new(config.render.dpi, config.render.border);
        Self {
            config,
            lib_path,
            transform,
            pdfs: PdfList::default(),
            filter_text: String::new(),
            highlighted: None,
            selected_pdf: None,
            current_page: 0,
            cache: TableCache::default(),
            selection: Selection::new(),
            shown: None,
            status_message: "Select a folder with PDF files.".to_string(),
            loading: false,
            generation: 0,
            extraction_rx: None,
            folder_rx: None,
            dialog: None,
        }
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    fn total_pages(&self) -> usize {
        self.cache.total_pages
    }

    /// Tables drawn on the canvas; none when the page failed to render.
    fn tables_on_page(&self) -> &[ExtractedTable] {
        if self.shown.is_some() {
            self.cache.page(self.current_page)
        } else {
            &[]
        }
    }

    pub fn controls(&self) -> Controls {
        // A load also locks the folder picker: switching folders would orphan
        // the running worker
        if self.dialog.is_some() || self.loading {
            return Controls::empty();
        }

        let mut controls = Controls::FILE_LIST | Controls::FILTER | Controls::EXIT | Controls::PICK_FOLDER;
        let total = self.total_pages();
        if total > 1 && self.current_page > 0 {
            controls |= Controls::PREV_PAGE;
        }
        if total > 1 && self.current_page + 1 < total {
            controls |= Controls::NEXT_PAGE;
        }
        if !self.tables_on_page().is_empty() {
            controls |= Controls::SELECT_ALL;
        }
        if !self.selection.is_empty() {
            controls |= Controls::EXPORT_SELECTED;
        }
        if !self.cache.is_empty() {
            controls |= Controls::EXPORT_ALL;
        }
        controls
    }

    pub fn page_label(&self) -> String {
        let total = self.total_pages();
        if total == 0 {
            "Page 0/1".to_string()
        } else {
            format!("Page {}/{}", self.current_page + 1, total)
        }
    }

    // ---- folder ----

    fn open_folder_dialog(&mut self, ctx: &egui::Context) {
        if self.folder_rx.is_some() {
            debug!("Folder dialog already open");
            return;
        }

        let ctx = ctx.clone();
        let (tx, rx) = mpsc::channel();
        self.folder_rx = Some(rx);

        std::thread::spawn(move || {
            let folder = rfd::FileDialog::new()
                .set_title("Select Folder with PDF files")
                .pick_folder();
            let _ = tx.send(folder);
            ctx.request_repaint();
        });
    }

    /// Applies a picked folder. A pick that arrives while a document is
    /// loading waits in the channel until the load has finished.
    fn process_folder_dialog(&mut self) {
        if self.loading {
            return;
        }
        let Some(rx) = &self.folder_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Some(folder)) => {
                self.folder_rx = None;
                self.load_folder(folder);
            }
            Ok(None) => {
                debug!("Folder selection cancelled");
                self.folder_rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.folder_rx = None,
        }
    }

    pub fn load_folder(&mut self, folder: PathBuf) {
        match scan_folder(&folder) {
            Ok(names) => {
                info!("Found {} PDF files in {}", names.len(), folder.display());
                self.pdfs.load(folder, names);
                self.filter_text.clear();
                self.highlighted = None;
                self.clear_document();
                self.status_message = format!("Found {} PDF files.", self.pdfs.all().len());
            }
            Err(e) => {
                warn!("Cannot read folder {}: {e}", folder.display());
                self.status_message = format!("Failed to read folder: {e}");
            }
        }
    }

    pub fn set_filter(&mut self, text: &str) {
        self.filter_text = text.to_string();
        self.pdfs.apply_filter(text);
        self.highlighted = if self.pdfs.is_empty() { None } else { Some(0) };
    }

    /// Forgets the loaded document. Any outcome still in flight no longer
    /// matches the generation and is dropped.
    fn clear_document(&mut self) {
        self.selected_pdf = None;
        self.current_page = 0;
        self.cache = TableCache::default();
        self.selection.clear();
        self.shown = None;
        self.loading = false;
        self.generation += 1;
        self.extraction_rx = None;
    }

    // ---- document ----

    fn select_pdf(&mut self, ctx: &egui::Context, name: String) {
        self.clear_document();
        self.loading = true;
        self.status_message = "Loading tables, please wait...".to_string();

        let job = ExtractionJob {
            generation: self.generation,
            pdf_path: self.pdfs.path_of(&name),
            pdf_name: name.clone(),
            lib_path: self.lib_path.clone(),
            settings: self.config.tables.clone(),
        };
        self.selected_pdf = Some(name);

        let ctx = ctx.clone();
        self.extraction_rx = Some(ExtractionWorker::spawn(job, move || ctx.request_repaint()));
    }

    fn process_extraction(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.extraction_rx else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.extraction_rx = None;
                self.loading = false;
                self.status_message = "Failed to read tables: worker stopped".to_string();
                return;
            }
        };
        self.extraction_rx = None;
        self.finish_extraction(outcome, Some(ctx));
    }

    /// Applies a worker outcome. Outcomes from superseded loads are dropped.
    fn finish_extraction(&mut self, outcome: ExtractionOutcome, ctx: Option<&egui::Context>) {
        if outcome.generation != self.generation {
            debug!("Ignoring stale extraction of {}", outcome.pdf_name);
            return;
        }
        self.loading = false;

        match outcome.result {
            Ok(cache) => {
                info!("{}: {} table(s) on {} page(s)", outcome.pdf_name, cache.table_count(), cache.total_pages);
                self.cache = cache;
                self.selection.retain_cached(&self.cache);
                if let Some(ctx) = ctx {
                    self.show_page(ctx, 0);
                }
            }
            Err(e) => {
                self.cache = TableCache::default();
                self.status_message = format!("Failed to read tables: {e}");
            }
        }
    }

    fn show_page(&mut self, ctx: &egui::Context, page: usize) {
        let Some(name) = self.selected_pdf.clone() else {
            return;
        };
        self.current_page = page;
        self.shown = None;

        let path = self.pdfs.path_of(&name);
        match render_preview(&self.lib_path, &path, page, &self.config.render) {
            Ok(image) => {
                let size = [image.width() as usize, image.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                let texture = ctx.load_texture(format!("page_{page}"), color_image, Default::default());
                self.shown = Some(ShownPage {
                    texture,
                    size: egui::vec2(size[0] as f32, size[1] as f32),
                });
                self.status_message = format!(
                    "Previewing: {name}, page {}/{}. Click handles or inside rectangles to select.",
                    page + 1,
                    self.total_pages()
                );
            }
            Err(e) => {
                warn!("Preview of {name} page {} failed: {e}", page + 1);
                self.status_message = format!("Preview failed: {e}");
            }
        }
    }

    /// Loads the highlighted entry of the filtered list, if any.
    fn load_highlighted(&mut self, ctx: &egui::Context) {
        if let Some(name) = self.highlighted.and_then(|i| self.pdfs.get(i)).map(str::to_string) {
            self.select_pdf(ctx, name);
        }
    }

    fn change_page(&mut self, ctx: &egui::Context, delta: i32) {
        if self.selected_pdf.is_none() || self.total_pages() == 0 {
            return;
        }
        let new_page = (self.current_page as i32 + delta).clamp(0, self.total_pages() as i32 - 1) as usize;
        if new_page != self.current_page {
            self.show_page(ctx, new_page);
        }
    }

    // ---- selection ----

    /// Toggles the table under a click given in canvas coordinates.
    pub fn click_canvas(&mut self, point: ScreenPoint) {
        let bboxes: Vec<_> = self.tables_on_page().iter().map(|t| t.bbox).collect();
        if bboxes.is_empty() {
            return;
        }

        if let Some(hit) = hit_test(&self.transform, &bboxes, point, self.config.render.handle_radius) {
            let key = TableKey::new(self.current_page, hit.index);
            if self.selection.toggle(key, bboxes.len()) {
                debug!("Toggled table {} on page {} via {:?}", hit.index + 1, self.current_page + 1, hit.target);
                self.status_message = self.selection.status_text();
            }
        }
    }

    pub fn select_all(&mut self) {
        let count = self.tables_on_page().len();
        self.selection.select_all_on_page(self.current_page, count);
        self.status_message = format!("All {} tables on this page selected.", self.selection.len());
    }

    // ---- export ----

    fn export(&mut self, all: bool) {
        let Some(name) = self.selected_pdf.as_deref() else {
            return;
        };
        let pdf_path = self.pdfs.path_of(name);

        let result = if all {
            export_all(&pdf_path, &self.cache)
        } else {
            export_selected(&pdf_path, &self.cache, &self.selection)
        };

        match result {
            Ok(outcome) => self.show_export_outcome(outcome),
            Err(e) => {
                warn!("Export failed: {e}");
                self.status_message = format!("Export failed: {e}");
                self.dialog = Some(Dialog {
                    title: "Export Failed".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn show_export_outcome(&mut self, outcome: ExportOutcome) {
        if let Some(status) = outcome.status() {
            self.status_message = status;
        }
        let (title, message) = outcome.dialog();
        self.dialog = Some(Dialog { title, message });
    }

    // ---- drawing ----

    fn draw_file_list(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, controls: Controls) {
        ui.horizontal(|ui| {
            let response = ui.add_enabled(
                controls.contains(Controls::FILTER),
                egui::TextEdit::singleline(&mut self.filter_text).hint_text("Filter"),
            );
            if response.changed() {
                let text = self.filter_text.clone();
                self.set_filter(&text);
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                self.load_highlighted(ctx);
            }

            if ui
                .add_enabled(controls.contains(Controls::PICK_FOLDER), egui::Button::new("Select PDF Folder"))
                .clicked()
            {
                self.open_folder_dialog(ctx);
            }
        });

        ui.separator();

        let mut clicked = None;
        egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
            for (index, name) in self.pdfs.visible().iter().enumerate() {
                let is_current = self.highlighted == Some(index);
                let label = egui::SelectableLabel::new(is_current, name.as_str());
                if ui.add_enabled(controls.contains(Controls::FILE_LIST), label).clicked() {
                    clicked = Some(index);
                }
            }
        });

        if let Some(index) = clicked {
            self.highlighted = Some(index);
            if let Some(name) = self.pdfs.get(index).map(str::to_string) {
                self.select_pdf(ctx, name);
            }
        }
    }

    fn draw_canvas(&mut self, ui: &mut egui::Ui, controls: Controls) {
        let Some(shown) = &self.shown else {
            return;
        };
        let texture_id = shown.texture.id();
        let size = shown.size;

        let mut click = None;
        egui::ScrollArea::both()
            .max_width(self.config.render.max_canvas_width)
            .max_height(self.config.render.max_canvas_height)
            .show(ui, |ui| {
                let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
                let painter = ui.painter_at(rect);
                painter.image(
                    texture_id,
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );

                for (index, table) in self.tables_on_page().iter().enumerate() {
                    let selected = self.selection.contains(&TableKey::new(self.current_page, index));
                    let screen = self.transform.to_screen(&table.bbox);
                    let outline = egui::Rect::from_min_max(
                        rect.min + egui::vec2(screen.x0, screen.y0),
                        rect.min + egui::vec2(screen.x1, screen.y1),
                    );
                    let color = if selected { SELECTED } else { UNSELECTED };
                    painter.rect_stroke(outline, 0.0, egui::Stroke::new(RECT_STROKE, color));

                    let handle = if selected { HANDLE_SELECTED } else { HANDLE_UNSELECTED };
                    for corner in screen.corners() {
                        painter.circle(
                            rect.min + egui::vec2(corner.x, corner.y),
                            self.config.render.handle_radius,
                            handle,
                            egui::Stroke::new(HANDLE_STROKE, egui::Color32::BLACK),
                        );
                    }
                }

                if response.clicked() {
                    click = response.interact_pointer_pos().map(|pos| pos - rect.min);
                }
            });

        // Clicks are ignored while controls are locked
        if let Some(offset) = click {
            if controls.contains(Controls::FILE_LIST) {
                self.click_canvas(ScreenPoint::new(offset.x, offset.y));
            }
        }
    }

    fn draw_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.dialog else {
            return;
        };

        let mut close = false;
        egui::Window::new(dialog.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(dialog.message.as_str());
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });

        if close {
            self.dialog = None;
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context, controls: Controls) {
        let typing = ctx.memory(|m| m.focus().is_some());
        let (left, right, open) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.modifiers.command && i.key_pressed(egui::Key::O),
            )
        });

        if open && controls.contains(Controls::PICK_FOLDER) {
            self.open_folder_dialog(ctx);
        }
        if typing {
            return;
        }
        if left && controls.contains(Controls::PREV_PAGE) {
            self.change_page(ctx, -1);
        }
        if right && controls.contains(Controls::NEXT_PAGE) {
            self.change_page(ctx, 1);
        }
    }
}

impl TablePickerApp {
    /// Lays out one frame. Returns the area of the page and table controls.
    fn show_panels(&mut self, ctx: &egui::Context) -> egui::Rect {
        self.process_folder_dialog();
        self.process_extraction(ctx);

        let controls = self.controls();
        self.handle_keys(ctx, controls);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_message.as_str());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let exit = ui.add_enabled(controls.contains(Controls::EXIT), egui::Button::new("Exit"));
                    if exit.clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Laid out before the canvas so a tall page cannot push them off screen
        let page_controls = egui::TopBottomPanel::bottom("page_controls")
            .show(ctx, |ui| self.draw_page_controls(ui, ctx, controls))
            .response
            .rect;

        egui::SidePanel::left("pdf_files")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| self.draw_file_list(ui, ctx, controls));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_canvas(ui, controls));

        self.draw_dialog(ctx);
        page_controls
    }

    fn draw_page_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, controls: Controls) {
        ui.horizontal(|ui| {
            let prev = ui.add_enabled(controls.contains(Controls::PREV_PAGE), egui::Button::new("<< Prev"));
            if prev.clicked() {
                self.change_page(ctx, -1);
            }
            ui.label(self.page_label());
            let next = ui.add_enabled(controls.contains(Controls::NEXT_PAGE), egui::Button::new("Next >>"));
            if next.clicked() {
                self.change_page(ctx, 1);
            }
        });

        ui.horizontal(|ui| {
            let select_all =
                ui.add_enabled(controls.contains(Controls::SELECT_ALL), egui::Button::new("Select All Tables"));
            if select_all.clicked() {
                self.select_all();
            }
            let export_selected = ui.add_enabled(
                controls.contains(Controls::EXPORT_SELECTED),
                egui::Button::new("Export Selected Tables"),
            );
            if export_selected.clicked() {
                self.export(false);
            }
            let export_all =
                ui.add_enabled(controls.contains(Controls::EXPORT_ALL), egui::Button::new("Export All Tables"));
            if export_all.clicked() {
                self.export(true);
            }
        });
    }
}

impl eframe::App for TablePickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show_panels(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BBox;
    use std::fs;

    fn table(x0: f32, y0: f32, x1: f32, y1: f32) -> ExtractedTable {
        ExtractedTable::new(vec![vec![Some("v".to_string())]], BBox::new(x0, y0, x1, y1))
    }

    /// An app showing page 0 of a two-page document with two tables on it.
    fn loaded_app() -> TablePickerApp {
        let mut app = TablePickerApp::with_config(AppConfig::default());
        let mut cache = TableCache::new(2);
        cache.insert_page(0, vec![table(72.0, 72.0, 144.0, 144.0), table(72.0, 288.0, 216.0, 360.0)]);
        cache.insert_page(1, vec![]);

        app.selected_pdf = Some("doc.pdf".to_string());
        app.generation = 3;
        let outcome = ExtractionOutcome {
            generation: app.generation,
            pdf_name: "doc.pdf".to_string(),
            result: Ok(cache),
        };
        app.finish_extraction(outcome, None);

        let ctx = egui::Context::default();
        let image = egui::ColorImage::new([4, 4], egui::Color32::WHITE);
        let texture = ctx.load_texture("test", image, Default::default());
        app.shown = Some(ShownPage { texture, size: egui::vec2(4.0, 4.0) });
        app
    }

    #[test]
    fn test_initial_controls_and_label() {
        let app = TablePickerApp::with_config(AppConfig::default());
        assert_eq!(app.page_label(), "Page 0/1");
        let controls = app.controls();
        assert!(controls.contains(Controls::PICK_FOLDER | Controls::EXIT));
        assert!(!controls.intersects(Controls::PREV_PAGE | Controls::NEXT_PAGE | Controls::EXPORT_ALL));
    }

    #[test]
    fn test_loading_locks_every_control() {
        let mut app = TablePickerApp::with_config(AppConfig::default());
        app.loading = true;
        assert_eq!(app.controls(), Controls::empty());
    }

    #[test]
    fn test_folder_picked_during_load_waits_for_it() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("next.pdf"), b"").unwrap();

        let mut app = TablePickerApp::with_config(AppConfig::default());
        let (tx, rx) = mpsc::channel();
        tx.send(Some(dir.path().to_path_buf())).unwrap();
        app.folder_rx = Some(rx);
        app.loading = true;

        app.process_folder_dialog();
        assert!(app.pdfs.all().is_empty());
        assert!(app.folder_rx.is_some());

        app.loading = false;
        app.process_folder_dialog();
        assert_eq!(app.pdfs.all().len(), 1);
        assert!(app.folder_rx.is_none());
    }

    #[test]
    fn test_loaded_document_controls() {
        let app = loaded_app();
        assert_eq!(app.page_label(), "Page 1/2");
        let controls = app.controls();
        assert!(controls.contains(Controls::NEXT_PAGE | Controls::SELECT_ALL | Controls::EXPORT_ALL));
        assert!(!controls.contains(Controls::PREV_PAGE));
        assert!(!controls.contains(Controls::EXPORT_SELECTED));
    }

    #[test]
    fn test_click_inside_rectangle_toggles_that_table() {
        let mut app = loaded_app();
        let rect = app.transform.to_screen(&app.cache.page(0)[1].bbox);
        let (cx, cy) = ((rect.x0 + rect.x1) / 2.0, (rect.y0 + rect.y1) / 2.0);

        app.click_canvas(ScreenPoint::new(cx, cy));
        assert!(app.selection.contains(&TableKey::new(0, 1)));
        assert_eq!(app.status_message(), "1 table(s) selected. Export or select more.");
        assert!(app.controls().contains(Controls::EXPORT_SELECTED));

        app.click_canvas(ScreenPoint::new(cx, cy));
        assert!(app.selection.is_empty());
        assert_eq!(app.status_message(), "Click handles or inside rectangles to select.");
    }

    #[test]
    fn test_click_on_empty_area_changes_nothing() {
        let mut app = loaded_app();
        let before = app.status_message().to_string();
        app.click_canvas(ScreenPoint::new(5.0, 5.0));
        assert!(app.selection.is_empty());
        assert_eq!(app.status_message(), before);
    }

    #[test]
    fn test_select_all_status() {
        let mut app = loaded_app();
        app.select_all();
        assert_eq!(app.selection.len(), 2);
        assert_eq!(app.status_message(), "All 2 tables on this page selected.");
    }

    #[test]
    fn test_failed_preview_hides_tables() {
        let mut app = loaded_app();
        app.shown = None;
        assert!(!app.controls().contains(Controls::SELECT_ALL));
        app.click_canvas(ScreenPoint::new(300.0, 300.0));
        assert!(app.selection.is_empty());
    }

    #[test]
    fn test_stale_outcome_is_ignored() {
        let mut app = loaded_app();
        let stale = ExtractionOutcome {
            generation: app.generation - 1,
            pdf_name: "old.pdf".to_string(),
            result: Err("boom".to_string()),
        };
        app.finish_extraction(stale, None);
        assert_eq!(app.cache.table_count(), 2);
    }

    #[test]
    fn test_failed_extraction_reports_status() {
        let mut app = TablePickerApp::with_config(AppConfig::default());
        app.loading = true;
        let outcome = ExtractionOutcome {
            generation: app.generation,
            pdf_name: "bad.pdf".to_string(),
            result: Err("not a PDF".to_string()),
        };
        app.finish_extraction(outcome, None);
        assert!(!app.loading);
        assert_eq!(app.status_message(), "Failed to read tables: not a PDF");
        assert!(!app.controls().contains(Controls::EXPORT_ALL));
    }

    #[test]
    fn test_load_folder_resets_state() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"").unwrap();
        fs::write(dir.path().join("A.PDF"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let mut app = loaded_app();
        app.selection.select_all_on_page(0, 2);
        app.set_filter("zzz");
        app.load_folder(dir.path().to_path_buf());

        assert_eq!(app.status_message(), "Found 2 PDF files.");
        assert_eq!(app.pdfs.visible().len(), 2);
        assert!(app.filter_text.is_empty());
        assert!(app.selection.is_empty());
        assert!(app.selected_pdf.is_none());
        assert_eq!(app.page_label(), "Page 0/1");
    }

    #[test]
    fn test_filter_highlights_first_match() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Annual.pdf", "budget.pdf", "annex.pdf"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let mut app = TablePickerApp::with_config(AppConfig::default());
        app.load_folder(dir.path().to_path_buf());

        app.set_filter("ANN");
        assert_eq!(app.pdfs.visible(), ["Annual.pdf", "annex.pdf"]);
        assert_eq!(app.highlighted, Some(0));

        app.set_filter("missing");
        assert_eq!(app.highlighted, None);
    }

    #[test]
    fn test_paging_keeps_selection_and_clamps() {
        // No pdfium here: each preview fails, but the page still moves
        let ctx = egui::Context::default();
        let mut app = loaded_app();
        app.selection.toggle(TableKey::new(0, 1), 2);

        app.change_page(&ctx, -1);
        assert_eq!(app.page_label(), "Page 1/2");

        app.change_page(&ctx, 1);
        assert_eq!(app.page_label(), "Page 2/2");
        assert!(app.selection.contains(&TableKey::new(0, 1)));
        let controls = app.controls();
        assert!(controls.contains(Controls::PREV_PAGE | Controls::EXPORT_SELECTED));
        assert!(!controls.contains(Controls::NEXT_PAGE));

        app.change_page(&ctx, 1);
        assert_eq!(app.page_label(), "Page 2/2");

        app.change_page(&ctx, -1);
        assert_eq!(app.page_label(), "Page 1/2");
        assert!(app.selection.contains(&TableKey::new(0, 1)));
        assert_eq!(app.selection.len(), 1);
    }

    #[test]
    fn test_enter_loads_highlighted_entry() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["annual.pdf", "budget.pdf"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let ctx = egui::Context::default();
        let mut app = TablePickerApp::with_config(AppConfig::default());
        app.load_folder(dir.path().to_path_buf());

        app.set_filter("zzz");
        app.load_highlighted(&ctx);
        assert!(app.selected_pdf.is_none());
        assert!(!app.loading);

        app.set_filter("BUD");
        app.load_highlighted(&ctx);
        assert_eq!(app.selected_pdf.as_deref(), Some("budget.pdf"));
        assert!(app.loading);
        assert_eq!(app.status_message(), "Loading tables, please wait...");
        assert_eq!(app.controls(), Controls::empty());
    }

    #[test]
    fn test_page_controls_stay_on_screen_for_tall_pages() {
        let mut app = loaded_app();
        if let Some(shown) = app.shown.as_mut() {
            // Letter page at 200 dpi with the default border
            shown.size = egui::vec2(1820.0, 2320.0);
        }

        let ctx = egui::Context::default();
        let screen = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1500.0, 1100.0));
        let mut controls_rect = egui::Rect::NOTHING;
        // Panels settle their height on the second frame
        for _ in 0..3 {
            let input = egui::RawInput { screen_rect: Some(screen), ..Default::default() };
            let _ = ctx.run(input, |ctx| controls_rect = app.show_panels(ctx));
        }

        assert!(screen.contains_rect(controls_rect), "controls at {controls_rect:?}");
        assert!(controls_rect.height() > 0.0);
    }
}
