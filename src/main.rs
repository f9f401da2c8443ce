use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tablepicker::app::TablePickerApp;
use tablepicker::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Select tables in PDF files and export them to Excel")]
struct Args {
    /// Folder of PDF files to open on start
    folder: Option<PathBuf>,

    /// Configuration file (defaults to ./tablepicker.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preview resolution
    #[arg(long)]
    dpi: Option<f32>,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tablepicker=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load_or_default(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(dpi) = args.dpi {
        config.render.dpi = dpi;
        config.validate()?;
    }
    info!("pdfium library path: {}", config.pdfium_library_path().display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([config.window.width, config.window.height]),
        ..Default::default()
    };

    let title = config.window.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Box::new(TablePickerApp::new(cc, config, args.folder))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))
}
