#![windows_subsystem = "windows"]
#![allow(dead_code)] // API surface kept for future workflow tooling

#[macro_use]
pub mod logger;
mod app;
mod brush;
mod cache;
mod canvas;
mod cli;
mod io;
mod journal;
mod navigator;
mod pairs;
mod prefs;
mod session;
mod transform;
mod watcher;

use clap::Parser;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let args = cli::CliArgs::parse();

    // Input folder: --input flag, or the native picker.
    let root = match args.input.or_else(|| {
        rfd::FileDialog::new()
            .set_title("Select input folder with FULL and PARTIAL")
            .pick_folder()
    }) {
        Some(folder) => folder,
        None => return Ok(()), // picker cancelled
    };

    let pairs = match pairs::list_image_pairs(&root) {
        Ok(pairs) => pairs,
        Err(e) => {
            startup_error(&e);
            return Ok(());
        }
    };
    if pairs.is_empty() {
        startup_error("No matching FULL/PARTIAL image pairs were found.");
        return Ok(());
    }
    log_info!("Found {} pairs under {}", pairs.len(), root.display());

    let navigator = match navigator::PairNavigator::new(root, pairs) {
        Ok(navigator) => navigator,
        Err(e) => {
            startup_error(&e);
            return Ok(());
        }
    };
    let editor_path = prefs::load_editor_path();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1600.0, 980.0])
            .with_title("PairPrep"),
        ..Default::default()
    };
    eframe::run_native(
        "PairPrep",
        options,
        Box::new(move |cc| Box::new(app::PairPrepApp::new(cc, navigator, editor_path))),
    )
}

/// Pre-GUI failures surface as a native message box (there is no egui
/// context to draw into yet).
fn startup_error(message: &str) {
    log_err!("{}", message);
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("PairPrep")
        .set_description(message)
        .show();
}
