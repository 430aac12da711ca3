//! Application entry point for the layered grid viewer.
//!
//! This binary sets up logging, loads the optional config and catalog files,
//! and delegates all interactive logic and rendering to [`Viewer`].

mod settings;
mod viewer;

use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// Log verbosity follows `RUST_LOG` and defaults to `info`.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = settings::load_config();
    let catalog = settings::load_catalog();
    let date_seed = settings::date_seed(chrono::Local::now().date_naive());
    info!(units = catalog.len(), date_seed, "starting deepgrid");

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Deep Grid",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(config, catalog, date_seed)))),
    )
}
