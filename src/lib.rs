#[cfg(feature = "gui")]
pub mod app;
pub mod batch;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ingest;
pub mod input;
pub mod inspector;
pub mod logging;
pub mod mirror;
pub mod notification;
pub mod raster;
pub mod removal;
pub mod state;
pub mod storage;
pub mod viewport;

use std::path::PathBuf;

pub use error::{AppError, AppResult};

use cli::{Cli, Mode};

/// Entrypoint used by higher-level integrations and CLI bindings.
pub fn run(cli: Cli) -> AppResult<()> {
    logging::init();
    tracing::info!("starting cutout");

    match cli.into_mode() {
        Mode::Remove(request) => {
            let config = config::load_app_config();
            let report = batch::run(&request, &config)?;
            tracing::info!(
                removed = report.removed,
                width = report.width,
                height = report.height,
                "headless removal complete"
            );
            println!("{}", report.output.display());
        }
        Mode::Inspect { image } => run_inspector(image)?,
    }

    tracing::info!("shutdown complete");
    Ok(())
}

#[cfg(feature = "gui")]
fn run_inspector(image: Option<PathBuf>) -> AppResult<()> {
    let exit_code = app::run(image);
    if exit_code != gtk4::glib::ExitCode::SUCCESS {
        tracing::warn!(?exit_code, "gtk runtime exited with failure");
    }
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn run_inspector(_image: Option<PathBuf>) -> AppResult<()> {
    Err(AppError::GuiUnavailable)
}
