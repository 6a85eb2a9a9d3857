use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{load_app_config, AppConfig};
use crate::raster::RasterImage;
use crate::removal::{BackgroundRemover, CommandRemover, RemovalError, RemovalResult};
use crate::storage::OutputStore;

const STALE_TEMP_MAX_AGE_HOURS: u64 = 24;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct StartupConfig {
    /// Image named on the command line, preloaded into the source pane.
    pub(super) image_path: Option<PathBuf>,
}

/// Stand-in used when the configured command is unusable, so the failure
/// surfaces on first use instead of at startup.
struct UnavailableRemover(String);

impl BackgroundRemover for UnavailableRemover {
    fn remove_background(&self, _image: &RasterImage) -> RemovalResult<RasterImage> {
        Err(RemovalError::Unavailable {
            reason: self.0.clone(),
        })
    }
}

pub(super) struct AppBootstrap {
    pub(super) startup_config: StartupConfig,
    pub(super) app_config: AppConfig,
    pub(super) output_store: Option<OutputStore>,
    pub(super) remover: Arc<dyn BackgroundRemover>,
}

pub(super) fn bootstrap_app_runtime(startup_config: StartupConfig) -> AppBootstrap {
    let app_config = load_app_config();
    tracing::info!(
        zoom_modifier = ?app_config.zoom_modifier,
        mirror_views = app_config.mirror_views(),
        removal_command = ?app_config.removal_command(),
        "loaded app config"
    );

    let output_store = initialize_output_store(&app_config);
    let remover: Arc<dyn BackgroundRemover> =
        match CommandRemover::new(app_config.removal_command()) {
            Ok(remover) => Arc::new(remover),
            Err(err) => {
                tracing::warn!(%err, "invalid removal command in config");
                Arc::new(UnavailableRemover(err.to_string()))
            }
        };

    AppBootstrap {
        startup_config,
        app_config,
        output_store,
        remover,
    }
}

fn initialize_output_store(config: &AppConfig) -> Option<OutputStore> {
    let store = match OutputStore::with_default_paths(config.output_dir.clone()) {
        Ok(store) => store,
        Err(err) => {
            tracing::warn!(%err, "output storage unavailable; results will not be saved");
            return None;
        }
    };
    match store.prune_stale_temp_files(STALE_TEMP_MAX_AGE_HOURS) {
        Ok(report) if report.removed_files > 0 => {
            tracing::info!(removed = report.removed_files, "pruned stale removal scratch files");
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(%err, "failed to prune stale removal scratch files"),
    }
    Some(store)
}
