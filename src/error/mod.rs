use crate::clipboard::ClipboardError;
use crate::config::ConfigPathError;
use crate::ingest::{EmptySourceError, IngestError};
use crate::raster::DecodeError;
use crate::removal::RemovalError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    EmptySource(#[from] EmptySourceError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Removal(#[from] RemovalError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    ConfigPath(#[from] ConfigPathError),
    #[error("built without the gui feature; use --remove <FILE>")]
    GuiUnavailable,
}
