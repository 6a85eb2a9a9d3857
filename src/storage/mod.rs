use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::raster::{EncodeError, RasterImage};

pub(crate) const TEMP_FILE_PREFIX: &str = "cutout_";
const OUTPUT_FILE_PREFIX: &str = "no_background_";
const PICTURES_SUBDIR: &str = "Pictures";
const OUTPUT_SUBDIR: &str = "cutout";
const DEFAULT_FALLBACK_TEMP_DIR: &str = "/tmp/cutout";
const FILE_MANAGER_COMMAND: &str = "xdg-open";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("failed to launch {command} for {path}")]
    Reveal {
        command: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Default, Clone)]
pub struct PruneReport {
    pub removed_files: usize,
}

/// Where processed images are persisted and scratch files are staged.
#[derive(Debug, Clone)]
pub struct OutputStore {
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl OutputStore {
    pub const fn with_paths(temp_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            temp_dir,
            output_dir,
        }
    }

    /// Uses `output_dir` when configured, else `$HOME/Pictures/cutout`.
    pub fn with_default_paths(output_dir: Option<PathBuf>) -> StorageResult<Self> {
        let output_dir = match output_dir {
            Some(dir) => dir,
            None => {
                let home = std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;
                let mut dir = PathBuf::from(home);
                dir.push(PICTURES_SUBDIR);
                dir.push(OUTPUT_SUBDIR);
                dir
            }
        };
        Ok(Self::with_paths(default_runtime_temp_dir(), output_dir))
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_path_at(&self, unix_millis: u128) -> PathBuf {
        self.output_dir
            .join(format!("{OUTPUT_FILE_PREFIX}{unix_millis}.png"))
    }

    fn allocate_output_path(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis();
        let path = self.output_path_at(millis);
        if !path.exists() {
            return path;
        }
        (1..)
            .map(|suffix| {
                self.output_dir
                    .join(format!("{OUTPUT_FILE_PREFIX}{millis}_{suffix}.png"))
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(path)
    }

    /// Writes `image` as an RGBA PNG and returns its path.
    pub fn save_result(&self, image: &RasterImage) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.allocate_output_path();
        write_rgba_png(&path, image)?;
        Ok(path)
    }

    pub fn prune_stale_temp_files(&self, max_age_hours: u64) -> StorageResult<PruneReport> {
        let now = SystemTime::now();
        let mut report = PruneReport::default();
        let max_age = Duration::from_secs(max_age_hours.saturating_mul(60 * 60));

        if !self.temp_dir.exists() {
            return Ok(report);
        }

        for entry in fs::read_dir(&self.temp_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path
                .file_name()
                .and_then(|name| name.to_str())
                .is_none_or(|name| !name.starts_with(TEMP_FILE_PREFIX))
            {
                continue;
            }

            let modified = fs::metadata(&path)?.modified()?;
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= max_age {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => report.removed_files += 1,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        ?err,
                        "failed to remove stale removal scratch file"
                    );
                }
            }
        }

        Ok(report)
    }
}

/// Writes `image` to `path` as an RGBA PNG, creating missing parent directories.
pub fn write_rgba_png(path: &Path, image: &RasterImage) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, image.encode_rgba_png()?)?;
    tracing::info!(path = %path.display(), "saved processed image");
    Ok(())
}

pub(crate) fn default_runtime_temp_dir() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_FALLBACK_TEMP_DIR))
}

fn reveal_target(path: &Path) -> &Path {
    if path.is_dir() {
        return path;
    }
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(path)
}

/// Spawns `command` and reaps it on a helper thread so it never lingers as a
/// zombie. The handle yields the exit status once the child is gone.
fn spawn_reaped(mut command: Command) -> io::Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(std::thread::spawn(move || match child.wait() {
        Ok(status) => {
            if !status.success() {
                tracing::warn!(?status, "file manager launcher exited with failure");
            }
            Some(status)
        }
        Err(err) => {
            tracing::warn!(?err, "failed to wait for file manager launcher");
            None
        }
    }))
}

/// Opens the directory containing `path` in the desktop file manager.
pub fn reveal_in_file_manager(path: &Path) -> StorageResult<()> {
    let target = reveal_target(path);
    let mut command = Command::new(FILE_MANAGER_COMMAND);
    command.arg(target);
    spawn_reaped(command).map_err(|source| StorageError::Reveal {
        command: FILE_MANAGER_COMMAND,
        path: target.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %target.display(), "revealed output in file manager");
    Ok(())
}
