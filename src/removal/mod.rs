//! Boundary to the external background-removal model.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::raster::{DecodeError, EncodeError, RasterImage};
use crate::storage::{default_runtime_temp_dir, TEMP_FILE_PREFIX};

pub const DEFAULT_REMOVAL_MAX_EDGE: u32 = 1280;
pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn default_removal_command() -> Vec<String> {
    ["rembg", "i", INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER]
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Error)]
pub enum RemovalError {
    #[error("removal command is empty")]
    EmptyCommand,
    #[error("removal command must reference both {{input}} and {{output}}")]
    MissingPlaceholder,
    #[error("failed to stage removal file {path}")]
    TempFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to run removal command: {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with non-zero status: {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("removal output could not be decoded: {0}")]
    Decode(#[from] DecodeError),
    #[error("background removal unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("removal worker stopped without delivering a result")]
    WorkerDisconnected,
}

pub type RemovalResult<T> = std::result::Result<T, RemovalError>;

/// Opaque image-to-image transform whose result is expected to carry alpha.
pub trait BackgroundRemover: Send + Sync {
    fn remove_background(&self, image: &RasterImage) -> RemovalResult<RasterImage>;
}

/// Runs an external program that reads one image file and writes another.
#[derive(Debug, Clone)]
pub struct CommandRemover {
    argv: Vec<String>,
    temp_dir: PathBuf,
}

impl CommandRemover {
    pub fn new(argv: Vec<String>) -> RemovalResult<Self> {
        Self::with_temp_dir(argv, default_runtime_temp_dir())
    }

    pub fn with_temp_dir(argv: Vec<String>, temp_dir: PathBuf) -> RemovalResult<Self> {
        if argv.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(RemovalError::EmptyCommand);
        }
        let mentions = |placeholder: &str| argv.iter().any(|arg| arg.contains(placeholder));
        if !mentions(INPUT_PLACEHOLDER) || !mentions(OUTPUT_PLACEHOLDER) {
            return Err(RemovalError::MissingPlaceholder);
        }
        Ok(Self { argv, temp_dir })
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    fn scratch_paths(&self) -> (PathBuf, PathBuf) {
        let id = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let stem = format!("{TEMP_FILE_PREFIX}{}_{id}", std::process::id());
        (
            self.temp_dir.join(format!("{stem}_in.png")),
            self.temp_dir.join(format!("{stem}_out.png")),
        )
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.argv[1..]
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    fn run(&self, input: &Path, output: &Path, image: &RasterImage) -> RemovalResult<RasterImage> {
        fs::create_dir_all(&self.temp_dir).map_err(|source| RemovalError::TempFile {
            path: self.temp_dir.clone(),
            source,
        })?;
        fs::write(input, image.encode_png()?).map_err(|source| RemovalError::TempFile {
            path: input.to_path_buf(),
            source,
        })?;

        let program = self.program().to_string();
        let started = Instant::now();
        let result = Command::new(&program)
            .args(self.expand_args(input, output))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RemovalError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !result.status.success() {
            return Err(RemovalError::Failed {
                program,
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        tracing::debug!(
            %program,
            elapsed_ms = started.elapsed().as_millis(),
            "removal command finished"
        );
        Ok(RasterImage::decode_path(output)?)
    }
}

impl BackgroundRemover for CommandRemover {
    fn remove_background(&self, image: &RasterImage) -> RemovalResult<RasterImage> {
        let (input, output) = self.scratch_paths();
        let result = self.run(&input, &output, image);
        for path in [&input, &output] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), ?err, "failed to remove scratch file");
                }
            }
        }
        result
    }
}

/// Shrink-only copy handed to the remover.
pub fn prepare_for_removal(image: &RasterImage, max_edge: u32) -> RasterImage {
    image.bounded(max_edge)
}

/// Images that already carry transparency are treated as processed.
pub fn needs_removal(image: &RasterImage, force: bool) -> bool {
    force || !image.has_alpha() || image.min_alpha() == u8::MAX
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalSettings {
    pub max_edge: u32,
    pub force: bool,
}

impl Default for RemovalSettings {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_REMOVAL_MAX_EDGE,
            force: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemovalPlan {
    /// Already transparent; becomes the result without an external call.
    Skip(RasterImage),
    Submit(RasterImage),
}

pub fn plan_removal(source: &RasterImage, settings: RemovalSettings) -> RemovalPlan {
    let prepared = prepare_for_removal(source, settings.max_edge);
    if needs_removal(&prepared, settings.force) {
        RemovalPlan::Submit(prepared)
    } else {
        RemovalPlan::Skip(prepared)
    }
}

/// A removal running on a worker thread; poll with [`RemovalJob::try_take`].
#[derive(Debug)]
pub struct RemovalJob {
    rx: mpsc::Receiver<RemovalResult<RasterImage>>,
    started: Instant,
}

impl RemovalJob {
    pub fn spawn(remover: Arc<dyn BackgroundRemover>, image: RasterImage) -> Self {
        let (tx, rx) = mpsc::channel();
        tracing::info!(
            width = image.width(),
            height = image.height(),
            "background removal submitted"
        );
        std::thread::spawn(move || {
            let result = remover.remove_background(&image);
            let _ = tx.send(result);
        });
        Self {
            rx,
            started: Instant::now(),
        }
    }

    /// `None` while the worker is still running.
    pub fn try_take(&self) -> Option<RemovalResult<RasterImage>> {
        match self.rx.try_recv() {
            Ok(result) => {
                tracing::info!(
                    elapsed_ms = self.started.elapsed().as_millis(),
                    ok = result.is_ok(),
                    "background removal finished"
                );
                Some(result)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(RemovalError::WorkerDisconnected)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{solid_rgb, solid_rgba};

    struct InvertAlpha;

    impl BackgroundRemover for InvertAlpha {
        fn remove_background(&self, image: &RasterImage) -> RemovalResult<RasterImage> {
            let mut rgba = image.to_rgba8();
            for pixel in rgba.pixels_mut() {
                pixel.0[3] = 0;
            }
            Ok(RasterImage::from_dynamic(image::DynamicImage::ImageRgba8(rgba))?)
        }
    }

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cutout-removal-{label}-{}", std::process::id()))
    }

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| (*part).to_string()).collect()
    }

    #[test]
    fn prepare_for_removal_bounds_long_edge() {
        let prepared = prepare_for_removal(&solid_rgb(1000, 3000, [0, 0, 0]), 1280);
        assert_eq!(prepared.dimensions(), (427, 1280));
        let small = prepare_for_removal(&solid_rgb(640, 480, [0, 0, 0]), 1280);
        assert_eq!(small.dimensions(), (640, 480));
    }

    #[test]
    fn needs_removal_skips_images_with_transparency() {
        assert!(needs_removal(&solid_rgb(2, 2, [1, 1, 1]), false));
        assert!(needs_removal(&solid_rgba(2, 2, [1, 1, 1, 255]), false));
        assert!(!needs_removal(&solid_rgba(2, 2, [1, 1, 1, 254]), false));
        assert!(needs_removal(&solid_rgba(2, 2, [1, 1, 1, 0]), true));
    }

    #[test]
    fn plan_removal_returns_prepared_copy() {
        let settings = RemovalSettings {
            max_edge: 100,
            force: false,
        };
        match plan_removal(&solid_rgba(400, 200, [0, 0, 0, 10]), settings) {
            RemovalPlan::Skip(image) => assert_eq!(image.dimensions(), (100, 50)),
            other => panic!("expected skip, got {other:?}"),
        }
        assert!(matches!(
            plan_removal(&solid_rgb(10, 10, [0, 0, 0]), settings),
            RemovalPlan::Submit(_)
        ));
    }

    #[test]
    fn command_remover_validates_argv() {
        assert!(matches!(
            CommandRemover::new(Vec::new()),
            Err(RemovalError::EmptyCommand)
        ));
        assert!(matches!(
            CommandRemover::new(argv(&["rembg", "i", "{input}"])),
            Err(RemovalError::MissingPlaceholder)
        ));
        let remover = CommandRemover::new(default_removal_command()).unwrap();
        assert_eq!(remover.program(), "rembg");
    }

    #[test]
    fn command_remover_substitutes_placeholders() {
        let remover =
            CommandRemover::new(argv(&["tool", "--in={input}", "{output}"])).unwrap();
        let args = remover.expand_args(Path::new("/tmp/a.png"), Path::new("/tmp/b.png"));
        assert_eq!(args, argv(&["--in=/tmp/a.png", "/tmp/b.png"]));
    }

    #[test]
    fn command_remover_round_trips_through_external_program_and_cleans_up() {
        let dir = scratch_dir("copy");
        let remover =
            CommandRemover::with_temp_dir(argv(&["cp", "{input}", "{output}"]), dir.clone())
                .unwrap();
        let result = remover
            .remove_background(&solid_rgb(6, 4, [3, 4, 5]))
            .unwrap();
        assert_eq!(result.dimensions(), (6, 4));
        let leftovers = fs::read_dir(&dir).map(|entries| entries.count()).unwrap_or(0);
        assert_eq!(leftovers, 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn command_remover_reports_failing_program() {
        let dir = scratch_dir("fail");
        let remover = CommandRemover::with_temp_dir(
            argv(&["sh", "-c", "echo nope >&2; exit 3", "{input}", "{output}"]),
            dir.clone(),
        )
        .unwrap();
        let err = remover
            .remove_background(&solid_rgb(2, 2, [0, 0, 0]))
            .unwrap_err();
        match err {
            RemovalError::Failed { stderr, .. } => assert_eq!(stderr, "nope"),
            other => panic!("unexpected error: {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn command_remover_reports_missing_program() {
        let remover = CommandRemover::with_temp_dir(
            argv(&["cutout-no-such-remover", "{input}", "{output}"]),
            scratch_dir("missing"),
        )
        .unwrap();
        let err = remover
            .remove_background(&solid_rgb(2, 2, [0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, RemovalError::Spawn { .. }));
        let _ = fs::remove_dir_all(scratch_dir("missing"));
    }

    #[test]
    fn removal_job_delivers_result_from_worker() {
        let job = RemovalJob::spawn(Arc::new(InvertAlpha), solid_rgb(3, 3, [9, 9, 9]));
        let deadline = Instant::now() + std::time::Duration::from_secs(10);
        let result = loop {
            if let Some(result) = job.try_take() {
                break result.unwrap();
            }
            assert!(Instant::now() < deadline, "worker did not report back");
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert!(result.has_alpha());
        assert_eq!(result.min_alpha(), 0);
    }
}
