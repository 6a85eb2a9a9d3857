//! Window-less background removal of a single file.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::raster::RasterImage;
use crate::removal::{plan_removal, BackgroundRemover, CommandRemover, RemovalPlan, RemovalSettings};
use crate::storage::{write_rgba_png, OutputStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub input: PathBuf,
    /// Explicit result path; `None` saves into the output directory.
    pub output: Option<PathBuf>,
    pub force: bool,
}

#[derive(Debug)]
pub enum Destination {
    File(PathBuf),
    Store(OutputStore),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// `false` when the input already had transparency and was kept as is.
    pub removed: bool,
}

pub fn remove_file(
    input: &Path,
    settings: RemovalSettings,
    remover: &dyn BackgroundRemover,
    destination: &Destination,
) -> AppResult<BatchReport> {
    let source = RasterImage::decode_path(input)?;
    tracing::info!(
        path = %input.display(),
        width = source.width(),
        height = source.height(),
        "loaded image for headless removal"
    );

    let (result, removed) = match plan_removal(&source, settings) {
        RemovalPlan::Skip(image) => {
            tracing::info!("input already transparent; saving without removal");
            (image, false)
        }
        RemovalPlan::Submit(image) => (remover.remove_background(&image)?, true),
    };

    let output = match destination {
        Destination::File(path) => {
            write_rgba_png(path, &result)?;
            path.clone()
        }
        Destination::Store(store) => store.save_result(&result)?,
    };
    let (width, height) = result.dimensions();
    Ok(BatchReport {
        output,
        width,
        height,
        removed,
    })
}

/// Runs one request with the configured removal command and output directory.
pub fn run(request: &BatchRequest, config: &AppConfig) -> AppResult<BatchReport> {
    let mut settings = config.removal_settings();
    settings.force |= request.force;
    let remover = CommandRemover::new(config.removal_command())?;
    let destination = match &request.output {
        Some(path) => Destination::File(path.clone()),
        None => Destination::Store(OutputStore::with_default_paths(config.output_dir.clone())?),
    };
    remove_file(&request.input, settings, &remover, &destination)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::AppError;
    use crate::raster::{solid_rgb, solid_rgba};
    use crate::removal::{RemovalError, RemovalResult};

    struct Refuses;

    impl BackgroundRemover for Refuses {
        fn remove_background(&self, _image: &RasterImage) -> RemovalResult<RasterImage> {
            Err(RemovalError::Unavailable {
                reason: "not expected in this test".to_string(),
            })
        }
    }

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cutout-batch-{label}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_input(dir: &Path, image: &RasterImage) -> PathBuf {
        let path = dir.join("input.png");
        fs::write(&path, image.encode_png().unwrap()).unwrap();
        path
    }

    fn copy_remover(dir: &Path) -> CommandRemover {
        let argv = ["cp", "{input}", "{output}"].map(str::to_string).to_vec();
        CommandRemover::with_temp_dir(argv, dir.join("scratch")).unwrap()
    }

    #[test]
    fn bounds_input_runs_command_and_writes_rgba_png() {
        let dir = scratch_dir("command");
        let input = write_input(&dir, &solid_rgb(400, 200, [9, 8, 7]));
        let output = dir.join("nested").join("result.png");
        let settings = RemovalSettings {
            max_edge: 100,
            force: false,
        };

        let report = remove_file(
            &input,
            settings,
            &copy_remover(&dir),
            &Destination::File(output.clone()),
        )
        .unwrap();

        assert!(report.removed);
        assert_eq!(report.output, output);
        assert_eq!((report.width, report.height), (100, 50));
        let saved = RasterImage::decode_path(&output).unwrap();
        assert_eq!(saved.dimensions(), (100, 50));
        assert!(saved.has_alpha());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn transparent_input_is_saved_without_calling_remover() {
        let dir = scratch_dir("skip");
        let input = write_input(&dir, &solid_rgba(12, 10, [1, 2, 3, 40]));
        let store = OutputStore::with_paths(dir.clone(), dir.join("out"));

        let report = remove_file(
            &input,
            RemovalSettings::default(),
            &Refuses,
            &Destination::Store(store),
        )
        .unwrap();

        assert!(!report.removed);
        assert!(report.output.starts_with(dir.join("out")));
        let name = report.output.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("no_background_"), "unexpected name {name}");
        assert_eq!(RasterImage::decode_path(&report.output).unwrap().min_alpha(), 40);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn force_sends_transparent_input_to_remover() {
        let dir = scratch_dir("force");
        let input = write_input(&dir, &solid_rgba(4, 4, [0, 0, 0, 0]));
        let err = remove_file(
            &input,
            RemovalSettings {
                force: true,
                ..RemovalSettings::default()
            },
            &Refuses,
            &Destination::File(dir.join("never.png")),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Removal(RemovalError::Unavailable { .. })));
        assert!(!dir.join("never.png").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_input_fails_with_decode_error() {
        let dir = scratch_dir("decode");
        let input = dir.join("notes.txt");
        fs::write(&input, b"not an image").unwrap();
        let err = remove_file(
            &input,
            RemovalSettings::default(),
            &Refuses,
            &Destination::File(dir.join("out.png")),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn run_uses_configured_command_and_force_flag() {
        let dir = scratch_dir("run");
        let input = write_input(&dir, &solid_rgba(6, 6, [5, 5, 5, 0]));
        let config = AppConfig {
            removal_command: Some(
                ["cp", "{input}", "{output}"].map(str::to_string).to_vec(),
            ),
            ..AppConfig::default()
        };
        let request = BatchRequest {
            input,
            output: Some(dir.join("result.png")),
            force: true,
        };

        let report = run(&request, &config).unwrap();
        assert!(report.removed);
        assert!(dir.join("result.png").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
