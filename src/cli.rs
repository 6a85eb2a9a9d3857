use std::path::PathBuf;

use clap::Parser;

use crate::batch::BatchRequest;

#[derive(Debug, Parser)]
#[command(name = "cutout", about = "Inspect and remove image backgrounds")]
#[command(version)]
pub struct Cli {
    /// Image to open in the source pane
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,

    /// Remove the background of FILE and exit without opening a window
    #[arg(long, value_name = "FILE", conflicts_with = "image")]
    pub remove: Option<PathBuf>,

    /// Where to write the result (defaults to the configured output directory)
    #[arg(short, long, value_name = "FILE", requires = "remove")]
    pub output: Option<PathBuf>,

    /// Run removal even when the image already has transparency
    #[arg(long, requires = "remove")]
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Inspect { image: Option<PathBuf> },
    Remove(BatchRequest),
}

impl Cli {
    pub fn into_mode(self) -> Mode {
        match self.remove {
            Some(input) => Mode::Remove(BatchRequest {
                input,
                output: self.output,
                force: self.force,
            }),
            None => Mode::Inspect { image: self.image },
        }
    }
}
