use std::io::{self, Write};
use std::process::{Command, Stdio};

use thiserror::Error;

const WL_COPY_COMMAND: &str = "wl-copy";
const WL_PASTE_COMMAND: &str = "wl-paste";
const MIME_IMAGE_PNG: &str = "image/png";
const MIME_IMAGE_PREFIX: &str = "image/";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to run clipboard command: {command}")]
    CommandIo {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with non-zero status: {status}")]
    CommandFailed { command: String, status: String },
    #[error("clipboard offered {mime} but returned no data")]
    EmptyPayload { mime: String },
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

/// Encoded image bytes together with the MIME type they were offered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ClipboardImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            mime: MIME_IMAGE_PNG.to_string(),
            bytes,
        }
    }
}

/// Access to a shared system clipboard. `read_image` returns `Ok(None)` when the
/// clipboard holds no image.
pub trait ClipboardAccess {
    fn read_image(&self) -> ClipboardResult<Option<ClipboardImage>>;
    fn write_image(&self, image: &ClipboardImage) -> ClipboardResult<()>;
}

#[derive(Debug, Default)]
pub struct WlClipboard;

/// Picks PNG when offered, otherwise the first `image/*` type.
fn preferred_image_mime(types: &str) -> Option<String> {
    let offered = types
        .lines()
        .map(str::trim)
        .filter(|mime| mime.starts_with(MIME_IMAGE_PREFIX))
        .collect::<Vec<_>>();
    offered
        .iter()
        .find(|mime| **mime == MIME_IMAGE_PNG)
        .or_else(|| offered.first())
        .map(|mime| (*mime).to_string())
}

fn run_wl_paste(args: &[&str]) -> ClipboardResult<Option<Vec<u8>>> {
    let output = Command::new(WL_PASTE_COMMAND)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| ClipboardError::CommandIo {
            command: WL_PASTE_COMMAND.to_string(),
            source,
        })?;
    // wl-paste exits non-zero when nothing is copied.
    if !output.status.success() {
        tracing::debug!(status = %output.status, "wl-paste reported an empty clipboard");
        return Ok(None);
    }
    Ok(Some(output.stdout))
}

impl ClipboardAccess for WlClipboard {
    fn read_image(&self) -> ClipboardResult<Option<ClipboardImage>> {
        let Some(types) = run_wl_paste(&["--list-types"])? else {
            return Ok(None);
        };
        let Some(mime) = preferred_image_mime(&String::from_utf8_lossy(&types)) else {
            return Ok(None);
        };
        let bytes = run_wl_paste(&["--no-newline", "--type", &mime])?.unwrap_or_default();
        if bytes.is_empty() {
            return Err(ClipboardError::EmptyPayload { mime });
        }
        Ok(Some(ClipboardImage { mime, bytes }))
    }

    fn write_image(&self, image: &ClipboardImage) -> ClipboardResult<()> {
        let mut child = Command::new(WL_COPY_COMMAND)
            .args(["--type", image.mime.as_str()])
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| ClipboardError::CommandIo {
                command: WL_COPY_COMMAND.to_string(),
                source,
            })?;
        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(&image.bytes)
                .map_err(|source| ClipboardError::CommandIo {
                    command: WL_COPY_COMMAND.to_string(),
                    source,
                })?;
        }
        drop(child.stdin.take());

        let status = child.wait().map_err(|source| ClipboardError::CommandIo {
            command: WL_COPY_COMMAND.to_string(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                command: WL_COPY_COMMAND.to_string(),
                status: status.to_string(),
            })
        }
    }
}
