//! Normalizes clipboard and drag-and-drop payloads into viewport sources.

use std::path::Path;

use thiserror::Error;

use crate::clipboard::{ClipboardAccess, ClipboardError, ClipboardImage};
use crate::raster::{DecodeError, EncodeError, RasterImage, RawPixels};
use crate::viewport::Viewport;

pub const DEFAULT_DISPLAY_MAX_EDGE: u32 = 4096;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{action} requires an image but the viewport is empty")]
pub struct EmptySourceError {
    pub action: &'static str,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    EmptySource(#[from] EmptySourceError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Long-edge bound applied once when an image is installed.
    pub display_max_edge: u32,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            display_max_edge: DEFAULT_DISPLAY_MAX_EDGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Installed { width: u32, height: u32 },
    /// Nothing usable was offered; the viewport is untouched.
    Empty,
    /// The viewport does not accept pasted or dropped images.
    Rejected,
}

#[derive(Debug, Clone, Copy)]
pub enum DropPayload<'a> {
    Encoded(&'a [u8]),
    Raw(RawPixels<'a>),
    Path(&'a Path),
}

impl DropPayload<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Encoded(_) => "encoded",
            Self::Raw(_) => "raw",
            Self::Path(_) => "path",
        }
    }

    fn decode(self) -> Result<RasterImage, DecodeError> {
        match self {
            Self::Encoded(bytes) => RasterImage::decode_bytes(bytes),
            Self::Raw(raw) => RasterImage::from_raw(raw),
            Self::Path(path) => RasterImage::decode_path(path),
        }
    }
}

fn install(viewport: &mut Viewport, image: RasterImage, options: IngestOptions) -> IngestOutcome {
    let (original_width, original_height) = image.dimensions();
    let image = image.bounded(options.display_max_edge);
    let (width, height) = image.dimensions();
    if (width, height) != (original_width, original_height) {
        tracing::info!(
            original_width,
            original_height,
            width,
            height,
            "downsampled large image for display"
        );
    }
    viewport.set_image(image);
    IngestOutcome::Installed { width, height }
}

/// Reads the clipboard once and installs any image it holds.
pub fn paste_into(
    clipboard: &dyn ClipboardAccess,
    viewport: &mut Viewport,
    options: IngestOptions,
) -> IngestResult<IngestOutcome> {
    if !viewport.capabilities().paste_enabled {
        tracing::debug!("paste ignored by viewport without paste capability");
        return Ok(IngestOutcome::Rejected);
    }
    let Some(ClipboardImage { mime, bytes }) = clipboard.read_image()? else {
        tracing::info!("clipboard holds no image; paste ignored");
        return Ok(IngestOutcome::Empty);
    };
    let image = RasterImage::decode_bytes(&bytes)?;
    tracing::info!(%mime, bytes = bytes.len(), "pasted image from clipboard");
    Ok(install(viewport, image, options))
}

pub fn drop_into(
    payload: DropPayload<'_>,
    viewport: &mut Viewport,
    options: IngestOptions,
) -> IngestResult<IngestOutcome> {
    if !viewport.capabilities().paste_enabled {
        tracing::debug!(kind = payload.kind(), "drop ignored by viewport without paste capability");
        return Ok(IngestOutcome::Rejected);
    }
    let kind = payload.kind();
    let image = payload.decode().inspect_err(|err| {
        tracing::warn!(kind, error = %err, "dropped data is not a usable image");
    })?;
    tracing::info!(kind, "dropped image accepted");
    Ok(install(viewport, image, options))
}

/// Copies the viewport's unmodified source, never its rendered frame.
pub fn copy_out(viewport: &Viewport, clipboard: &dyn ClipboardAccess) -> IngestResult<()> {
    let source = viewport.source().ok_or(EmptySourceError { action: "copy" })?;
    let bytes = source.encode_png()?;
    clipboard.write_image(&ClipboardImage::png(bytes))?;
    tracing::info!(
        width = source.width(),
        height = source.height(),
        "copied image to clipboard"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::MemoryClipboard;
    use crate::geometry::{ContainerSize, ViewPoint};
    use crate::raster::{solid_rgb, solid_rgba, PixelLayout};
    use crate::viewport::ViewportCapabilities;

    fn pasteable() -> Viewport {
        Viewport::new(
            ContainerSize::new(400, 400),
            ViewportCapabilities::mirror_and_paste(),
        )
    }

    fn zoomed_with_image() -> Viewport {
        let mut viewport = pasteable();
        viewport.set_image(solid_rgb(800, 600, [9, 9, 9]));
        viewport.zoom(2.0, ViewPoint::new(100, 100));
        viewport
    }

    #[test]
    fn paste_with_empty_clipboard_is_a_no_op() {
        let clipboard = MemoryClipboard::default();
        let mut viewport = zoomed_with_image();
        let view = viewport.view();
        let generation = viewport.generation();

        let outcome = paste_into(&clipboard, &mut viewport, IngestOptions::default())
            .expect("empty clipboard is not an error");
        assert_eq!(outcome, IngestOutcome::Empty);
        assert_eq!(viewport.view(), view);
        assert_eq!(viewport.generation(), generation);
    }

    #[test]
    fn paste_installs_clipboard_image_and_resets_view() {
        let png = solid_rgba(30, 20, [1, 2, 3, 40]).encode_png().unwrap();
        let clipboard = MemoryClipboard::holding(ClipboardImage::png(png));
        let mut viewport = zoomed_with_image();

        let outcome = paste_into(&clipboard, &mut viewport, IngestOptions::default()).unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Installed {
                width: 30,
                height: 20
            }
        );
        assert_eq!(viewport.zoom_level(), 1.0);
        assert_eq!(viewport.pan(), ViewPoint::origin());
        assert!(viewport.source().is_some_and(RasterImage::has_alpha));
    }

    #[test]
    fn paste_into_result_pane_is_rejected_without_reading() {
        let clipboard = MemoryClipboard::holding(ClipboardImage::png(vec![0]));
        let mut viewport = Viewport::new(
            ContainerSize::new(400, 400),
            ViewportCapabilities::mirror_only(),
        );
        let outcome = paste_into(&clipboard, &mut viewport, IngestOptions::default()).unwrap();
        assert_eq!(outcome, IngestOutcome::Rejected);
        assert_eq!(*clipboard.reads.borrow(), 0);
        assert!(!viewport.has_image());
    }

    #[test]
    fn paste_of_corrupt_clipboard_data_reports_decode_error() {
        let clipboard = MemoryClipboard::holding(ClipboardImage::png(b"garbage".to_vec()));
        let mut viewport = zoomed_with_image();
        let view = viewport.view();
        let err = paste_into(&clipboard, &mut viewport, IngestOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));
        assert_eq!(viewport.view(), view);
    }

    #[test]
    fn drop_of_non_image_path_leaves_viewport_unchanged() {
        let path = std::env::temp_dir().join(format!(
            "cutout-ingest-not-an-image-{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "plain text, not pixels").unwrap();
        let mut viewport = zoomed_with_image();
        let view = viewport.view();
        let generation = viewport.generation();

        let err = drop_into(
            DropPayload::Path(&path),
            &mut viewport,
            IngestOptions::default(),
        )
        .unwrap_err();
        let _ = std::fs::remove_file(&path);

        assert!(matches!(err, IngestError::Decode(DecodeError::Format { .. })));
        assert_eq!(viewport.view(), view);
        assert_eq!(viewport.generation(), generation);
        assert_eq!(viewport.source().map(RasterImage::dimensions), Some((800, 600)));
    }

    #[test]
    fn drop_of_raw_pixels_owns_a_copy() {
        let mut data = vec![7_u8; 4 * 3 * 4];
        let mut viewport = pasteable();
        drop_into(
            DropPayload::Raw(RawPixels {
                width: 4,
                height: 3,
                layout: PixelLayout::Rgba8,
                data: &data,
            }),
            &mut viewport,
            IngestOptions::default(),
        )
        .unwrap();
        data.fill(0);
        let source = viewport.source().expect("installed");
        assert!(source.as_bytes().iter().all(|byte| *byte == 7));
    }

    #[test]
    fn drop_downsamples_to_display_bound() {
        let png = solid_rgb(600, 300, [5, 5, 5]).encode_png().unwrap();
        let mut viewport = pasteable();
        let outcome = drop_into(
            DropPayload::Encoded(&png),
            &mut viewport,
            IngestOptions {
                display_max_edge: 150,
            },
        )
        .unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Installed {
                width: 150,
                height: 75
            }
        );
    }

    #[test]
    fn copy_out_exports_unmodified_source() {
        let clipboard = MemoryClipboard::default();
        let viewport = zoomed_with_image();
        copy_out(&viewport, &clipboard).unwrap();

        let copied = clipboard.contents.borrow().clone().expect("clipboard written");
        assert_eq!(copied.mime, "image/png");
        let decoded = RasterImage::decode_bytes(&copied.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (800, 600));
        assert_eq!(Some(&decoded), viewport.source());
    }

    #[test]
    fn copy_out_of_empty_viewport_never_touches_clipboard() {
        let clipboard = MemoryClipboard::default();
        let viewport = pasteable();
        let err = copy_out(&viewport, &clipboard).unwrap_err();
        assert!(matches!(err, IngestError::EmptySource(_)));
        assert_eq!(*clipboard.writes.borrow(), 0);
    }
}
