//! Immutable in-memory bitmaps and the decoders that produce them.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read image file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported or corrupt image data: {source}")]
    Format {
        #[source]
        source: image::ImageError,
    },
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("pixel buffer length {actual} does not match {width}x{height} {layout:?}")]
    BufferSize {
        width: u32,
        height: u32,
        layout: PixelLayout,
        actual: usize,
    },
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[derive(Debug, Error)]
#[error("failed to encode image as png: {source}")]
pub struct EncodeError {
    #[source]
    source: image::ImageError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb8,
    Rgba8,
}

impl PixelLayout {
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Borrowed, uncompressed pixels handed over by a clipboard or drop source.
#[derive(Debug, Clone, Copy)]
pub struct RawPixels<'a> {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: &'a [u8],
}

/// A bitmap that is never mutated once built; transformations return a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: DynamicImage,
}

impl RasterImage {
    pub fn from_dynamic(image: DynamicImage) -> DecodeResult<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyImage { width, height });
        }
        let pixels = if image.color().has_alpha() {
            DynamicImage::ImageRgba8(image.into_rgba8())
        } else {
            DynamicImage::ImageRgb8(image.into_rgb8())
        };
        Ok(Self { pixels })
    }

    pub fn decode_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        let image =
            image::load_from_memory(bytes).map_err(|source| DecodeError::Format { source })?;
        Self::from_dynamic(image)
    }

    pub fn decode_path(path: &Path) -> DecodeResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| DecodeError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode_bytes(&bytes)
    }

    /// Copies `raw` into a buffer owned by the returned image.
    pub fn from_raw(raw: RawPixels<'_>) -> DecodeResult<Self> {
        let RawPixels {
            width,
            height,
            layout,
            data,
        } = raw;
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyImage { width, height });
        }
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(layout.channels());
        if data.len() != expected {
            return Err(DecodeError::BufferSize {
                width,
                height,
                layout,
                actual: data.len(),
            });
        }
        let owned = data.to_vec();
        let pixels = match layout {
            PixelLayout::Rgb8 => image::RgbImage::from_raw(width, height, owned)
                .map(DynamicImage::ImageRgb8),
            PixelLayout::Rgba8 => {
                RgbaImage::from_raw(width, height, owned).map(DynamicImage::ImageRgba8)
            }
        };
        pixels
            .map(|pixels| Self { pixels })
            .ok_or(DecodeError::BufferSize {
                width,
                height,
                layout,
                actual: data.len(),
            })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self.pixels, DynamicImage::ImageRgba8(_))
    }

    pub fn layout(&self) -> PixelLayout {
        if self.has_alpha() {
            PixelLayout::Rgba8
        } else {
            PixelLayout::Rgb8
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_bytes()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn to_rgba8(&self) -> RgbaImage {
        self.pixels.to_rgba8()
    }

    /// Smallest alpha value in the image, `255` for images without alpha.
    pub fn min_alpha(&self) -> u8 {
        match &self.pixels {
            DynamicImage::ImageRgba8(rgba) => rgba.pixels().map(|px| px.0[3]).min().unwrap_or(255),
            _ => 255,
        }
    }

    /// Returns a copy whose long edge is at most `max_edge`, keeping the aspect ratio.
    /// Images already within the bound are returned as an unscaled copy.
    pub fn bounded(&self, max_edge: u32) -> Self {
        let (width, height) = self.dimensions();
        let max_edge = max_edge.max(1);
        if width <= max_edge && height <= max_edge {
            return self.clone();
        }
        let (target_width, target_height) = fit_within(width, height, max_edge);
        Self {
            pixels: self
                .pixels
                .resize_exact(target_width, target_height, FilterType::Lanczos3),
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|source| EncodeError { source })?;
        Ok(bytes)
    }

    /// PNG bytes with an alpha channel regardless of the stored layout.
    pub fn encode_rgba_png(&self) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(self.to_rgba8())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|source| EncodeError { source })?;
        Ok(bytes)
    }
}

fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let scale = f64::from(max_edge) / f64::from(width.max(height));
    let target_width = (f64::from(width) * scale).round().max(1.0) as u32;
    let target_height = (f64::from(height) * scale).round().max(1.0) as u32;
    (target_width.min(max_edge), target_height.min(max_edge))
}

#[cfg(test)]
pub(crate) fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> RasterImage {
    let buffer = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    RasterImage::from_dynamic(DynamicImage::ImageRgb8(buffer)).expect("non-empty test image")
}

#[cfg(test)]
pub(crate) fn solid_rgba(width: u32, height: u32, rgba: [u8; 4]) -> RasterImage {
    let buffer = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    RasterImage::from_dynamic(DynamicImage::ImageRgba8(buffer)).expect("non-empty test image")
}
