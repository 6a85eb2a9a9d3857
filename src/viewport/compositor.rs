use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::Viewport;
use crate::geometry::{Color, ContainerSize, ViewTransform};
use crate::raster::RasterImage;

pub const BACKGROUND: Color = Color::WHITE;
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    width: u32,
    height: u32,
    x: i64,
    y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisCrop {
    src_start: u32,
    src_len: u32,
    dst_pos: i64,
    dst_len: u32,
}

fn scaled_len(source: u32, zoom: f64) -> u32 {
    ((f64::from(source) * zoom) as u32).max(1)
}

fn placement(source: &RasterImage, view: ViewTransform, container: ContainerSize) -> Placement {
    let width = scaled_len(source.width(), view.zoom);
    let height = scaled_len(source.height(), view.zoom);
    let mut x = (i64::from(container.width) - i64::from(width)).div_euclid(2);
    let mut y = (i64::from(container.height) - i64::from(height)).div_euclid(2);
    if view.zoom > 1.0 {
        x += i64::from(view.pan.x);
        y += i64::from(view.pan.y);
    }
    Placement {
        width,
        height,
        x,
        y,
    }
}

fn axis_crop(source_len: u32, scaled_len: u32, origin: i64, container: u32) -> Option<AxisCrop> {
    let visible_start = (-origin).max(0);
    let visible_end = (i64::from(container) - origin).min(i64::from(scaled_len));
    if visible_end <= visible_start {
        return None;
    }

    let scale = f64::from(scaled_len) / f64::from(source_len.max(1));
    let last = i64::from(source_len.max(1));
    let src_start = ((visible_start as f64 / scale).floor() as i64).clamp(0, last - 1);
    let src_end = ((visible_end as f64 / scale).ceil() as i64).clamp(src_start + 1, last);
    let dst_start = (src_start as f64 * scale).round() as i64;
    let dst_end = ((src_end as f64 * scale).round() as i64).max(dst_start + 1);

    Some(AxisCrop {
        src_start: u32::try_from(src_start).ok()?,
        src_len: u32::try_from(src_end - src_start).ok()?,
        dst_pos: origin + dst_start,
        dst_len: u32::try_from(dst_end - dst_start).ok()?,
    })
}

fn blank_frame(container: ContainerSize) -> RgbaImage {
    RgbaImage::from_pixel(
        container.width.max(1),
        container.height.max(1),
        Rgba(BACKGROUND.rgba()),
    )
}

/// Renders `source` under `view` into a container-sized frame over a white fill.
/// Only the part of the source that lands inside the container is resampled.
pub fn compose_frame(
    source: Option<&RasterImage>,
    view: ViewTransform,
    container: ContainerSize,
) -> RgbaImage {
    let mut frame = blank_frame(container);
    let Some(source) = source else {
        return frame;
    };
    let placed = placement(source, view, container);
    let Some(crop_x) = axis_crop(source.width(), placed.width, placed.x, frame.width()) else {
        return frame;
    };
    let Some(crop_y) = axis_crop(source.height(), placed.height, placed.y, frame.height()) else {
        return frame;
    };

    let region = source.as_dynamic().crop_imm(
        crop_x.src_start,
        crop_y.src_start,
        crop_x.src_len,
        crop_y.src_len,
    );
    let scaled = imageops::resize(&region, crop_x.dst_len, crop_y.dst_len, RESAMPLE_FILTER);
    imageops::overlay(&mut frame, &scaled, crop_x.dst_pos, crop_y.dst_pos);
    frame
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameKey {
    generation: u64,
    view: ViewTransform,
    container: ContainerSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderPath {
    Blank,
    Reused,
    Resampled,
}

#[derive(Debug)]
struct CachedFrame {
    key: FrameKey,
    frame: RgbaImage,
}

/// Frame renderer that keeps the last container-sized frame. Repeated draws of
/// an unchanged view reuse it; any zoom, pan, resize or new image resamples only
/// the visible crop of the source.
#[derive(Debug, Default)]
pub struct Compositor {
    cache: Option<CachedFrame>,
    last_path: Option<RenderPath>,
}

impl Compositor {
    pub const fn new() -> Self {
        Self {
            cache: None,
            last_path: None,
        }
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn render(&mut self, viewport: &Viewport, container: ContainerSize) -> RgbaImage {
        let Some(source) = viewport.source() else {
            self.invalidate();
            self.last_path = Some(RenderPath::Blank);
            return blank_frame(container);
        };
        let key = FrameKey {
            generation: viewport.generation(),
            view: viewport.view(),
            container,
        };
        if let Some(cached) = self.cache.as_ref().filter(|cached| cached.key == key) {
            self.last_path = Some(RenderPath::Reused);
            return cached.frame.clone();
        }

        tracing::trace!(
            zoom = key.view.zoom,
            width = container.width,
            height = container.height,
            "resampling visible region"
        );
        let frame = compose_frame(Some(source), key.view, container);
        self.cache = Some(CachedFrame {
            key,
            frame: frame.clone(),
        });
        self.last_path = Some(RenderPath::Resampled);
        frame
    }

    #[cfg(test)]
    fn cached_generation(&self) -> Option<u64> {
        self.cache.as_ref().map(|cached| cached.key.generation)
    }

    #[cfg(test)]
    fn cached_dimensions(&self) -> Option<(u32, u32)> {
        self.cache.as_ref().map(|cached| cached.frame.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ViewPoint;
    use crate::raster::{solid_rgb, solid_rgba};
    use crate::viewport::ViewportCapabilities;

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    fn close(actual: [u8; 4], expected: [u8; 4]) -> bool {
        actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| a.abs_diff(*e) <= 2)
    }

    #[test]
    fn empty_source_renders_background_only() {
        let frame = compose_frame(None, ViewTransform::identity(), ContainerSize::new(40, 30));
        assert_eq!(frame.dimensions(), (40, 30));
        assert!(frame.pixels().all(|px| px.0 == WHITE));
    }

    #[test]
    fn fit_zoom_centers_image_with_white_margins() {
        let source = solid_rgb(100, 100, [200, 0, 0]);
        let frame = compose_frame(
            Some(&source),
            ViewTransform::identity(),
            ContainerSize::new(400, 400),
        );
        assert!(close(frame.get_pixel(200, 200).0, [200, 0, 0, 255]));
        assert!(close(frame.get_pixel(150, 150).0, [200, 0, 0, 255]));
        assert!(close(frame.get_pixel(249, 249).0, [200, 0, 0, 255]));
        assert_eq!(frame.get_pixel(149, 149).0, WHITE);
        assert_eq!(frame.get_pixel(250, 250).0, WHITE);
    }

    #[test]
    fn zoomed_in_source_covers_container() {
        let source = solid_rgb(800, 600, [0, 0, 180]);
        let view = ViewTransform {
            zoom: 2.0,
            pan: ViewPoint::new(-600, 400),
        };
        let frame = compose_frame(Some(&source), view, ContainerSize::new(400, 400));
        assert!(frame.pixels().all(|px| close(px.0, [0, 0, 180, 255])));
    }

    #[test]
    fn pan_is_ignored_below_fit_zoom() {
        let source = solid_rgb(100, 100, [0, 120, 0]);
        let view = ViewTransform {
            zoom: 1.0,
            pan: ViewPoint::new(150, 150),
        };
        let frame = compose_frame(Some(&source), view, ContainerSize::new(400, 400));
        assert!(close(frame.get_pixel(200, 200).0, [0, 120, 0, 255]));
        assert_eq!(frame.get_pixel(399, 399).0, WHITE);
    }

    #[test]
    fn image_panned_out_of_view_leaves_background() {
        let source = solid_rgb(100, 100, [9, 9, 9]);
        let view = ViewTransform {
            zoom: 2.0,
            pan: ViewPoint::new(5_000, 0),
        };
        let frame = compose_frame(Some(&source), view, ContainerSize::new(50, 50));
        assert!(frame.pixels().all(|px| px.0 == WHITE));
    }

    #[test]
    fn transparent_pixels_blend_over_white() {
        let clear = solid_rgba(10, 10, [0, 0, 0, 0]);
        let frame = compose_frame(
            Some(&clear),
            ViewTransform::identity(),
            ContainerSize::new(10, 10),
        );
        assert!(frame.pixels().all(|px| close(px.0, WHITE)));

        let half = solid_rgba(10, 10, [0, 0, 0, 128]);
        let frame = compose_frame(
            Some(&half),
            ViewTransform::identity(),
            ContainerSize::new(10, 10),
        );
        let px = frame.get_pixel(5, 5).0;
        assert!((120..=135).contains(&px[0]), "unexpected blend {px:?}");
    }

    #[test]
    fn compositor_matches_uncached_frame_and_tracks_generation() {
        let mut viewport = Viewport::new(
            ContainerSize::new(120, 90),
            ViewportCapabilities::mirror_only(),
        );
        viewport.set_image(solid_rgb(60, 40, [10, 200, 30]));
        let mut compositor = Compositor::new();

        let cached = compositor.render(&viewport, ContainerSize::new(120, 90));
        assert_eq!(cached, viewport.render(ContainerSize::new(120, 90)));
        assert_eq!(compositor.cached_generation(), Some(1));

        viewport.set_image(solid_rgb(30, 30, [1, 1, 1]));
        let _ = compositor.render(&viewport, ContainerSize::new(120, 90));
        assert_eq!(compositor.cached_generation(), Some(2));
    }

    #[test]
    fn zoom_tick_on_large_source_resamples_only_the_visible_frame() {
        let container = ContainerSize::new(400, 300);
        let mut viewport = Viewport::new(container, ViewportCapabilities::mirror_only());
        viewport.set_image(solid_rgb(4096, 3072, [70, 80, 90]));
        let mut compositor = Compositor::new();
        let _ = compositor.render(&viewport, container);

        assert!(viewport.zoom(1.1, ViewPoint::new(200, 150)));
        let frame = compositor.render(&viewport, container);
        assert_eq!(compositor.last_path, Some(RenderPath::Resampled));
        assert_eq!(compositor.cached_dimensions(), Some((400, 300)));
        assert!(frame.pixels().all(|px| close(px.0, [70, 80, 90, 255])));

        let _ = compositor.render(&viewport, container);
        assert_eq!(compositor.last_path, Some(RenderPath::Reused));
    }

    #[test]
    fn pan_and_resize_invalidate_reused_frame() {
        let container = ContainerSize::new(64, 64);
        let mut viewport = Viewport::new(container, ViewportCapabilities::mirror_only());
        viewport.set_image(solid_rgb(200, 200, [5, 6, 7]));
        viewport.zoom(2.0, ViewPoint::new(32, 32));
        let mut compositor = Compositor::new();
        let _ = compositor.render(&viewport, container);

        assert!(viewport.pan_by(10, 0));
        let _ = compositor.render(&viewport, container);
        assert_eq!(compositor.last_path, Some(RenderPath::Resampled));

        let larger = ContainerSize::new(80, 64);
        let frame = compositor.render(&viewport, larger);
        assert_eq!(compositor.last_path, Some(RenderPath::Resampled));
        assert_eq!(frame.dimensions(), (80, 64));

        viewport.clear_image();
        let _ = compositor.render(&viewport, larger);
        assert_eq!(compositor.last_path, Some(RenderPath::Blank));
        assert_eq!(compositor.cached_generation(), None);
    }
}
