//! Zoomable, pannable holder of a single source image.

pub mod compositor;

use crate::geometry::{ContainerSize, ViewPoint, ViewTransform};
use crate::raster::RasterImage;

pub use compositor::{compose_frame, Compositor, BACKGROUND};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

/// Behaviors a viewport opts into instead of inheriting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportCapabilities {
    pub mirrorable: bool,
    pub paste_enabled: bool,
}

impl ViewportCapabilities {
    pub const fn mirror_only() -> Self {
        Self {
            mirrorable: true,
            paste_enabled: false,
        }
    }

    pub const fn mirror_and_paste() -> Self {
        Self {
            mirrorable: true,
            paste_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Viewport {
    source: Option<RasterImage>,
    zoom: f64,
    pan: ViewPoint,
    container: ContainerSize,
    capabilities: ViewportCapabilities,
    generation: u64,
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

fn scaled_dimension(source: u32, zoom: f64) -> i64 {
    (f64::from(source) * zoom) as i64
}

fn max_pan(source: u32, container: u32, zoom: f64) -> i32 {
    let overflow = scaled_dimension(source, zoom) - i64::from(container);
    i32::try_from(overflow.max(0) / 2).unwrap_or(i32::MAX)
}

fn anchored_pan(anchor: i32, pan: i32, ratio: f64) -> i32 {
    let anchor = f64::from(anchor);
    (anchor - (anchor - f64::from(pan)) * ratio).round() as i32
}

impl Viewport {
    pub fn new(container: ContainerSize, capabilities: ViewportCapabilities) -> Self {
        Self {
            source: None,
            zoom: 1.0,
            pan: ViewPoint::origin(),
            container,
            capabilities,
            generation: 0,
        }
    }

    pub fn source(&self) -> Option<&RasterImage> {
        self.source.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    pub const fn zoom_level(&self) -> f64 {
        self.zoom
    }

    pub const fn pan(&self) -> ViewPoint {
        self.pan
    }

    pub const fn view(&self) -> ViewTransform {
        ViewTransform {
            zoom: self.zoom,
            pan: self.pan,
        }
    }

    pub const fn container(&self) -> ContainerSize {
        self.container
    }

    pub const fn capabilities(&self) -> ViewportCapabilities {
        self.capabilities
    }

    /// Bumped on every image replacement; render caches key on it.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    pub fn set_image(&mut self, image: RasterImage) {
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            has_alpha = image.has_alpha(),
            "viewport image replaced"
        );
        self.source = Some(image);
        self.zoom = 1.0;
        self.pan = ViewPoint::origin();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear_image(&mut self) {
        if self.source.take().is_none() {
            return;
        }
        self.zoom = 1.0;
        self.pan = ViewPoint::origin();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Multiplies the zoom by `factor` keeping the content under `anchor` fixed.
    /// Returns `false` when the clamped zoom is unchanged.
    pub fn zoom(&mut self, factor: f64, anchor: ViewPoint) -> bool {
        let old_zoom = self.zoom;
        let new_zoom = clamp_zoom(old_zoom * factor);
        if new_zoom == old_zoom {
            return false;
        }

        let ratio = new_zoom / old_zoom;
        self.pan = ViewPoint::new(
            anchored_pan(anchor.x, self.pan.x, ratio),
            anchored_pan(anchor.y, self.pan.y, ratio),
        );
        self.zoom = new_zoom;
        self.clamp_pan();
        tracing::debug!(
            zoom = self.zoom,
            pan_x = self.pan.x,
            pan_y = self.pan.y,
            "viewport zoomed"
        );
        true
    }

    /// Returns `false` when the clamp absorbed the whole delta.
    pub fn pan_by(&mut self, delta_x: i32, delta_y: i32) -> bool {
        let before = self.pan;
        self.pan = ViewPoint::new(
            self.pan.x.saturating_add(delta_x),
            self.pan.y.saturating_add(delta_y),
        );
        self.clamp_pan();
        self.pan != before
    }

    pub fn resize_container(&mut self, container: ContainerSize) {
        if self.container == container {
            return;
        }
        self.container = container;
        self.clamp_pan();
    }

    /// Installs a transform produced by another viewport without re-deriving it.
    pub fn apply_view(&mut self, view: ViewTransform) {
        self.zoom = clamp_zoom(view.zoom);
        self.pan = view.pan;
    }

    pub fn max_pan(&self) -> ViewPoint {
        match &self.source {
            Some(source) if self.zoom > 1.0 => ViewPoint::new(
                max_pan(source.width(), self.container.width, self.zoom),
                max_pan(source.height(), self.container.height, self.zoom),
            ),
            _ => ViewPoint::origin(),
        }
    }

    fn clamp_pan(&mut self) {
        let limit = self.max_pan();
        self.pan = ViewPoint::new(
            self.pan.x.clamp(-limit.x, limit.x),
            self.pan.y.clamp(-limit.y, limit.y),
        );
    }

    pub fn render(&self, container: ContainerSize) -> image::RgbaImage {
        compose_frame(self.source.as_ref(), self.view(), container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::solid_rgb;

    fn loaded(width: u32, height: u32) -> Viewport {
        let mut viewport = Viewport::new(
            ContainerSize::new(400, 400),
            ViewportCapabilities::mirror_and_paste(),
        );
        viewport.set_image(solid_rgb(width, height, [200, 10, 10]));
        viewport
    }

    #[test]
    fn new_viewport_starts_empty_at_identity() {
        let viewport = Viewport::new(ContainerSize::default(), ViewportCapabilities::default());
        assert!(!viewport.has_image());
        assert_eq!(viewport.zoom_level(), 1.0);
        assert_eq!(viewport.pan(), ViewPoint::origin());
        assert_eq!(viewport.generation(), 0);
    }

    #[test]
    fn zoom_stays_within_bounds_for_repeated_factors() {
        let mut viewport = loaded(800, 600);
        for _ in 0..200 {
            viewport.zoom(1.1, ViewPoint::new(200, 200));
            assert!(viewport.zoom_level() <= MAX_ZOOM);
        }
        assert_eq!(viewport.zoom_level(), MAX_ZOOM);
        for _ in 0..400 {
            viewport.zoom(0.9, ViewPoint::new(13, 370));
            assert!(viewport.zoom_level() >= MIN_ZOOM);
        }
        assert_eq!(viewport.zoom_level(), MIN_ZOOM);

        for factor in [0.0, -3.0, 1e9, f64::NAN] {
            viewport.zoom(factor, ViewPoint::origin());
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&viewport.zoom_level()));
        }
    }

    #[test]
    fn zoom_at_limit_is_a_no_op() {
        let mut viewport = loaded(800, 600);
        viewport.apply_view(ViewTransform {
            zoom: MAX_ZOOM,
            pan: ViewPoint::new(12, -7),
        });
        assert!(!viewport.zoom(1.1, ViewPoint::new(0, 0)));
        assert_eq!(viewport.pan(), ViewPoint::new(12, -7));
        assert_eq!(viewport.zoom_level(), MAX_ZOOM);
    }

    #[test]
    fn four_anchored_zoom_steps_follow_formula_and_clamp() {
        let mut viewport = loaded(800, 600);
        let anchor = ViewPoint::new(200, 200);
        for _ in 0..4 {
            assert!(viewport.zoom(1.1, anchor));
        }
        assert!((viewport.zoom_level() - 1.4641).abs() < 1e-9);
        assert_eq!(viewport.pan(), ViewPoint::new(-93, -93));

        let limit = viewport.max_pan();
        assert_eq!(limit, ViewPoint::new(385, 239));
        assert!(viewport.pan().x.abs() <= limit.x);
        assert!(viewport.pan().y.abs() <= limit.y);
    }

    #[test]
    fn inverse_zoom_pair_restores_pan() {
        let mut viewport = loaded(800, 600);
        viewport.apply_view(ViewTransform {
            zoom: 2.0,
            pan: ViewPoint::new(10, 10),
        });
        let anchor = ViewPoint::new(200, 200);

        assert!(viewport.zoom(2.0, anchor));
        assert_eq!(viewport.pan(), ViewPoint::new(-180, -180));
        assert!(viewport.zoom(0.5, anchor));

        assert!((viewport.zoom_level() - 2.0).abs() < 1e-12);
        assert!((viewport.pan().x - 10).abs() <= 1);
        assert!((viewport.pan().y - 10).abs() <= 1);
    }

    #[test]
    fn zooming_to_fit_or_below_forces_pan_to_origin() {
        let mut viewport = loaded(800, 600);
        viewport.zoom(2.0, ViewPoint::new(0, 0));
        viewport.pan_by(50, 50);
        assert_ne!(viewport.pan(), ViewPoint::origin());

        viewport.zoom(0.4, ViewPoint::new(390, 10));
        assert!(viewport.zoom_level() <= 1.0);
        assert_eq!(viewport.pan(), ViewPoint::origin());
    }

    #[test]
    fn pan_by_clamps_every_delta_to_overflow_bounds() {
        let mut viewport = loaded(800, 600);
        viewport.zoom(1.5, ViewPoint::new(200, 200));
        let limit = viewport.max_pan();
        for (dx, dy) in [(10_000, -10_000), (-3, 4), (i32::MAX, i32::MIN), (77, 77)] {
            viewport.pan_by(dx, dy);
            assert!(viewport.pan().x.abs() <= limit.x);
            assert!(viewport.pan().y.abs() <= limit.y);
        }
    }

    #[test]
    fn pan_by_at_fit_zoom_is_absorbed() {
        let mut viewport = loaded(800, 600);
        assert!(!viewport.pan_by(40, -40));
        assert_eq!(viewport.pan(), ViewPoint::origin());
    }

    #[test]
    fn small_image_has_no_pan_room_even_when_zoomed() {
        let mut viewport = loaded(100, 80);
        viewport.zoom(3.0, ViewPoint::new(200, 200));
        assert_eq!(viewport.max_pan(), ViewPoint::origin());
        assert_eq!(viewport.pan(), ViewPoint::origin());
    }

    #[test]
    fn set_image_resets_view_and_bumps_generation() {
        let mut viewport = loaded(800, 600);
        viewport.zoom(3.0, ViewPoint::new(100, 100));
        viewport.pan_by(30, 30);
        let generation = viewport.generation();

        viewport.set_image(solid_rgb(20, 20, [0, 0, 0]));
        assert_eq!(viewport.zoom_level(), 1.0);
        assert_eq!(viewport.pan(), ViewPoint::origin());
        assert_eq!(viewport.generation(), generation + 1);
        assert_eq!(viewport.source().map(RasterImage::dimensions), Some((20, 20)));
    }

    #[test]
    fn growing_container_reclamps_pan() {
        let mut viewport = loaded(800, 600);
        viewport.zoom(2.0, ViewPoint::new(200, 200));
        viewport.pan_by(-10_000, -10_000);
        assert_eq!(viewport.pan(), ViewPoint::new(-600, -400));

        viewport.resize_container(ContainerSize::new(1400, 1000));
        assert_eq!(viewport.pan(), ViewPoint::new(-100, -100));
    }
}
