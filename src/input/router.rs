use super::{ModifierState, ZoomModifier};
use crate::geometry::ViewPoint;
use crate::viewport::Viewport;

pub const WHEEL_ZOOM_IN_FACTOR: f64 = 1.1;
pub const WHEEL_ZOOM_OUT_FACTOR: f64 = 0.9;

/// Raw pointer input in container coordinates. Positive wheel deltas zoom in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Wheel {
        delta: f64,
        position: ViewPoint,
        modifiers: ModifierState,
    },
    Press {
        position: ViewPoint,
    },
    Motion {
        position: ViewPoint,
    },
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Gesture {
    #[default]
    Idle,
    Panning {
        last: ViewPoint,
    },
    // Pressed while the image fit the container; stays inert until release.
    Inert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Ignored,
    Unchanged,
    Zoomed,
    Panned,
}

impl RouteOutcome {
    pub const fn changed(self) -> bool {
        matches!(self, Self::Zoomed | Self::Panned)
    }
}

/// Per-viewport translator from pointer input to zoom/pan mutations.
#[derive(Debug, Clone, Default)]
pub struct InputRouter {
    zoom_modifier: ZoomModifier,
    gesture: Gesture,
}

impl InputRouter {
    pub const fn new(zoom_modifier: ZoomModifier) -> Self {
        Self {
            zoom_modifier,
            gesture: Gesture::Idle,
        }
    }

    pub const fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn route(&mut self, event: PointerEvent, viewport: &mut Viewport) -> RouteOutcome {
        match event {
            PointerEvent::Release => {
                let was_dragging = self.is_dragging();
                self.gesture = Gesture::Idle;
                if was_dragging {
                    tracing::trace!("drag pan ended");
                }
                RouteOutcome::Ignored
            }
            PointerEvent::Press { position } => {
                self.gesture = if viewport.has_image() && viewport.zoom_level() > 1.0 {
                    tracing::trace!(x = position.x, y = position.y, "drag pan started");
                    Gesture::Panning { last: position }
                } else {
                    Gesture::Inert
                };
                RouteOutcome::Ignored
            }
            PointerEvent::Motion { position } => {
                let Gesture::Panning { last } = self.gesture else {
                    return RouteOutcome::Ignored;
                };
                self.gesture = Gesture::Panning { last: position };
                let delta_x = position.x.saturating_sub(last.x);
                let delta_y = position.y.saturating_sub(last.y);
                if viewport.pan_by(delta_x, delta_y) {
                    RouteOutcome::Panned
                } else {
                    RouteOutcome::Unchanged
                }
            }
            PointerEvent::Wheel {
                delta,
                position,
                modifiers,
            } => {
                if !self.zoom_modifier.is_held(modifiers) || !viewport.has_image() {
                    return RouteOutcome::Ignored;
                }
                let factor = if delta > 0.0 {
                    WHEEL_ZOOM_IN_FACTOR
                } else {
                    WHEEL_ZOOM_OUT_FACTOR
                };
                if viewport.zoom(factor, position) {
                    RouteOutcome::Zoomed
                } else {
                    RouteOutcome::Unchanged
                }
            }
        }
    }
}
