use std::cell::Cell;
use std::rc::Rc;

use gtk4::gdk::prelude::GdkCairoContextExt;
use gtk4::prelude::*;
use image::RgbaImage;

use crate::geometry::{ContainerSize, ViewPoint};
use crate::input::{PointerEvent, RouteOutcome};
use crate::mirror::PaneId;

use super::actions::AppActions;
use super::input_bridge::{modifier_state, pointer_position, wheel_delta};

fn frame_pixbuf(frame: RgbaImage) -> gtk4::gdk_pixbuf::Pixbuf {
    let (width, height) = frame.dimensions();
    let rowstride = width.saturating_mul(4);
    let bytes = gtk4::glib::Bytes::from_owned(frame.into_raw());
    gtk4::gdk_pixbuf::Pixbuf::from_bytes(
        &bytes,
        gtk4::gdk_pixbuf::Colorspace::Rgb,
        true,
        8,
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
        i32::try_from(rowstride).unwrap_or(i32::MAX),
    )
}

fn after_route(actions: &AppActions, outcome: RouteOutcome) {
    if outcome.changed() {
        actions.refresh_views();
    }
}

fn connect_draw(actions: &AppActions, pane: PaneId) {
    let canvas = actions.layout.canvas(pane).clone();
    let inspector = actions.inspector.clone();
    canvas.set_draw_func(move |_, context, width, height| {
        if width <= 0 || height <= 0 {
            return;
        }
        let frame = inspector
            .borrow_mut()
            .render(pane, ContainerSize::from_allocation(width, height));
        let pixbuf = frame_pixbuf(frame);
        context.set_source_pixbuf(&pixbuf, 0.0, 0.0);
        if let Err(err) = context.paint() {
            tracing::warn!(pane = pane.label(), ?err, "failed to paint viewport frame");
        }
    });

    let inspector = actions.inspector.clone();
    canvas.connect_resize(move |_, width, height| {
        inspector
            .borrow_mut()
            .resize(pane, ContainerSize::from_allocation(width, height));
    });
}

fn connect_wheel_zoom(actions: &AppActions, pane: PaneId, pointer: Rc<Cell<ViewPoint>>) {
    let canvas = actions.layout.canvas(pane).clone();

    let motion = gtk4::EventControllerMotion::new();
    let pointer_for_motion = pointer.clone();
    motion.connect_motion(move |_, x, y| {
        pointer_for_motion.set(pointer_position(x, y));
    });
    canvas.add_controller(motion);

    let zoom_scroll = gtk4::EventControllerScroll::new(
        gtk4::EventControllerScrollFlags::BOTH_AXES | gtk4::EventControllerScrollFlags::DISCRETE,
    );
    zoom_scroll.set_propagation_phase(gtk4::PropagationPhase::Capture);
    let actions = actions.clone();
    zoom_scroll.connect_scroll(move |controller, _, dy| {
        let Some(delta) = wheel_delta(dy) else {
            return gtk4::glib::Propagation::Proceed;
        };
        let event = PointerEvent::Wheel {
            delta,
            position: pointer.get(),
            modifiers: modifier_state(controller.current_event_state()),
        };
        let outcome = actions.inspector.borrow_mut().handle_pointer(pane, event);
        after_route(&actions, outcome);
        if outcome == RouteOutcome::Ignored {
            gtk4::glib::Propagation::Proceed
        } else {
            gtk4::glib::Propagation::Stop
        }
    });
    canvas.add_controller(zoom_scroll);
}

fn connect_drag_pan(actions: &AppActions, pane: PaneId) {
    let canvas = actions.layout.canvas(pane).clone();
    let drag_origin = Rc::new(Cell::new((0.0_f64, 0.0_f64)));
    let pan_drag_gesture = gtk4::GestureDrag::new();
    pan_drag_gesture.set_button(gtk4::gdk::BUTTON_PRIMARY);

    let begin_actions = actions.clone();
    let begin_origin = drag_origin.clone();
    pan_drag_gesture.connect_drag_begin(move |_, x, y| {
        begin_origin.set((x, y));
        let outcome = begin_actions.inspector.borrow_mut().handle_pointer(
            pane,
            PointerEvent::Press {
                position: pointer_position(x, y),
            },
        );
        after_route(&begin_actions, outcome);
    });

    let update_actions = actions.clone();
    let update_origin = drag_origin;
    pan_drag_gesture.connect_drag_update(move |_, offset_x, offset_y| {
        let (origin_x, origin_y) = update_origin.get();
        let outcome = update_actions.inspector.borrow_mut().handle_pointer(
            pane,
            PointerEvent::Motion {
                position: pointer_position(origin_x + offset_x, origin_y + offset_y),
            },
        );
        after_route(&update_actions, outcome);
    });

    let end_actions = actions.clone();
    pan_drag_gesture.connect_drag_end(move |_, _, _| {
        end_actions
            .inspector
            .borrow_mut()
            .handle_pointer(pane, PointerEvent::Release);
    });

    canvas.add_controller(pan_drag_gesture);
}

/// Hooks drawing, resize, wheel zoom and drag pan for one pane.
pub(super) fn connect_pane_canvas(actions: &AppActions, pane: PaneId) {
    let pointer = Rc::new(Cell::new(ViewPoint::origin()));
    connect_draw(actions, pane);
    connect_wheel_zoom(actions, pane, pointer);
    connect_drag_pan(actions, pane);
}
