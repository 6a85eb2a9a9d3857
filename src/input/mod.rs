mod modifier;
mod router;
mod shortcut;

pub use modifier::{ModifierState, ZoomModifier};
pub use router::{
    InputRouter, PointerEvent, RouteOutcome, WHEEL_ZOOM_IN_FACTOR, WHEEL_ZOOM_OUT_FACTOR,
};
pub use shortcut::{
    resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers,
};
