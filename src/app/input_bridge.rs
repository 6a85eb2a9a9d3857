use crate::geometry::ViewPoint;
use crate::input::{ModifierState, ShortcutKey, ShortcutModifiers};

fn shortcut_character_from_keycode(keycode: u32) -> Option<char> {
    // Wayland/XKB keycodes are commonly evdev+8. Handle both to keep shortcuts
    // layout-agnostic under different backends/IME states.
    match keycode {
        47 | 55 => Some('v'),
        46 | 54 => Some('c'),
        24 | 32 => Some('o'),
        11 | 19 => Some('0'),
        _ => None,
    }
}

pub(super) fn normalize_shortcut_key(key: gtk4::gdk::Key, keycode: u32) -> Option<ShortcutKey> {
    if matches!(key, gtk4::gdk::Key::Return | gtk4::gdk::Key::KP_Enter) {
        return Some(ShortcutKey::Enter);
    }
    if key == gtk4::gdk::Key::Escape {
        return Some(ShortcutKey::Escape);
    }
    if matches!(key, gtk4::gdk::Key::KP_0 | gtk4::gdk::Key::KP_Insert) {
        return Some(ShortcutKey::Character('0'));
    }

    let keyval_shortcut = key
        .to_unicode()
        .filter(|character| !character.is_control())
        .map(|character| ShortcutKey::Character(character.to_ascii_lowercase()));
    match keyval_shortcut {
        Some(ShortcutKey::Character(character)) if character.is_ascii() => {
            Some(ShortcutKey::Character(character))
        }
        Some(_) | None => shortcut_character_from_keycode(keycode).map(ShortcutKey::Character),
    }
}

pub(super) fn modifier_state(modifier: gtk4::gdk::ModifierType) -> ModifierState {
    ModifierState {
        ctrl: modifier.contains(gtk4::gdk::ModifierType::CONTROL_MASK),
        shift: modifier.contains(gtk4::gdk::ModifierType::SHIFT_MASK),
        alt: modifier.contains(gtk4::gdk::ModifierType::ALT_MASK),
        super_key: modifier
            .intersects(gtk4::gdk::ModifierType::SUPER_MASK | gtk4::gdk::ModifierType::META_MASK),
    }
}

pub(super) fn shortcut_modifiers(modifier: gtk4::gdk::ModifierType) -> ShortcutModifiers {
    let state = modifier_state(modifier);
    ShortcutModifiers::new(state.ctrl, state.shift)
}

/// GTK reports scrolling down as positive `dy`; the router zooms in on positive deltas.
pub(super) fn wheel_delta(dy: f64) -> Option<f64> {
    if dy == 0.0 || dy.is_nan() {
        None
    } else {
        Some(-dy)
    }
}

pub(super) fn pointer_position(x: f64, y: f64) -> ViewPoint {
    ViewPoint::from_f64(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_shortcut_key_falls_back_to_hardware_keycode_for_letters() {
        assert_eq!(
            normalize_shortcut_key(gtk4::gdk::Key::Hangul, 47),
            Some(ShortcutKey::Character('v'))
        );
        assert_eq!(
            normalize_shortcut_key(gtk4::gdk::Key::Hangul, 55),
            Some(ShortcutKey::Character('v'))
        );
        assert_eq!(
            normalize_shortcut_key(gtk4::gdk::Key::Hangul, 54),
            Some(ShortcutKey::Character('c'))
        );
        assert_eq!(normalize_shortcut_key(gtk4::gdk::Key::Hangul, 999), None);
    }

    #[test]
    fn normalize_shortcut_key_keeps_ascii_from_keyval() {
        assert_eq!(
            normalize_shortcut_key(gtk4::gdk::Key::V, 999),
            Some(ShortcutKey::Character('v'))
        );
        assert_eq!(
            normalize_shortcut_key(gtk4::gdk::Key::Escape, 47),
            Some(ShortcutKey::Escape)
        );
        assert_eq!(
            normalize_shortcut_key(gtk4::gdk::Key::KP_Enter, 0),
            Some(ShortcutKey::Enter)
        );
    }

    #[test]
    fn modifier_state_maps_gdk_masks() {
        let state = modifier_state(
            gtk4::gdk::ModifierType::CONTROL_MASK | gtk4::gdk::ModifierType::META_MASK,
        );
        assert!(state.ctrl);
        assert!(state.super_key);
        assert!(!state.alt);
        assert!(!state.shift);
    }

    #[test]
    fn wheel_delta_inverts_gtk_direction_and_skips_zero() {
        assert_eq!(wheel_delta(-1.0), Some(1.0));
        assert_eq!(wheel_delta(2.0), Some(-2.0));
        assert_eq!(wheel_delta(0.0), None);
    }
}
