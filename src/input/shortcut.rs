#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self { ctrl, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub processing: bool,
    pub has_source: bool,
    pub has_result: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Paste,
    CopyResult,
    CopySource,
    RemoveBackground,
    ResetView,
    ToggleMirror,
    RevealOutput,
}

fn resolve_ctrl_shortcut(
    key: ShortcutKey,
    shift: bool,
    context: InputContext,
) -> Option<ShortcutAction> {
    match (key, shift) {
        (ShortcutKey::Character('v'), false) => Some(ShortcutAction::Paste),
        (ShortcutKey::Character('c'), false) if context.has_result => {
            Some(ShortcutAction::CopyResult)
        }
        (ShortcutKey::Character('c'), true) if context.has_source => {
            Some(ShortcutAction::CopySource)
        }
        (ShortcutKey::Character('0'), _) => Some(ShortcutAction::ResetView),
        (ShortcutKey::Character('l'), false) => Some(ShortcutAction::ToggleMirror),
        (ShortcutKey::Character('o'), false) if context.has_result => {
            Some(ShortcutAction::RevealOutput)
        }
        (ShortcutKey::Enter, false) if context.has_source && !context.processing => {
            Some(ShortcutAction::RemoveBackground)
        }
        _ => None,
    }
}

pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if modifiers.ctrl {
        return resolve_ctrl_shortcut(key, modifiers.shift, context);
    }

    match key {
        ShortcutKey::Escape => Some(ShortcutAction::ResetView),
        _ => None,
    }
}
