use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierState {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub super_key: bool,
}

impl ModifierState {
    pub const fn none() -> Self {
        Self {
            ctrl: false,
            shift: false,
            alt: false,
            super_key: false,
        }
    }

    pub const fn ctrl() -> Self {
        Self {
            ctrl: true,
            shift: false,
            alt: false,
            super_key: false,
        }
    }
}

/// Key that must be held for the wheel to zoom instead of scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomModifier {
    #[default]
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl ZoomModifier {
    pub const fn is_held(self, state: ModifierState) -> bool {
        match self {
            Self::Ctrl => state.ctrl,
            Self::Alt => state.alt,
            Self::Shift => state.shift,
            Self::Super => state.super_key,
        }
    }
}
