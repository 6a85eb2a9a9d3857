/// Lifecycle of the image held by the inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Ready,
    Processing,
    Processed,
}

impl SessionState {
    pub const fn can_remove_background(self) -> bool {
        matches!(self, Self::Ready | Self::Processed)
    }

    pub const fn can_reveal_output(self) -> bool {
        matches!(self, Self::Processed)
    }

    pub const fn is_processing(self) -> bool {
        matches!(self, Self::Processing)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Empty => "Paste or drop an image",
            Self::Ready => "Ready",
            Self::Processing => "Removing background…",
            Self::Processed => "Done",
        }
    }
}
