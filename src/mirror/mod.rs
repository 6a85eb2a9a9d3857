//! Pairing of two viewports whose zoom and pan follow each other.

use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneId {
    Source,
    Result,
}

impl PaneId {
    pub const ALL: [Self; 2] = [Self::Source, Self::Result];

    pub const fn other(self) -> Self {
        match self {
            Self::Source => Self::Result,
            Self::Result => Self::Source,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Result => "result",
        }
    }
}

/// Symmetric relation between two panes. Neither pane owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorPairing {
    first: PaneId,
    second: PaneId,
    enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Copied,
    PartnerEmpty,
    Disabled,
}

impl MirrorPairing {
    /// Returns `None` unless both viewports opted into mirroring.
    pub fn between(
        first: (PaneId, &Viewport),
        second: (PaneId, &Viewport),
        enabled: bool,
    ) -> Option<Self> {
        if first.0 == second.0 {
            return None;
        }
        if !first.1.capabilities().mirrorable || !second.1.capabilities().mirrorable {
            tracing::debug!("mirror pairing refused: pane is not mirrorable");
            return None;
        }
        Some(Self {
            first: first.0,
            second: second.0,
            enabled,
        })
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn partner_of(&self, pane: PaneId) -> Option<PaneId> {
        if pane == self.first {
            Some(self.second)
        } else if pane == self.second {
            Some(self.first)
        } else {
            None
        }
    }

    /// Copies the origin's resulting transform onto the partner. The partner is
    /// written directly, so nothing is routed back to the origin.
    pub fn propagate(&self, origin: &Viewport, partner: &mut Viewport) -> MirrorOutcome {
        if !self.enabled {
            return MirrorOutcome::Disabled;
        }
        if !partner.has_image() {
            return MirrorOutcome::PartnerEmpty;
        }
        partner.apply_view(origin.view());
        MirrorOutcome::Copied
    }
}
