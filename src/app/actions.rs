use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use gtk4::prelude::*;

use crate::clipboard::WlClipboard;
use crate::error::AppResult;
use crate::ingest::{DropPayload, IngestError, IngestOutcome, IngestResult};
use crate::input::ShortcutAction;
use crate::inspector::{Inspector, RemovalStart};
use crate::mirror::PaneId;
use crate::raster::RasterImage;
use crate::removal::BackgroundRemover;
use crate::storage::{reveal_in_file_manager, OutputStore};

use super::layout::{zoom_label_text, MainLayout};
use super::worker::poll_until_ready;

#[derive(Clone)]
pub(super) struct AppActions {
    pub(super) inspector: Rc<RefCell<Inspector>>,
    pub(super) clipboard: Rc<WlClipboard>,
    pub(super) remover: Arc<dyn BackgroundRemover>,
    pub(super) output_store: Rc<Option<OutputStore>>,
    pub(super) layout: MainLayout,
}

impl AppActions {
    pub(super) fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(status = %message, "status updated");
        self.layout.status_label.set_text(&message);
    }

    fn report_failure(&self, prefix: &str, err: impl std::fmt::Display) {
        let message = format!("{prefix}: {err}");
        tracing::warn!("{message}");
        self.set_status(message.clone());
        crate::notification::send(message);
    }

    /// Redraws both panes; mirroring may have touched either one.
    pub(super) fn refresh_views(&self) {
        let inspector = self.inspector.borrow();
        for pane in PaneId::ALL {
            let viewport = inspector.viewport(pane);
            let percent = viewport.has_image().then(|| viewport.zoom_percent());
            self.layout
                .zoom_label(pane)
                .set_text(&zoom_label_text(pane, percent));
            self.layout.canvas(pane).queue_draw();
        }
    }

    pub(super) fn refresh(&self) {
        {
            let inspector = self.inspector.borrow();
            let state = inspector.session_state();
            let context = inspector.input_context();
            self.layout.paste_button.set_sensitive(true);
            self.layout
                .remove_button
                .set_sensitive(state.can_remove_background());
            self.layout.copy_button.set_sensitive(context.has_result);
            self.layout
                .reveal_button
                .set_sensitive(state.can_reveal_output() && self.output_store.is_some());
        }
        self.refresh_views();
    }

    fn report_ingest(&self, origin: &str, result: IngestResult<IngestOutcome>) {
        match result {
            Ok(IngestOutcome::Installed { width, height }) => {
                self.set_status(format!("Loaded {width}×{height} image from {origin}"));
            }
            Ok(IngestOutcome::Empty) => self.set_status("Clipboard has no image"),
            Ok(IngestOutcome::Rejected) => self.set_status("This pane does not accept images"),
            Err(err) => self.report_failure(&format!("Could not load image from {origin}"), err),
        }
        self.refresh();
    }

    pub(super) fn paste(&self) {
        let result = self.inspector.borrow_mut().paste(self.clipboard.as_ref());
        self.report_ingest("clipboard", result);
    }

    pub(super) fn drop_payload(&self, payload: DropPayload<'_>) -> bool {
        let result = self.inspector.borrow_mut().drop_payload(payload);
        let accepted = matches!(result, Ok(IngestOutcome::Installed { .. }));
        self.report_ingest("drop", result);
        accepted
    }

    pub(super) fn open_path(&self, path: &Path) {
        tracing::info!(path = %path.display(), "loading image named on the command line");
        let result = RasterImage::decode_path(path)
            .map(|image| self.inspector.borrow_mut().load_source(image))
            .map_err(IngestError::from);
        self.report_ingest("command line", result);
    }

    pub(super) fn copy(&self, pane: PaneId) {
        let result = self.inspector.borrow().copy(pane, self.clipboard.as_ref());
        match result {
            Ok(()) => self.set_status(format!("Copied {} image", pane.label())),
            Err(err) => self.report_failure("Copy failed", err),
        }
    }

    pub(super) fn remove_background(&self) {
        let start = self
            .inspector
            .borrow_mut()
            .begin_removal(self.remover.clone());
        match start {
            Ok(RemovalStart::Submitted) => {
                self.set_status("Removing background…");
                self.refresh();
                let inspector = self.inspector.clone();
                let actions = self.clone();
                poll_until_ready(
                    move || {
                        let mut inspector = inspector.borrow_mut();
                        match inspector.poll_removal() {
                            Some(result) => Some(Some(result)),
                            // Superseded by a newly loaded source.
                            None if !inspector.is_processing() => Some(None),
                            None => None,
                        }
                    },
                    move |result| match result {
                        Some(result) => actions.finish_removal(result),
                        None => tracing::info!("removal result dropped for replaced source"),
                    },
                );
            }
            Ok(RemovalStart::Skipped) => {
                self.set_status("Image already has transparency; kept as result");
                self.finish_removal(Ok(()));
            }
            Err(err) => self.report_failure("Background removal failed", err),
        }
    }

    fn finish_removal(&self, result: AppResult<()>) {
        if let Err(err) = result {
            self.report_failure("Background removal failed", err);
            self.refresh();
            return;
        }
        let Some(store) = self.output_store.as_ref().as_ref() else {
            self.set_status("Background removed (saving disabled)");
            self.refresh();
            return;
        };
        let saved = self.inspector.borrow_mut().save_result(store);
        match saved {
            Ok(path) => {
                self.set_status(format!("Saved {}", path.display()));
                crate::notification::send(format!("Background removed: {}", path.display()));
            }
            Err(err) => self.report_failure("Saving result failed", err),
        }
        self.refresh();
    }

    pub(super) fn reveal_output(&self) {
        let target = {
            let inspector = self.inspector.borrow();
            inspector
                .last_output()
                .map(Path::to_path_buf)
                .or_else(|| {
                    self.output_store
                        .as_ref()
                        .as_ref()
                        .map(|store| store.output_dir().to_path_buf())
                })
        };
        let Some(target) = target else {
            self.set_status("Nothing saved yet");
            return;
        };
        if let Err(err) = reveal_in_file_manager(&target) {
            self.report_failure("Could not open file manager", err);
        }
    }

    pub(super) fn set_mirroring(&self, enabled: bool) {
        self.inspector.borrow_mut().set_mirroring(enabled);
        self.set_status(if enabled {
            "Views synchronized"
        } else {
            "Views independent"
        });
    }

    pub(super) fn toggle_mirroring(&self) {
        let enabled = !self.inspector.borrow().mirroring_enabled();
        // The toggle's handler applies the change.
        self.layout.mirror_toggle.set_active(enabled);
    }

    pub(super) fn reset_view(&self) {
        {
            let mut inspector = self.inspector.borrow_mut();
            for pane in PaneId::ALL {
                inspector.reset_view(pane);
            }
        }
        self.refresh_views();
    }

    pub(super) fn dispatch_shortcut(&self, action: ShortcutAction) {
        tracing::debug!(?action, "shortcut action");
        match action {
            ShortcutAction::Paste => self.paste(),
            ShortcutAction::CopyResult => self.copy(PaneId::Result),
            ShortcutAction::CopySource => self.copy(PaneId::Source),
            ShortcutAction::RemoveBackground => self.remove_background(),
            ShortcutAction::ResetView => self.reset_view(),
            ShortcutAction::ToggleMirror => self.toggle_mirroring(),
            ShortcutAction::RevealOutput => self.reveal_output(),
        }
    }
}
