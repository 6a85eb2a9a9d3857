//! Source and result panes kept in step, plus the removal session around them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;

use crate::clipboard::ClipboardAccess;
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::geometry::{ContainerSize, ViewTransform};
use crate::ingest::{
    copy_out, drop_into, paste_into, DropPayload, EmptySourceError, IngestOptions, IngestOutcome,
    IngestResult,
};
use crate::input::{InputContext, InputRouter, PointerEvent, RouteOutcome, ZoomModifier};
use crate::mirror::{MirrorOutcome, MirrorPairing, PaneId};
use crate::raster::RasterImage;
use crate::removal::{plan_removal, BackgroundRemover, RemovalJob, RemovalPlan, RemovalSettings};
use crate::state::{SessionEvent, SessionState, StateMachine};
use crate::storage::OutputStore;
use crate::viewport::{Compositor, Viewport, ViewportCapabilities};

#[derive(Debug)]
struct Pane {
    viewport: Viewport,
    router: InputRouter,
    compositor: Compositor,
}

impl Pane {
    fn new(container: ContainerSize, capabilities: ViewportCapabilities, zoom: ZoomModifier) -> Self {
        Self {
            viewport: Viewport::new(container, capabilities),
            router: InputRouter::new(zoom),
            compositor: Compositor::new(),
        }
    }

    fn render(&mut self, container: ContainerSize) -> RgbaImage {
        self.viewport.resize_container(container);
        self.compositor.render(&self.viewport, container)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectorOptions {
    pub zoom_modifier: ZoomModifier,
    pub mirror_views: bool,
    pub ingest: IngestOptions,
    pub removal: RemovalSettings,
    pub container: ContainerSize,
}

impl Default for InspectorOptions {
    fn default() -> Self {
        Self {
            zoom_modifier: ZoomModifier::default(),
            mirror_views: true,
            ingest: IngestOptions::default(),
            removal: RemovalSettings::default(),
            container: ContainerSize::default(),
        }
    }
}

impl From<&AppConfig> for InspectorOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            zoom_modifier: config.zoom_modifier,
            mirror_views: config.mirror_views(),
            ingest: config.ingest_options(),
            removal: config.removal_settings(),
            container: ContainerSize::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStart {
    Submitted,
    /// The source already had transparency and was installed as the result.
    Skipped,
}

#[derive(Debug)]
pub struct Inspector {
    source: Pane,
    result: Pane,
    pairing: Option<MirrorPairing>,
    session: StateMachine,
    ingest: IngestOptions,
    removal: RemovalSettings,
    pending: Option<RemovalJob>,
    last_output: Option<PathBuf>,
}

impl Inspector {
    pub fn new(options: InspectorOptions) -> Self {
        let source = Pane::new(
            options.container,
            ViewportCapabilities::mirror_and_paste(),
            options.zoom_modifier,
        );
        let result = Pane::new(
            options.container,
            ViewportCapabilities::mirror_only(),
            options.zoom_modifier,
        );
        let pairing = MirrorPairing::between(
            (PaneId::Source, &source.viewport),
            (PaneId::Result, &result.viewport),
            options.mirror_views,
        );
        Self {
            source,
            result,
            pairing,
            session: StateMachine::new(),
            ingest: options.ingest,
            removal: options.removal,
            pending: None,
            last_output: None,
        }
    }

    fn pane(&self, id: PaneId) -> &Pane {
        match id {
            PaneId::Source => &self.source,
            PaneId::Result => &self.result,
        }
    }

    fn pane_mut(&mut self, id: PaneId) -> &mut Pane {
        match id {
            PaneId::Source => &mut self.source,
            PaneId::Result => &mut self.result,
        }
    }

    pub fn viewport(&self, id: PaneId) -> &Viewport {
        &self.pane(id).viewport
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_output(&self) -> Option<&Path> {
        self.last_output.as_deref()
    }

    pub fn input_context(&self) -> InputContext {
        InputContext {
            processing: self.session_state().is_processing(),
            has_source: self.source.viewport.has_image(),
            has_result: self.result.viewport.has_image(),
        }
    }

    pub fn mirroring_enabled(&self) -> bool {
        self.pairing.is_some_and(|pairing| pairing.is_enabled())
    }

    pub fn set_mirroring(&mut self, enabled: bool) {
        if let Some(pairing) = self.pairing.as_mut() {
            pairing.set_enabled(enabled);
            tracing::info!(enabled, "view mirroring toggled");
        }
    }

    /// Routes one pointer event to `pane` and mirrors any resulting change once.
    pub fn handle_pointer(&mut self, pane: PaneId, event: PointerEvent) -> RouteOutcome {
        let target = self.pane_mut(pane);
        let outcome = target.router.route(event, &mut target.viewport);
        if outcome.changed() {
            self.mirror_from(pane);
        }
        outcome
    }

    fn mirror_from(&mut self, origin: PaneId) -> Option<MirrorOutcome> {
        let pairing = self.pairing?;
        let partner = pairing.partner_of(origin)?;
        let (origin_pane, partner_pane) = match (origin, partner) {
            (PaneId::Source, PaneId::Result) => (&self.source, &mut self.result),
            (PaneId::Result, PaneId::Source) => (&self.result, &mut self.source),
            _ => return None,
        };
        let outcome = pairing.propagate(&origin_pane.viewport, &mut partner_pane.viewport);
        tracing::trace!(
            origin = origin.label(),
            partner = partner.label(),
            ?outcome,
            "mirror propagation"
        );
        Some(outcome)
    }

    pub fn reset_view(&mut self, pane: PaneId) {
        let target = self.pane_mut(pane);
        target.router.cancel_gesture();
        target.viewport.apply_view(ViewTransform::identity());
        self.mirror_from(pane);
    }

    pub fn resize(&mut self, pane: PaneId, container: ContainerSize) {
        self.pane_mut(pane).viewport.resize_container(container);
    }

    pub fn render(&mut self, pane: PaneId, container: ContainerSize) -> RgbaImage {
        self.pane_mut(pane).render(container)
    }

    pub fn paste(&mut self, clipboard: &dyn ClipboardAccess) -> IngestResult<IngestOutcome> {
        let outcome = paste_into(clipboard, &mut self.source.viewport, self.ingest)?;
        self.after_ingest(outcome);
        Ok(outcome)
    }

    pub fn drop_payload(&mut self, payload: DropPayload<'_>) -> IngestResult<IngestOutcome> {
        let outcome = drop_into(payload, &mut self.source.viewport, self.ingest)?;
        self.after_ingest(outcome);
        Ok(outcome)
    }

    /// Installs an already decoded image, e.g. one named on the command line.
    pub fn load_source(&mut self, image: RasterImage) -> IngestOutcome {
        let image = image.bounded(self.ingest.display_max_edge);
        let (width, height) = image.dimensions();
        self.source.viewport.set_image(image);
        let outcome = IngestOutcome::Installed { width, height };
        self.after_ingest(outcome);
        outcome
    }

    fn after_ingest(&mut self, outcome: IngestOutcome) {
        if !matches!(outcome, IngestOutcome::Installed { .. }) {
            return;
        }
        self.source.router.cancel_gesture();
        self.result.router.cancel_gesture();
        self.result.viewport.clear_image();
        self.last_output = None;
        if self.pending.take().is_some() {
            tracing::info!("discarding in-flight removal for replaced source");
        }
        if let Err(err) = self.session.transition(SessionEvent::ImageLoaded) {
            tracing::warn!(%err, "session rejected image load");
        }
    }

    pub fn copy(&self, pane: PaneId, clipboard: &dyn ClipboardAccess) -> IngestResult<()> {
        copy_out(&self.pane(pane).viewport, clipboard)
    }

    /// Fails with `EmptySourceError` before the remover is touched when no
    /// source image is loaded.
    pub fn begin_removal(&mut self, remover: Arc<dyn BackgroundRemover>) -> AppResult<RemovalStart> {
        let source = self
            .source
            .viewport
            .source()
            .ok_or(EmptySourceError {
                action: "background removal",
            })?;
        let plan = plan_removal(source, self.removal);
        self.session.transition(SessionEvent::RemovalStarted)?;
        match plan {
            RemovalPlan::Skip(image) => {
                tracing::info!("source already transparent; skipping background removal");
                self.deliver_result(image)?;
                Ok(RemovalStart::Skipped)
            }
            RemovalPlan::Submit(image) => {
                self.pending = Some(RemovalJob::spawn(remover, image));
                Ok(RemovalStart::Submitted)
            }
        }
    }

    /// Returns `None` while no finished removal is waiting.
    pub fn poll_removal(&mut self) -> Option<AppResult<()>> {
        let result = self.pending.as_ref()?.try_take()?;
        self.pending = None;
        Some(match result {
            Ok(image) => self.deliver_result(image),
            Err(err) => {
                tracing::warn!(%err, "background removal failed");
                if let Err(state_err) = self.session.transition(SessionEvent::RemovalFailed) {
                    return Some(Err(state_err.into()));
                }
                Err(err.into())
            }
        })
    }

    fn deliver_result(&mut self, image: RasterImage) -> AppResult<()> {
        self.result.router.cancel_gesture();
        self.result.viewport.set_image(image);
        self.session.transition(SessionEvent::RemovalFinished)?;
        Ok(())
    }

    pub fn save_result(&mut self, store: &OutputStore) -> AppResult<PathBuf> {
        let image = self
            .result
            .viewport
            .source()
            .ok_or(EmptySourceError { action: "save" })?;
        let path = store.save_result(image)?;
        self.last_output = Some(path.clone());
        Ok(path)
    }
}
