use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Button, DrawingArea, Frame, Label, Orientation, ToggleButton};

use crate::mirror::PaneId;

const CANVAS_MIN_SIZE: i32 = 240;
const LAYOUT_SPACING: i32 = 8;

#[derive(Clone)]
pub(super) struct MainLayout {
    pub(super) root: GtkBox,
    pub(super) source_canvas: DrawingArea,
    pub(super) result_canvas: DrawingArea,
    pub(super) source_zoom_label: Label,
    pub(super) result_zoom_label: Label,
    pub(super) status_label: Label,
    pub(super) paste_button: Button,
    pub(super) remove_button: Button,
    pub(super) copy_button: Button,
    pub(super) reveal_button: Button,
    pub(super) mirror_toggle: ToggleButton,
}

impl MainLayout {
    pub(super) fn canvas(&self, pane: PaneId) -> &DrawingArea {
        match pane {
            PaneId::Source => &self.source_canvas,
            PaneId::Result => &self.result_canvas,
        }
    }

    pub(super) fn zoom_label(&self, pane: PaneId) -> &Label {
        match pane {
            PaneId::Source => &self.source_zoom_label,
            PaneId::Result => &self.result_zoom_label,
        }
    }
}

pub(super) fn pane_title(pane: PaneId) -> &'static str {
    match pane {
        PaneId::Source => "Original",
        PaneId::Result => "Background removed",
    }
}

pub(super) fn zoom_label_text(pane: PaneId, zoom_percent: Option<u32>) -> String {
    match zoom_percent {
        Some(percent) => format!("{} · {percent}%", pane_title(pane)),
        None => pane_title(pane).to_string(),
    }
}

fn build_pane(pane: PaneId) -> (Frame, DrawingArea, Label) {
    let canvas = DrawingArea::new();
    canvas.set_hexpand(true);
    canvas.set_vexpand(true);
    canvas.set_content_width(CANVAS_MIN_SIZE);
    canvas.set_content_height(CANVAS_MIN_SIZE);
    canvas.set_focusable(true);

    let label = Label::new(Some(pane_title(pane)));
    label.set_halign(Align::Start);

    let column = GtkBox::new(Orientation::Vertical, 4);
    column.append(&label);
    column.append(&canvas);

    let frame = Frame::new(None);
    frame.set_child(Some(&column));
    frame.set_hexpand(true);
    frame.set_vexpand(true);
    (frame, canvas, label)
}

pub(super) fn build_main_layout(mirror_active: bool) -> MainLayout {
    let root = GtkBox::new(Orientation::Vertical, LAYOUT_SPACING);
    root.set_margin_top(LAYOUT_SPACING);
    root.set_margin_bottom(LAYOUT_SPACING);
    root.set_margin_start(LAYOUT_SPACING);
    root.set_margin_end(LAYOUT_SPACING);

    let toolbar = GtkBox::new(Orientation::Horizontal, LAYOUT_SPACING);
    let paste_button = Button::with_label("Paste");
    paste_button.set_tooltip_text(Some("Paste an image from the clipboard (Ctrl+V)"));
    let remove_button = Button::with_label("Remove Background");
    remove_button.set_tooltip_text(Some("Run background removal (Ctrl+Enter)"));
    let copy_button = Button::with_label("Copy Result");
    copy_button.set_tooltip_text(Some("Copy the processed image (Ctrl+C)"));
    let reveal_button = Button::with_label("Show in Folder");
    reveal_button.set_tooltip_text(Some("Open the saved result's folder (Ctrl+O)"));
    let mirror_toggle = ToggleButton::with_label("Sync Views");
    mirror_toggle.set_tooltip_text(Some("Mirror zoom and pan between panes (Ctrl+L)"));
    mirror_toggle.set_active(mirror_active);
    for widget in [&paste_button, &remove_button, &copy_button, &reveal_button] {
        toolbar.append(widget);
    }
    toolbar.append(&mirror_toggle);

    let panes = GtkBox::new(Orientation::Horizontal, LAYOUT_SPACING);
    panes.set_homogeneous(true);
    let (source_frame, source_canvas, source_zoom_label) = build_pane(PaneId::Source);
    let (result_frame, result_canvas, result_zoom_label) = build_pane(PaneId::Result);
    panes.append(&source_frame);
    panes.append(&result_frame);

    let status_label = Label::new(None);
    status_label.set_halign(Align::Start);
    status_label.set_wrap(true);

    root.append(&toolbar);
    root.append(&panes);
    root.append(&status_label);

    MainLayout {
        root,
        source_canvas,
        result_canvas,
        source_zoom_label,
        result_zoom_label,
        status_label,
        paste_button,
        remove_button,
        copy_button,
        reveal_button,
        mirror_toggle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_label_text_includes_percent_only_for_loaded_panes() {
        assert_eq!(zoom_label_text(PaneId::Source, None), "Original");
        assert_eq!(
            zoom_label_text(PaneId::Result, Some(146)),
            "Background removed · 146%"
        );
    }
}
