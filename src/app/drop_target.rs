use gtk4::prelude::*;

use crate::ingest::DropPayload;
use crate::mirror::PaneId;
use crate::raster::{PixelLayout, RawPixels};

use super::actions::AppActions;

fn unpremultiply(channel: u8, alpha: u8) -> u8 {
    if alpha == 0 {
        return 0;
    }
    let value = (u32::from(channel) * 255 + u32::from(alpha) / 2) / u32::from(alpha);
    value.min(255) as u8
}

/// Converts GDK's default texture memory layout (premultiplied ARGB32 in native
/// byte order) to straight RGBA8.
fn straight_rgba_from_argb32(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(4)
        .flat_map(|pixel| {
            let argb = u32::from_ne_bytes([pixel[0], pixel[1], pixel[2], pixel[3]]);
            let [alpha, red, green, blue] = argb.to_be_bytes();
            [
                unpremultiply(red, alpha),
                unpremultiply(green, alpha),
                unpremultiply(blue, alpha),
                alpha,
            ]
        })
        .collect()
}

fn texture_rgba(texture: &gtk4::gdk::Texture) -> Option<(u32, u32, Vec<u8>)> {
    let width = u32::try_from(texture.width()).ok()?;
    let height = u32::try_from(texture.height()).ok()?;
    let stride = usize::try_from(width).ok()?.checked_mul(4)?;
    let mut data = vec![0_u8; stride.checked_mul(usize::try_from(height).ok()?)?];
    texture.download(&mut data, stride);
    Some((width, height, straight_rgba_from_argb32(&data)))
}

fn handle_drop(actions: &AppActions, value: &gtk4::glib::Value) -> bool {
    if let Ok(file) = value.get::<gtk4::gio::File>() {
        let Some(path) = file.path() else {
            actions.set_status("Dropped item is not a local file");
            return false;
        };
        tracing::info!(path = %path.display(), "file dropped on source pane");
        return actions.drop_payload(DropPayload::Path(&path));
    }
    if let Ok(texture) = value.get::<gtk4::gdk::Texture>() {
        let Some((width, height, data)) = texture_rgba(&texture) else {
            actions.set_status("Dropped image has an unsupported size");
            return false;
        };
        return actions.drop_payload(DropPayload::Raw(RawPixels {
            width,
            height,
            layout: PixelLayout::Rgba8,
            data: &data,
        }));
    }
    tracing::debug!(value_type = %value.type_(), "unsupported drop payload");
    false
}

/// Accepts dropped files and bitmaps on the source pane.
pub(super) fn connect_drop_target(actions: &AppActions) {
    let drop_target =
        gtk4::DropTarget::new(gtk4::glib::Type::INVALID, gtk4::gdk::DragAction::COPY);
    drop_target.set_types(&[
        gtk4::gio::File::static_type(),
        gtk4::gdk::Texture::static_type(),
    ]);
    let actions_for_drop = actions.clone();
    drop_target.connect_drop(move |_, value, _, _| handle_drop(&actions_for_drop, value));
    actions
        .layout
        .canvas(PaneId::Source)
        .add_controller(drop_target);
}
