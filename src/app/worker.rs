use std::time::Duration;

pub(super) const ACTION_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

/// Polls `poll` on the GTK main loop until it yields a value, then hands it to
/// `on_result` once.
pub(super) fn poll_until_ready<T, P, H>(mut poll: P, mut on_result: H)
where
    T: 'static,
    P: FnMut() -> Option<T> + 'static,
    H: FnMut(T) + 'static,
{
    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || match poll() {
        Some(result) => {
            on_result(result);
            gtk4::glib::ControlFlow::Break
        }
        None => gtk4::glib::ControlFlow::Continue,
    });
}
