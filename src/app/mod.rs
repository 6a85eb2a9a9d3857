use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow};

use crate::clipboard::WlClipboard;
use crate::input::resolve_shortcut;
use crate::inspector::{Inspector, InspectorOptions};
use crate::mirror::PaneId;

mod actions;
mod bootstrap;
mod canvas;
mod drop_target;
mod input_bridge;
mod layout;
mod worker;

use self::actions::AppActions;
use self::bootstrap::{bootstrap_app_runtime, AppBootstrap, StartupConfig};
use self::canvas::connect_pane_canvas;
use self::drop_target::connect_drop_target;
use self::input_bridge::{normalize_shortcut_key, shortcut_modifiers};
use self::layout::build_main_layout;

const APP_ID: &str = "io.github.cutout";
const WINDOW_DEFAULT_WIDTH: i32 = 1100;
const WINDOW_DEFAULT_HEIGHT: i32 = 640;

fn connect_buttons(actions: &AppActions) {
    let paste_actions = actions.clone();
    actions
        .layout
        .paste_button
        .connect_clicked(move |_| paste_actions.paste());

    let remove_actions = actions.clone();
    actions
        .layout
        .remove_button
        .connect_clicked(move |_| remove_actions.remove_background());

    let copy_actions = actions.clone();
    actions
        .layout
        .copy_button
        .connect_clicked(move |_| copy_actions.copy(PaneId::Result));

    let reveal_actions = actions.clone();
    actions
        .layout
        .reveal_button
        .connect_clicked(move |_| reveal_actions.reveal_output());

    let mirror_actions = actions.clone();
    actions
        .layout
        .mirror_toggle
        .connect_toggled(move |toggle| mirror_actions.set_mirroring(toggle.is_active()));
}

fn connect_shortcuts(window: &ApplicationWindow, actions: &AppActions) {
    let key_controller = gtk4::EventControllerKey::new();
    let actions = actions.clone();
    key_controller.connect_key_pressed(move |_, key, keycode, modifier| {
        let Some(shortcut_key) = normalize_shortcut_key(key, keycode) else {
            return gtk4::glib::Propagation::Proceed;
        };
        let context = actions.inspector.borrow().input_context();
        match resolve_shortcut(shortcut_key, shortcut_modifiers(modifier), context) {
            Some(action) => {
                actions.dispatch_shortcut(action);
                gtk4::glib::Propagation::Stop
            }
            None => gtk4::glib::Propagation::Proceed,
        }
    });
    window.add_controller(key_controller);
}

fn build_main_window(app: &Application, bootstrap: AppBootstrap) {
    let AppBootstrap {
        startup_config,
        app_config,
        output_store,
        remover,
    } = bootstrap;

    let window = ApplicationWindow::new(app);
    window.set_title(Some("Cutout"));
    window.set_default_size(WINDOW_DEFAULT_WIDTH, WINDOW_DEFAULT_HEIGHT);

    let layout = build_main_layout(app_config.mirror_views());
    window.set_child(Some(&layout.root));

    let actions = AppActions {
        inspector: Rc::new(RefCell::new(Inspector::new(InspectorOptions::from(
            &app_config,
        )))),
        clipboard: Rc::new(WlClipboard),
        remover,
        output_store: Rc::new(output_store),
        layout,
    };

    connect_buttons(&actions);
    for pane in PaneId::ALL {
        connect_pane_canvas(&actions, pane);
    }
    connect_drop_target(&actions);
    connect_shortcuts(&window, &actions);

    match startup_config.image_path.as_deref() {
        Some(path) => actions.open_path(path),
        None => {
            actions.set_status("Paste (Ctrl+V) or drop an image to begin");
            actions.refresh();
        }
    }

    window.present();
}

/// Runs the GTK main loop until the window closes.
pub fn run(image_path: Option<PathBuf>) -> gtk4::glib::ExitCode {
    let application = Application::new(Some(APP_ID), gtk4::gio::ApplicationFlags::NON_UNIQUE);
    let bootstrap = Rc::new(RefCell::new(Some(bootstrap_app_runtime(StartupConfig {
        image_path,
    }))));

    application.connect_activate(move |app| {
        let Some(bootstrap) = bootstrap.borrow_mut().take() else {
            tracing::debug!("ignoring duplicate gtk activate signal");
            return;
        };
        build_main_window(app, bootstrap);
    });

    tracing::info!("starting gtk runtime");
    // Arguments were already parsed by clap; GTK would reject the image path.
    application.run_with_args::<&str>(&[])
}
