use std::cell::RefCell;
use std::rc::{Rc, Weak};

use dioxus::logger::tracing;
use dioxus::prelude::*;
use webview_map_shared::config::MapConfig;
use webview_map_shared::view::{MapView as Session, UiEvent};

use crate::bridge::{self, MessageListener, WebTransport};
use crate::components::debug_panel::DebugPanel;
use crate::leaflet::LeafletWidget;

const MAP_CONTAINER_ID: &str = "map";

type SharedSession = Rc<RefCell<Session<LeafletWidget, WebTransport>>>;
type WeakSession = Weak<RefCell<Session<LeafletWidget, WebTransport>>>;

/// Run `f` against the live session and publish its revision to the UI.
///
/// Events that arrive while the session is already borrowed are dropped with a
/// warning; every caller is a JS callback so this only happens on re-entrancy.
fn with_session(
    weak: &WeakSession,
    mut revision: Signal<u64>,
    f: impl FnOnce(&mut Session<LeafletWidget, WebTransport>),
) {
    let Some(session) = weak.upgrade() else {
        return;
    };
    let Ok(mut session) = session.try_borrow_mut() else {
        tracing::warn!("map view busy, dropping event");
        return;
    };
    f(&mut session);
    let rev = session.revision();
    drop(session);
    revision.set(rev);
}

#[component]
pub fn MapView(config: MapConfig) -> Element {
    let revision = use_signal(|| 0_u64);

    let session: SharedSession = use_hook(|| {
        let config = config.clone();
        Rc::new_cyclic(|weak: &WeakSession| {
            let weak = weak.clone();
            let sink: Rc<dyn Fn(UiEvent)> = Rc::new(move |event: UiEvent| {
                with_session(&weak, revision, |s| s.handle_ui(event));
            });
            let widget = LeafletWidget::new(MAP_CONTAINER_ID, sink);
            RefCell::new(Session::new(config, widget))
        })
    });
    let listener: Rc<RefCell<Option<MessageListener>>> = use_hook(|| Rc::new(RefCell::new(None)));

    // Mount once the container div exists, then start the handshake.
    {
        let session = session.clone();
        let listener = listener.clone();
        let attempts = config.connect_attempts;
        let interval_ms = config.connect_interval_ms;
        use_effect(move || {
            let weak = Rc::downgrade(&session);
            with_session(&weak, revision, |s| {
                let _ = s.mount();
            });

            let listener = listener.clone();
            spawn(async move {
                match bridge::connect(attempts, interval_ms).await {
                    Ok(transport) => {
                        tracing::info!("host channel found: {}", transport.describe());
                        let inbound = weak.clone();
                        match MessageListener::install(move |text| {
                            with_session(&inbound, revision, |s| s.handle_message(&text));
                        }) {
                            Ok(installed) => {
                                *listener.borrow_mut() = Some(installed);
                                with_session(&weak, revision, |s| s.connected(transport));
                            }
                            // Nothing would hear the host, so never announce ready.
                            Err(e) => with_session(&weak, revision, |s| s.connection_failed(&e)),
                        }
                    }
                    Err(e) => with_session(&weak, revision, |s| s.connection_failed(&e)),
                }
            });
        });
    }

    {
        let session = session.clone();
        let listener = listener.clone();
        use_drop(move || {
            listener.borrow_mut().take();
            if let Ok(mut session) = session.try_borrow_mut() {
                session.unmount();
            }
        });
    }

    // Subscribe to session changes.
    let _ = *revision.read();
    let (show_debug, entries) = match session.try_borrow() {
        Ok(s) => (
            s.state().show_debug,
            s.console()
                .entries()
                .iter()
                .map(|e| e.as_str().to_string())
                .collect::<Vec<_>>(),
        ),
        Err(_) => (config.show_debug, Vec::new()),
    };

    rsx! {
        div { class: "webview-container",
            div { id: MAP_CONTAINER_ID, class: "map" }
            if show_debug {
                DebugPanel { entries }
            }
        }
    }
}
