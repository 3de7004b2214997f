//! Browser side of the host bridge.
//!
//! Inside a React Native webview the host injects `window.ReactNativeWebView`;
//! inside an iframe (the devhost simulator) the host is `window.parent`.

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventTarget, MessageEvent, Window};
use webview_map_shared::bridge::{BridgeError, Transport};

pub enum WebTransport {
    ReactNative(JsValue),
    ParentFrame(Window),
}

impl Transport for WebTransport {
    fn post(&self, text: &str) -> Result<(), BridgeError> {
        let message = JsValue::from_str(text);
        match self {
            WebTransport::ReactNative(rn) => {
                let post = js_sys::Reflect::get(rn, &JsValue::from_str("postMessage"))
                    .ok()
                    .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
                    .ok_or_else(|| BridgeError::Post("postMessage went away".to_string()))?;
                post.call1(rn, &message).map_err(js_error)?;
            }
            WebTransport::ParentFrame(parent) => {
                parent.post_message(&message, "*").map_err(js_error)?;
            }
        }
        Ok(())
    }
}

impl WebTransport {
    pub fn describe(&self) -> &'static str {
        match self {
            WebTransport::ReactNative(_) => "react-native",
            WebTransport::ParentFrame(_) => "parent-frame",
        }
    }
}

fn js_error(err: JsValue) -> BridgeError {
    BridgeError::Post(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Look for a host channel once.
fn probe() -> Option<WebTransport> {
    let window = web_sys::window()?;

    if let Ok(rn) = js_sys::Reflect::get(&window, &JsValue::from_str("ReactNativeWebView")) {
        let has_post = js_sys::Reflect::get(&rn, &JsValue::from_str("postMessage"))
            .map(|f| f.is_function())
            .unwrap_or(false);
        if rn.is_object() && has_post {
            return Some(WebTransport::ReactNative(rn));
        }
    }

    let parent = window.parent().ok().flatten()?;
    let framed = AsRef::<JsValue>::as_ref(&parent) != AsRef::<JsValue>::as_ref(&window);
    framed.then_some(WebTransport::ParentFrame(parent))
}

/// Wait for a host channel, probing every `interval_ms` up to `attempts` times.
pub async fn connect(attempts: u32, interval_ms: u32) -> Result<WebTransport, BridgeError> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(transport) = probe() {
            return Ok(transport);
        }
        if attempt < attempts {
            TimeoutFuture::new(interval_ms).await;
        }
    }
    Err(BridgeError::Unavailable { attempts })
}

/// `message` listener on both `window` and `document`. Android webviews
/// deliver host messages on `document`, iOS and iframes on `window`.
/// Removed again on drop.
pub struct MessageListener {
    targets: Vec<EventTarget>,
    callback: Closure<dyn FnMut(MessageEvent)>,
}

impl MessageListener {
    pub fn install(mut on_message: impl FnMut(String) + 'static) -> Result<Self, BridgeError> {
        let window = web_sys::window().ok_or(BridgeError::NotConnected)?;
        let document = window.document().ok_or(BridgeError::NotConnected)?;

        let callback = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let data = event.data();
            let text = data.as_string().or_else(|| {
                js_sys::JSON::stringify(&data)
                    .ok()
                    .and_then(|s| s.as_string())
            });
            if let Some(text) = text {
                on_message(text);
            }
        });

        let targets: Vec<EventTarget> = vec![window.into(), document.into()];
        for target in &targets {
            target
                .add_event_listener_with_callback("message", callback.as_ref().unchecked_ref())
                .map_err(js_error)?;
        }
        Ok(Self { targets, callback })
    }
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        for target in &self.targets {
            let _ = target.remove_event_listener_with_callback(
                "message",
                self.callback.as_ref().unchecked_ref(),
            );
        }
    }
}
