use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, WebSocket};

use crate::models::{ChatMessage, UserCommand};
use crate::session::{ConnectionState, Reconnect};

type MessageHandler = Rc<dyn Fn(ChatMessage)>;
type StateHandler = Rc<dyn Fn(ConnectionState)>;

/// Closures attached to the current socket; replaced on every reconnect.
struct Handlers {
    _onmessage: Closure<dyn Fn(MessageEvent)>,
    _onclose: Closure<dyn Fn()>,
}

struct Inner {
    url: String,
    ws: Option<WebSocket>,
    reconnect: Reconnect,
    on_message: MessageHandler,
    on_state: StateHandler,
    handlers: Option<Handlers>,
}

/// The single logical connection to `/api/conversation`. Reconnects forever
/// following [`Reconnect`]; frames are delivered to `on_message` in arrival
/// order.
#[derive(Clone)]
pub struct ChatSocket {
    inner: Rc<RefCell<Inner>>,
}

impl ChatSocket {
    pub fn open(
        url: String,
        on_message: impl Fn(ChatMessage) + 'static,
        on_state: impl Fn(ConnectionState) + 'static,
    ) -> Self {
        let inner = Rc::new(RefCell::new(Inner {
            url,
            ws: None,
            reconnect: Reconnect::default(),
            on_message: Rc::new(on_message),
            on_state: Rc::new(on_state),
            handlers: None,
        }));
        connect(&inner);
        Self { inner }
    }

    /// Sends a command. Fails while the connection is not open.
    pub fn send(&self, command: &UserCommand) -> Result<(), String> {
        let inner = self.inner.borrow();
        let ws = match (&inner.ws, inner.reconnect.is_open()) {
            (Some(ws), true) => ws,
            _ => return Err("Not connected".to_string()),
        };
        let json = serde_json::to_string(command).map_err(|e| format!("Serialize error: {e}"))?;
        log::debug!("sending {json}");
        ws.send_with_str(&json).map_err(|e| format!("Send failed: {e:?}"))
    }
}

fn connect(inner: &Rc<RefCell<Inner>>) {
    let (url, on_state) = {
        let mut guard = inner.borrow_mut();
        guard.reconnect.connecting();
        (guard.url.clone(), guard.on_state.clone())
    };
    on_state(ConnectionState::Connecting);

    let ws = match WebSocket::new(&url) {
        Ok(ws) => ws,
        Err(e) => {
            log::error!("Failed to create WebSocket: {e:?}");
            handle_close(inner);
            return;
        }
    };

    let weak = Rc::downgrade(inner);
    let onmessage = Closure::<dyn Fn(MessageEvent)>::new(move |ev: MessageEvent| {
        if let Some(inner) = weak.upgrade() {
            handle_message(&inner, ev);
        }
    });
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

    let weak = Rc::downgrade(inner);
    let onclose = Closure::<dyn Fn()>::new(move || {
        log::error!("Web socket closed");
        if let Some(inner) = weak.upgrade() {
            handle_close(&inner);
        }
    });
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

    let mut guard = inner.borrow_mut();
    guard.ws = Some(ws);
    guard.handlers = Some(Handlers { _onmessage: onmessage, _onclose: onclose });
}

fn handle_message(inner: &Rc<RefCell<Inner>>, ev: MessageEvent) {
    let (opened, on_message, on_state) = {
        let mut guard = inner.borrow_mut();
        (guard.reconnect.on_message(), guard.on_message.clone(), guard.on_state.clone())
    };
    if opened {
        on_state(ConnectionState::Open);
    }

    let Some(text) = ev.data().as_string() else {
        log::warn!("Ignoring non-text frame");
        return;
    };
    log::debug!("received {text}");
    match serde_json::from_str::<ChatMessage>(&text) {
        Ok(message) => on_message(message),
        Err(e) => log::warn!("Ignoring malformed frame: {e}"),
    }
}

/// Schedules the next connection attempt. The old socket's closures are
/// only replaced from the timer, never while one of them is running.
fn handle_close(inner: &Rc<RefCell<Inner>>) {
    let (delay, on_state) = {
        let mut guard = inner.borrow_mut();
        guard.ws = None;
        (guard.reconnect.on_close(), guard.on_state.clone())
    };
    on_state(ConnectionState::Disconnected);

    let weak: Weak<RefCell<Inner>> = Rc::downgrade(inner);
    Timeout::new(millis(delay), move || {
        if let Some(inner) = weak.upgrade() {
            connect(&inner);
        }
    })
    .forget();
}

fn millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}
