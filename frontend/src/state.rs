use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::Value;

use crate::api::{self, PageConfig};
use crate::history::CommandHistory;
use crate::models::{ChatMessage, UserCommand};
use crate::session::ConnectionState;
use crate::transcript::{Applied, Transcript};
use crate::ws::ChatSocket;

/// Shared application state, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub transcript: ReadSignal<Transcript>,
    pub connection: ReadSignal<ConnectionState>,
    pub thinking: ReadSignal<bool>,
    pub input: ReadSignal<String>,
    /// `None` until the server reports a conversation.
    pub recording: ReadSignal<Option<bool>>,
    pub error: ReadSignal<Option<String>>,

    // --- Write signals (for mutating state) ---
    pub set_transcript: WriteSignal<Transcript>,
    pub set_connection: WriteSignal<ConnectionState>,
    pub set_thinking: WriteSignal<bool>,
    pub set_input: WriteSignal<String>,
    pub set_recording: WriteSignal<Option<bool>>,
    pub set_error: WriteSignal<Option<String>>,

    history: StoredValue<CommandHistory>,
    config: StoredValue<PageConfig>,
    socket: StoredValue<Option<ChatSocket>, LocalStorage>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (transcript, set_transcript) = signal(Transcript::new());
        let (connection, set_connection) = signal(ConnectionState::Disconnected);
        let (thinking, set_thinking) = signal(false);
        let (input, set_input) = signal(String::new());
        let (recording, set_recording) = signal(None::<bool>);
        let (error, set_error) = signal(None::<String>);

        let state = Self {
            transcript,
            connection,
            thinking,
            input,
            recording,
            error,
            set_transcript,
            set_connection,
            set_thinking,
            set_input,
            set_recording,
            set_error,
            history: StoredValue::new(CommandHistory::new()),
            config: StoredValue::new(PageConfig::from_body()),
            socket: StoredValue::new_local(None),
        };

        provide_context(state);
        state
    }

    pub fn config(&self) -> PageConfig {
        self.config.get_value()
    }

    pub fn is_open(&self) -> bool {
        self.connection.get() == ConnectionState::Open
    }

    /// Opens the conversation socket; it reconnects on its own from then on.
    pub fn connect(&self) {
        let state = *self;

        let on_message = move |message: ChatMessage| {
            state.set_thinking.set(false);
            let mut applied = Applied::default();
            state.set_transcript.update(|t| applied = t.apply(message));
            if let Some(text) = applied.input {
                state.set_input.set(text);
            }
            if applied.scroll {
                maybe_scroll();
            }
        };

        let on_state = move |connection: ConnectionState| {
            state.set_connection.set(connection);
            state.set_thinking.set(false);
            if connection == ConnectionState::Open {
                state.refresh_recording();
            }
        };

        let socket = ChatSocket::open(self.config().ws_url(), on_message, on_state);
        self.socket.set_value(Some(socket));
    }

    /// Sends a command and shows the thinking indicator until the next frame.
    pub fn send(&self, command: UserCommand) {
        let result = self.socket.with_value(|socket| match socket {
            Some(socket) => socket.send(&command),
            None => Err("Not connected".to_string()),
        });
        match result {
            Ok(()) => self.set_thinking.set(true),
            Err(e) => log::warn!("Dropping command while disconnected: {e}"),
        }
    }

    /// Submits the input box.
    pub fn submit(&self) {
        let text = self.input.get_untracked();
        if text.trim().is_empty() {
            return;
        }
        self.history.update_value(|h| h.submit(&text));
        self.set_input.set(String::new());

        match UserCommand::from_input(&text) {
            Ok(command) => self.send(command),
            Err(e) => self.set_error.set(Some(e)),
        }
    }

    pub fn choose(&self, idx: usize) {
        self.send(UserCommand::choice(idx));
    }

    pub fn press_button(&self, json: Value) {
        self.send(UserCommand::Parsed { json });
    }

    pub fn special(&self, name: &str) {
        self.send(UserCommand::special(name));
    }

    pub fn history_older(&self) {
        let current = self.input.get_untracked();
        let mut next = None;
        self.history.update_value(|h| next = h.older(&current));
        if let Some(text) = next {
            self.set_input.set(text);
        }
    }

    pub fn history_newer(&self) {
        let current = self.input.get_untracked();
        let mut next = None;
        self.history.update_value(|h| next = h.newer(&current));
        if let Some(text) = next {
            self.set_input.set(text);
        }
    }

    // --- Recording ---

    pub fn refresh_recording(&self) {
        let state = *self;
        spawn_local(async move {
            match api::fetch_recording_status(&state.config()).await {
                Ok(status) => state.set_recording.set(status),
                Err(e) => {
                    log::error!("Failed to fetch recording status: {e}");
                    state.set_error.set(Some(e));
                }
            }
        });
    }

    /// Runs a recording route, then re-reads the status.
    pub fn recording_action(&self, action: &'static str) {
        let state = *self;
        self.set_error.set(None);
        spawn_local(async move {
            if let Err(e) = api::recording_action(&state.config(), action).await {
                log::error!("Recording action {action} failed: {e}");
                state.set_error.set(Some(e));
            }
            state.refresh_recording();
        });
    }

    pub fn comment(&self, text: String) {
        let state = *self;
        self.set_error.set(None);
        spawn_local(async move {
            if let Err(e) = api::send_comment(&state.config(), &text).await {
                log::error!("Failed to send comment: {e}");
                state.set_error.set(Some(e));
            }
        });
    }
}

/// Milliseconds after a frame at which the transcript is scrolled down. The
/// first pass waits for the new node to be rendered; the second catches
/// images that change the layout once loaded.
const SCROLL_PASSES_MS: [u32; 2] = [0, 1_000];

/// Keeps the newest message in view while the user is typing.
fn maybe_scroll() {
    let focused = document()
        .active_element()
        .map(|el| el.id() == "input")
        .unwrap_or(false);
    if !focused {
        return;
    }
    for delay in SCROLL_PASSES_MS {
        Timeout::new(delay, scroll_chat).forget();
    }
}

fn scroll_chat() {
    if let Some(chat) = document().get_element_by_id("conversation") {
        chat.set_scroll_top(chat.scroll_height());
    }
}
