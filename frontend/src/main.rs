mod api;
mod components;
mod history;
mod models;
mod session;
mod state;
mod transcript;
mod ws;

use leptos::prelude::*;
use leptos::mount::mount_to_body;

use components::chat::ChatArea;
use components::recording::RecordingBar;
use state::AppState;

/// Root application component.
#[component]
fn App() -> impl IntoView {
    let state = AppState::provide();

    // Open the conversation socket on mount
    state.connect();

    view! {
        <div class="app-container">
            <RecordingBar />
            <ChatArea />
        </div>
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
