use leptos::ev;
use leptos::prelude::*;

use crate::session::ConnectionState;
use crate::state::AppState;
use crate::transcript::{Entry, GridItem, Node};

/// Transcript of the conversation followed by the input form.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <main class="chat-area">
            // Error banner
            {move || {
                state.error.get().map(|err| {
                    view! {
                        <div class="error-banner">{err}</div>
                    }
                })
            }}

            <div id="conversation" class="messages-container">
                <For
                    each=move || state.transcript.with(|t| t.nodes().to_vec())
                    key=|node| node.id
                    let:node
                >
                    {render_node(state, node)}
                </For>
            </div>

            <ChatInput />
        </main>
    }
}

fn render_node(state: AppState, node: Node) -> AnyView {
    match node.entry {
        Entry::Text { text, icon } => view! {
            <AlmondMessage icon=icon>
                <div class="message message-text">{text}</div>
            </AlmondMessage>
        }
        .into_any(),
        Entry::Picture { url, icon } => view! {
            <AlmondMessage icon=icon>
                <img class="message message-picture" src=url />
            </AlmondMessage>
        }
        .into_any(),
        Entry::Rdl { rdl, icon } => view! {
            <AlmondMessage icon=icon>
                <a class="message message-rdl" href=rdl.web_callback target="_blank" rel="noopener">
                    <h4>{rdl.display_title}</h4>
                    <p>{rdl.display_text}</p>
                </a>
            </AlmondMessage>
        }
        .into_any(),
        Entry::User { text } => view! {
            <div class="message-container from-user">
                <div class="message message-text">{text}</div>
            </div>
        }
        .into_any(),
        // the open grid keeps growing after it is first rendered
        Entry::Grid { .. } => {
            let id = node.id;
            view! {
                <div class="message-container button-grid">
                    {move || {
                        state
                            .transcript
                            .with(|t| t.grid_items(id))
                            .into_iter()
                            .map(|item| render_grid_item(state, item))
                            .collect_view()
                    }}
                </div>
            }
            .into_any()
        }
    }
}

fn render_grid_item(state: AppState, item: GridItem) -> AnyView {
    match item {
        GridItem::Choice { idx, title } => view! {
            <button class="btn btn-default message message-choice" on:click=move |_| state.choose(idx)>
                {title}
            </button>
        }
        .into_any(),
        GridItem::Button { title, json } => view! {
            <button
                class="btn btn-default message message-button"
                on:click=move |_| state.press_button(json.clone())
            >
                {title}
            </button>
        }
        .into_any(),
        GridItem::Link { title, url } => view! {
            <a class="btn btn-default message message-button" href=url target="_blank" rel="noopener">
                {title}
            </a>
        }
        .into_any(),
        GridItem::Special { title, special } => view! {
            <button class="btn btn-default message message-yesno" on:click=move |_| state.special(special)>
                {title}
            </button>
        }
        .into_any(),
    }
}

/// Wraps an assistant message with the icon of the device that produced it.
#[component]
fn AlmondMessage(icon: Option<String>, children: Children) -> impl IntoView {
    let state = expect_context::<AppState>();
    let src = state.config().icon_url(icon.as_deref());

    view! {
        <div class="message-container from-almond">
            <img class="icon" src=src alt="" />
            {children()}
        </div>
    }
}

/// Command input with history navigation and the cancel button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();

    let on_keydown = move |ev: ev::KeyboardEvent| match ev.key().as_str() {
        "ArrowUp" => {
            ev.prevent_default();
            state.history_older();
        }
        "ArrowDown" => {
            ev.prevent_default();
            state.history_newer();
        }
        _ => {}
    };

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        state.submit();
    };

    let group_class = move || {
        if state.is_open() {
            "form-group"
        } else {
            "form-group has-warning"
        }
    };
    let input_type = move || {
        if state.transcript.with(|t| t.masks_input()) {
            "password"
        } else {
            "text"
        }
    };

    view! {
        <form id="input-form" class="input-area" on:submit=on_submit>
            <div id="input-form-group" class=group_class>
                <div class="input-row">
                    <input
                        id="input"
                        class="form-control"
                        type=input_type
                        autocomplete="off"
                        placeholder="Type a command"
                        prop:value=state.input
                        on:input=move |ev| state.set_input.set(event_target_value(&ev))
                        on:keydown=on_keydown
                    />
                    {move || state.thinking.get().then(|| view! { <span id="thinking" class="spinner"></span> })}
                    {move || {
                        state.transcript.with(|t| t.shows_cancel()).then(|| {
                            view! {
                                <button
                                    id="cancel"
                                    type="button"
                                    class="btn btn-default"
                                    on:click=move |_| state.special("nevermind")
                                >
                                    "Cancel"
                                </button>
                            }
                        })
                    }}
                    <button type="submit" class="send-btn" disabled=move || !state.is_open()>
                        "Send"
                    </button>
                </div>
                {move || {
                    let help = match state.connection.get() {
                        ConnectionState::Open => return None,
                        ConnectionState::Connecting => "Connecting to the assistant…",
                        ConnectionState::Disconnected => "Disconnected, trying to reconnect…",
                    };
                    Some(view! { <span class="help-block">{help}</span> })
                }}
            </div>
        </form>
    }
}
