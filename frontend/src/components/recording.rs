use leptos::prelude::*;

use crate::state::AppState;

/// Controls for recording the conversation as an annotated dialogue log.
#[component]
pub fn RecordingBar() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (comment, set_comment) = signal(String::new());

    let recording = move || state.recording.get() == Some(true);
    let no_conversation = move || state.recording.get().is_none();

    let toggle = move |_| {
        let action = if recording() { "stop" } else { "start" };
        state.recording_action(action);
    };

    let submit_comment = move |_| {
        let text = comment.get_untracked();
        if text.trim().is_empty() {
            return;
        }
        set_comment.set(String::new());
        state.comment(text);
    };

    view! {
        <aside class="recording-bar">
            <span class="recording-status">
                {move || match state.recording.get() {
                    Some(true) => "Recording",
                    Some(false) => "Not recording",
                    None => "No conversation yet",
                }}
            </span>

            <button class="btn btn-default" on:click=toggle disabled=no_conversation>
                {move || if recording() { "Stop recording" } else { "Start recording" }}
            </button>

            <button
                class="btn btn-default vote-up"
                on:click=move |_| state.recording_action("vote/up")
                disabled=move || !recording()
            >
                "👍"
            </button>
            <button
                class="btn btn-default vote-down"
                on:click=move |_| state.recording_action("vote/down")
                disabled=move || !recording()
            >
                "👎"
            </button>

            <input
                class="form-control recording-comment"
                type="text"
                placeholder="Comment on the last reply"
                prop:value=comment
                on:input=move |ev| set_comment.set(event_target_value(&ev))
                disabled=move || !recording()
            />
            <button class="btn btn-default" on:click=submit_comment disabled=move || !recording()>
                "Comment"
            </button>

            <button
                class="btn btn-default"
                on:click=move |_| state.recording_action("save")
                disabled=no_conversation
            >
                "Save log"
            </button>
            <a class="btn btn-default" href=state.config().log_url() download="">
                "Download log"
            </a>
        </aside>
    }
}
