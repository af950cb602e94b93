use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::{error, info, warn};

use crate::auth::AuthUser;
use crate::engine::Conversation;
use crate::models::{ChatMessage, NumberedMessage, UserCommand};
use crate::AppState;

/// GET `/api/conversation` — upgrades to the conversation WebSocket.
pub async fn ws_conversation_handler(
    ws: WebSocketUpgrade,
    user: AuthUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, user, state))
}

/// Handles a single WebSocket connection.
///
/// Protocol:
/// - On connect the server sends a greeting (at least one frame).
/// - Client sends `UserCommand` JSON: `{ "type": "command" | "parsed" | "tt", ... }`
/// - Server answers each command with one `ChatMessage` frame per message:
///   first the `command` echo, then the replies.
///
/// Frames are processed one at a time in arrival order.
async fn handle_socket(mut socket: WebSocket, user: AuthUser, state: AppState) {
    info!("WebSocket client connected for user {}", user.name);

    let (conversation, greeting) = state.converse.connect(&user.name).await;
    if !send_messages(&mut socket, &strip_ids(greeting)).await {
        return;
    }

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("WebSocket receive error: {e}");
                break;
            }
        };

        // Only handle text messages
        let text = match &msg {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        let command: UserCommand = match serde_json::from_str(&text) {
            Ok(c) => c,
            Err(e) => {
                warn!("Ignoring malformed frame from {}: {e}", user.name);
                continue;
            }
        };

        let replies = run_command(&conversation, command).await;
        if !send_messages(&mut socket, &replies).await {
            break;
        }
    }

    info!("WebSocket client disconnected for user {}", user.name);
}

async fn run_command(conversation: &Arc<Conversation>, command: UserCommand) -> Vec<ChatMessage> {
    match conversation.handle_command(command).await {
        Ok(messages) => strip_ids(messages),
        Err(e) => {
            error!("Command failed in conversation {}: {e}", conversation.id());
            vec![ChatMessage::text(format!(
                "Sorry, I had an error processing your command: {e}"
            ))]
        }
    }
}

/// Serializes each message into its own text frame. Returns `false` once
/// the socket is gone.
async fn send_messages(socket: &mut WebSocket, messages: &[ChatMessage]) -> bool {
    for message in messages {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize chat message: {e}");
                continue;
            }
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            return false;
        }
    }
    true
}

fn strip_ids(messages: Vec<NumberedMessage>) -> Vec<ChatMessage> {
    messages.into_iter().map(|m| m.message).collect()
}
