use async_trait::async_trait;
use rig::client::Nothing;
use rig::completion::Chat;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::ollama;
use tracing::error;

use crate::engine::Exchange;
use crate::errors::AppError;
use crate::models::{ChatMessage, UserCommand};

const PREAMBLE: &str = "You are a helpful virtual assistant answering a user in a chat window. \
                        Be concise, accurate, and friendly. \
                        Commands starting with \\t are ThingTalk programs, \
                        commands starting with \\r are pre-parsed commands. \
                        If you don't know something, say so.";

/// Produces the assistant's replies to one user command.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(
        &self,
        conversation_id: &str,
        history: &[Exchange],
        command: &UserCommand,
    ) -> Result<Vec<ChatMessage>, AppError>;
}

/// Builds a rig [`RigMessage`] history from the conversation's past exchanges.
fn to_rig_history(history: &[Exchange]) -> Vec<RigMessage> {
    history
        .iter()
        .flat_map(|ex| {
            let mut msgs = vec![RigMessage::user(&ex.user)];
            if !ex.replies.is_empty() {
                msgs.push(RigMessage::assistant(ex.replies.join("\n")));
            }
            msgs
        })
        .collect()
}

/// Responder backed by a local Ollama model through the rig [`ollama::Client`].
/// A fresh agent is built per command and the history is replayed each time.
#[derive(Clone)]
pub struct OllamaResponder {
    client: ollama::Client,
    base_url: String,
    model: String,
}

impl OllamaResponder {
    pub fn new(base_url: &str, model: &str) -> Result<Self, AppError> {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(base_url)
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build Ollama client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Responder for OllamaResponder {
    async fn respond(
        &self,
        conversation_id: &str,
        history: &[Exchange],
        command: &UserCommand,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(PREAMBLE)
            .build();

        let content = agent
            .chat(command.describe(), to_rig_history(history))
            .await
            .map_err(|e| {
                error!("Ollama inference failed for conversation {conversation_id}: {e}");
                let msg = e.to_string();
                if msg.contains("Connection refused") || msg.contains("connect") {
                    AppError::OllamaUnavailable { host: self.base_url.clone() }
                } else if msg.contains("model") {
                    AppError::ModelNotFound { model_name: self.model.clone() }
                } else {
                    AppError::InferenceError { message: msg }
                }
            })?;

        Ok(vec![ChatMessage::text(content.trim())])
    }
}
