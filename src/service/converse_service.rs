use std::sync::Arc;

use crate::engine::{Conversation, Engine};
use crate::errors::AppError;
use crate::models::{ConverseResponse, NumberedMessage, UserCommand};

#[derive(Clone)]
pub struct ConverseService {
    engine: Arc<Engine>,
}

impl ConverseService {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Opens the caller's conversation for a new client connection and
    /// returns the frames to greet it with. A fresh conversation gets the
    /// welcome; an existing one gets its current `askSpecial` state. Either
    /// way the client receives at least one frame.
    pub async fn connect(&self, user: &str) -> (Arc<Conversation>, Vec<NumberedMessage>) {
        let (conversation, created) = self.engine.open_conversation(user).await;
        let greeting = if created {
            conversation.welcome().await
        } else {
            vec![conversation.sync_ask().await]
        };
        (conversation, greeting)
    }

    /// Runs one command outside of a WebSocket session.
    pub async fn converse(
        &self,
        user: &str,
        command: UserCommand,
    ) -> Result<ConverseResponse, AppError> {
        let (conversation, created) = self.engine.open_conversation(user).await;
        let mut messages = if created { conversation.welcome().await } else { Vec::new() };
        messages.extend(conversation.handle_command(command).await?);
        Ok(ConverseResponse {
            ask_special: conversation.expecting().await,
            messages,
        })
    }
}
