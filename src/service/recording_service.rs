use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::{Conversation, Engine};
use crate::errors::AppError;
use crate::models::Vote;

/// Recording operations on the caller's conversation. Each takes the
/// authenticated user name and already-extracted input.
#[derive(Clone)]
pub struct RecordingService {
    engine: Arc<Engine>,
}

impl RecordingService {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    async fn conversation(&self, user: &str) -> Result<Arc<Conversation>, AppError> {
        self.engine
            .get_conversation(user)
            .await
            .ok_or(AppError::ConversationNotFound)
    }

    pub async fn start(&self, user: &str) -> Result<(), AppError> {
        self.conversation(user).await?.start_recording().await;
        Ok(())
    }

    pub async fn stop(&self, user: &str) -> Result<(), AppError> {
        self.conversation(user).await?.end_recording().await;
        Ok(())
    }

    /// Whether the caller's conversation is currently recording.
    pub async fn status(&self, user: &str) -> Result<bool, AppError> {
        Ok(self.conversation(user).await?.in_recording_mode().await)
    }

    pub async fn vote(&self, user: &str, vote: &str) -> Result<(), AppError> {
        let vote = Vote::try_from(vote).map_err(|e| {
            warn!("{e}");
            AppError::InvalidVote { vote: vote.to_string() }
        })?;
        let conversation = self.conversation(user).await?;
        debug!("Voting {vote} on last turn of conversation {}", conversation.id());
        conversation.vote_last(vote).await;
        Ok(())
    }

    pub async fn comment(&self, user: &str, comment: Option<&str>) -> Result<(), AppError> {
        let comment = comment.filter(|c| !c.is_empty()).ok_or(AppError::MissingComment)?;
        self.conversation(user).await?.comment_last(comment).await;
        Ok(())
    }

    pub async fn save(&self, user: &str) -> Result<(), AppError> {
        self.conversation(user).await?.save_log().await?;
        Ok(())
    }

    /// Conversation id and path of the saved transcript.
    pub async fn log(&self, user: &str) -> Result<(String, PathBuf), AppError> {
        let conversation = self.conversation(user).await?;
        let path = conversation.log().await.ok_or(AppError::LogNotFound)?;
        Ok((conversation.id().to_string(), path))
    }
}
