//! In-process conversation engine: one conversation per user, owned here and
//! mutated only through [`Conversation`]'s methods.

pub mod conversation;
pub mod recording;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::agent::Responder;

pub use conversation::Conversation;

/// A past user command and the text of the assistant's replies.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub user: String,
    pub replies: Vec<String>,
}

pub struct Engine {
    responder: Arc<dyn Responder>,
    log_dir: PathBuf,
    conversations: RwLock<HashMap<String, Arc<Conversation>>>,
}

impl Engine {
    pub fn new(responder: Arc<dyn Responder>, log_dir: &Path) -> Self {
        Self {
            responder,
            log_dir: log_dir.to_path_buf(),
            conversations: RwLock::new(HashMap::new()),
        }
    }

    /// The user's conversation, if one has been opened.
    pub async fn get_conversation(&self, user: &str) -> Option<Arc<Conversation>> {
        self.conversations.read().await.get(user).cloned()
    }

    /// Returns the user's conversation, creating it if needed. The flag is
    /// `true` when the conversation was created by this call.
    pub async fn open_conversation(&self, user: &str) -> (Arc<Conversation>, bool) {
        if let Some(existing) = self.get_conversation(user).await {
            return (existing, false);
        }
        let mut conversations = self.conversations.write().await;
        if let Some(existing) = conversations.get(user) {
            return (existing.clone(), false);
        }
        let conversation =
            Arc::new(Conversation::new(user, &self.log_dir, self.responder.clone()));
        info!("Opened conversation {} for user {user}", conversation.id());
        conversations.insert(user.to_string(), conversation.clone());
        (conversation, true)
    }
}
