use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::recording::RecordingLog;
use super::Exchange;
use crate::agent::Responder;
use crate::errors::AppError;
use crate::models::{AskSpecial, ChatMessage, NumberedMessage, UserCommand, Vote};

/// Number of past exchanges replayed to the responder.
const MAX_HISTORY: usize = 20;

const WELCOME: &str = "Hello! I'm your virtual assistant. What can I do for you?";
const NEVERMIND: &str = "Sorry I couldn't help on that.";

struct ConversationState {
    next_message_id: u64,
    expecting: Option<AskSpecial>,
    history: Vec<Exchange>,
    recording: bool,
    recording_log: RecordingLog,
    log_path: Option<PathBuf>,
}

/// A user's conversation with the assistant, including its optional
/// transcript recording.
///
/// Commands run one at a time. The state lock is never held while the
/// responder works, so recording operations answer during inference.
pub struct Conversation {
    id: String,
    user: String,
    log_dir: PathBuf,
    responder: Arc<dyn Responder>,
    commands: Mutex<()>,
    state: Mutex<ConversationState>,
}

impl Conversation {
    pub fn new(user: &str, log_dir: &Path, responder: Arc<dyn Responder>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.to_string(),
            log_dir: log_dir.to_path_buf(),
            responder,
            commands: Mutex::new(()),
            state: Mutex::new(ConversationState {
                next_message_id: 0,
                expecting: None,
                history: Vec::new(),
                recording: false,
                recording_log: RecordingLog::default(),
                log_path: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Greeting sent when the conversation is first opened.
    pub async fn welcome(&self) -> Vec<NumberedMessage> {
        let mut state = self.state.lock().await;
        let messages = vec![ChatMessage::text(WELCOME), ChatMessage::AskSpecial { ask: None }];
        state.expecting = None;
        number(&mut state, messages)
    }

    /// An `askSpecial` frame carrying the currently expected input kind.
    pub async fn sync_ask(&self) -> NumberedMessage {
        let mut state = self.state.lock().await;
        let ask = state.expecting;
        let mut numbered = number(&mut state, vec![ChatMessage::AskSpecial { ask }]);
        numbered.remove(0)
    }

    pub async fn expecting(&self) -> Option<AskSpecial> {
        self.state.lock().await.expecting
    }

    /// Runs one user command: echoes it as interpreted, then the replies.
    pub async fn handle_command(
        &self,
        command: UserCommand,
    ) -> Result<Vec<NumberedMessage>, AppError> {
        let _running = self.commands.lock().await;
        let described = command.describe();

        let replies = if command.bookkeeping_special() == Some("nevermind") {
            vec![ChatMessage::text(NEVERMIND), ChatMessage::AskSpecial { ask: None }]
        } else {
            let history = self.state.lock().await.history.clone();
            self.responder.respond(&self.id, &history, &command).await?
        };

        let mut state = self.state.lock().await;

        state.expecting = replies
            .iter()
            .rev()
            .find_map(|m| match m {
                ChatMessage::AskSpecial { ask } => Some(*ask),
                _ => None,
            })
            .flatten();

        let lines: Vec<String> = replies.iter().filter_map(ChatMessage::transcript_line).collect();
        state.history.push(Exchange { user: described.clone(), replies: lines.clone() });
        if state.history.len() > MAX_HISTORY {
            let excess = state.history.len() - MAX_HISTORY;
            state.history.drain(..excess);
        }
        if state.recording {
            state.recording_log.push(described.clone(), lines);
        }

        let mut messages = vec![ChatMessage::Command { text: described }];
        messages.extend(replies);
        Ok(number(&mut state, messages))
    }

    /// Starts a fresh recording log. Has no effect while already recording.
    pub async fn start_recording(&self) {
        let mut state = self.state.lock().await;
        if !state.recording {
            info!("Recording started for conversation {}", self.id);
            state.recording = true;
            state.recording_log = RecordingLog::default();
        }
    }

    pub async fn end_recording(&self) {
        let mut state = self.state.lock().await;
        if state.recording {
            info!("Recording stopped for conversation {}", self.id);
        }
        state.recording = false;
    }

    pub async fn in_recording_mode(&self) -> bool {
        self.state.lock().await.recording
    }

    pub async fn vote_last(&self, vote: Vote) {
        let mut state = self.state.lock().await;
        match state.recording_log.last_mut() {
            Some(turn) => turn.vote = Some(vote),
            None => debug!("Ignoring vote on conversation {} with no recorded turn", self.id),
        }
    }

    pub async fn comment_last(&self, comment: &str) {
        let mut state = self.state.lock().await;
        match state.recording_log.last_mut() {
            Some(turn) => turn.comment = Some(comment.to_string()),
            None => debug!("Ignoring comment on conversation {} with no recorded turn", self.id),
        }
    }

    /// Writes the recording log to disk and remembers where it went.
    pub async fn save_log(&self) -> Result<PathBuf, AppError> {
        let mut state = self.state.lock().await;
        tokio::fs::create_dir_all(&self.log_dir)
            .await
            .map_err(|e| AppError::io(format!("Failed to create {}", self.log_dir.display()), e))?;

        let path = self.log_dir.join(format!("{}-{}.txt", file_safe(&self.user), self.id));
        tokio::fs::write(&path, state.recording_log.render(&self.id))
            .await
            .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;

        info!("Saved conversation log to {}", path.display());
        state.log_path = Some(path.clone());
        Ok(path)
    }

    /// Path of the last saved log, if any.
    pub async fn log(&self) -> Option<PathBuf> {
        self.state.lock().await.log_path.clone()
    }
}

fn number(state: &mut ConversationState, messages: Vec<ChatMessage>) -> Vec<NumberedMessage> {
    messages
        .into_iter()
        .map(|message| {
            let id = state.next_message_id;
            state.next_message_id += 1;
            NumberedMessage { id, message }
        })
        .collect()
}

fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
