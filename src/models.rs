use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of input the assistant expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskSpecial {
    #[serde(rename = "yesno")]
    YesNo,
    Password,
    Location,
    Picture,
    PhoneNumber,
    EmailAddress,
    Number,
    Date,
    Time,
    RawString,
    Command,
    Choice,
    Generic,
}

/// Rich display link card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rdl {
    pub web_callback: String,
    pub display_title: String,
    #[serde(default)]
    pub display_text: String,
}

/// Server → client frame on `/api/conversation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatMessage {
    #[serde(rename = "text")]
    Text { text: String, icon: Option<String> },
    #[serde(rename = "picture")]
    Picture { url: String, icon: Option<String> },
    #[serde(rename = "rdl")]
    Rdl { rdl: Rdl, icon: Option<String> },
    #[serde(rename = "result")]
    Result { fallback: String, icon: Option<String> },
    #[serde(rename = "choice")]
    Choice { idx: usize, title: String },
    #[serde(rename = "button")]
    Button { title: String, json: Value },
    #[serde(rename = "link")]
    Link { title: String, url: String },
    #[serde(rename = "askSpecial")]
    AskSpecial { ask: Option<AskSpecial> },
    #[serde(rename = "hypothesis")]
    Hypothesis { hypothesis: String },
    #[serde(rename = "command")]
    Command { text: String },
}

impl ChatMessage {
    pub fn text(text: impl Into<String>) -> Self {
        ChatMessage::Text { text: text.into(), icon: None }
    }

    /// Plain-text rendering used in recording logs; `None` for frames that
    /// carry no assistant utterance.
    pub fn transcript_line(&self) -> Option<String> {
        match self {
            ChatMessage::Text { text, .. } => Some(text.clone()),
            ChatMessage::Picture { url, .. } => Some(format!("picture: {url}")),
            ChatMessage::Rdl { rdl, .. } => {
                Some(format!("rdl: {} {}", rdl.display_title, rdl.web_callback))
            }
            ChatMessage::Result { fallback, .. } => Some(fallback.clone()),
            ChatMessage::Choice { idx, title } => Some(format!("choice {idx}: {title}")),
            ChatMessage::Button { title, .. } => Some(format!("button: {title}")),
            ChatMessage::Link { title, url } => Some(format!("link: {title} {url}")),
            ChatMessage::AskSpecial { .. }
            | ChatMessage::Hypothesis { .. }
            | ChatMessage::Command { .. } => None,
        }
    }
}

/// Client → server frame on `/api/conversation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UserCommand {
    #[serde(rename = "command")]
    Command { text: String },
    #[serde(rename = "parsed")]
    Parsed { json: Value },
    #[serde(rename = "tt")]
    ThingTalk { code: String },
}

impl UserCommand {
    /// The command as it was interpreted, in the form echoed back to the client.
    pub fn describe(&self) -> String {
        match self {
            UserCommand::Command { text } => text.clone(),
            UserCommand::Parsed { json } => format!("\\r {json}"),
            UserCommand::ThingTalk { code } => format!("\\t {code}"),
        }
    }

    /// Returns the `special:<name>` bookkeeping name if this is one.
    pub fn bookkeeping_special(&self) -> Option<&str> {
        let UserCommand::Parsed { json } = self else {
            return None;
        };
        let code = json.get("code")?.as_array()?;
        match code.as_slice() {
            [a, b, c] if a == "bookkeeping" && b == "special" => {
                c.as_str()?.strip_prefix("special:")
            }
            _ => None,
        }
    }
}

/// A message tagged with its per-conversation sequence number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberedMessage {
    pub id: u64,
    #[serde(flatten)]
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
        }
    }
}

impl std::fmt::Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Vote {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "up" => Ok(Vote::Up),
            "down" => Ok(Vote::Down),
            other => Err(format!("Unknown vote: {other}")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConverseRequest {
    pub command: UserCommand,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub ask_special: Option<AskSpecial>,
    pub messages: Vec<NumberedMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
