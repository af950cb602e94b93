use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Matches the backend `AskSpecial` enum. Unknown kinds from newer
/// servers deserialize as `Other`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
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
    #[serde(other)]
    Other,
}

/// Matches the backend `Rdl` card.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rdl {
    pub web_callback: String,
    pub display_title: String,
    #[serde(default)]
    pub display_text: String,
}

/// Frame received on `/api/conversation`.
/// Matches the backend `ChatMessage` enum (internally tagged).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ChatMessage {
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(default)]
        icon: Option<String>,
    },
    #[serde(rename = "picture")]
    Picture {
        url: String,
        #[serde(default)]
        icon: Option<String>,
    },
    #[serde(rename = "rdl")]
    Rdl {
        rdl: Rdl,
        #[serde(default)]
        icon: Option<String>,
    },
    #[serde(rename = "result")]
    Result {
        fallback: String,
        #[serde(default)]
        icon: Option<String>,
    },
    #[serde(rename = "choice")]
    Choice { idx: usize, title: String },
    #[serde(rename = "button")]
    Button { title: String, json: Value },
    #[serde(rename = "link")]
    Link { title: String, url: String },
    #[serde(rename = "askSpecial")]
    AskSpecial {
        #[serde(default)]
        ask: Option<AskSpecial>,
    },
    #[serde(rename = "hypothesis")]
    Hypothesis { hypothesis: String },
    #[serde(rename = "command")]
    Command { text: String },
}

/// Frame sent on `/api/conversation`.
#[derive(Clone, Debug, Serialize, PartialEq)]
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
    /// Interprets a line typed in the input box.
    ///
    /// `\r <json>` or `\r <tokens…>` sends a pre-parsed command, `\t <code>`
    /// sends a ThingTalk program, anything else is free-form text.
    pub fn from_input(text: &str) -> Result<Self, String> {
        if let Some(rest) = text.strip_prefix("\\r") {
            let line = rest.trim();
            if line.starts_with('{') {
                let json = serde_json::from_str(line).map_err(|e| format!("Invalid JSON: {e}"))?;
                return Ok(UserCommand::Parsed { json });
            }
            let code: Vec<&str> = line.split(' ').collect();
            return Ok(UserCommand::Parsed { json: json!({ "code": code, "entities": {} }) });
        }
        if let Some(rest) = text.strip_prefix("\\t") {
            let code = rest.strip_prefix(' ').unwrap_or(rest);
            return Ok(UserCommand::ThingTalk { code: code.to_string() });
        }
        Ok(UserCommand::Command { text: text.to_string() })
    }

    /// Selecting option `idx` of a choice grid.
    pub fn choice(idx: usize) -> Self {
        bookkeeping(&["choice", &idx.to_string()])
    }

    /// A special bookkeeping answer such as `yes`, `no` or `nevermind`.
    pub fn special(name: &str) -> Self {
        bookkeeping(&["special", &format!("special:{name}")])
    }
}

fn bookkeeping(rest: &[&str]) -> UserCommand {
    let mut code = vec!["bookkeeping"];
    code.extend_from_slice(rest);
    UserCommand::Parsed { json: json!({ "code": code, "entities": {} }) }
}

/// Response body of the recording routes.
#[derive(Clone, Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Error body of the recording routes.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_command() {
        assert_eq!(
            UserCommand::from_input("turn on the lights"),
            Ok(UserCommand::Command { text: "turn on the lights".into() })
        );
    }

    #[test]
    fn slash_t_is_thingtalk() {
        assert_eq!(
            UserCommand::from_input("\\t now => notify;"),
            Ok(UserCommand::ThingTalk { code: "now => notify;".into() })
        );
    }

    #[test]
    fn prefix_followed_by_multibyte_text_is_kept() {
        assert_eq!(
            UserCommand::from_input("\\té"),
            Ok(UserCommand::ThingTalk { code: "é".into() })
        );
        assert_eq!(
            UserCommand::from_input("\\t  éa"),
            Ok(UserCommand::ThingTalk { code: " éa".into() })
        );
        assert_eq!(
            UserCommand::from_input("\\r{\"code\":[\"é\"],\"entities\":{}}"),
            Ok(UserCommand::Parsed { json: json!({ "code": ["é"], "entities": {} }) })
        );
    }

    #[test]
    fn slash_r_tokens_and_json() {
        assert_eq!(
            UserCommand::from_input("\\r bookkeeping special special:yes"),
            Ok(UserCommand::special("yes"))
        );
        assert_eq!(
            UserCommand::from_input("\\r {\"code\":[\"a\"],\"entities\":{}}"),
            Ok(UserCommand::Parsed { json: json!({ "code": ["a"], "entities": {} }) })
        );
        assert!(UserCommand::from_input("\\r {broken").is_err());
    }

    #[test]
    fn bookkeeping_commands_serialize_like_the_server_expects() {
        assert_eq!(
            serde_json::to_value(UserCommand::choice(2)).unwrap(),
            json!({
                "type": "parsed",
                "json": { "code": ["bookkeeping", "choice", "2"], "entities": {} }
            })
        );
        assert_eq!(
            serde_json::to_value(UserCommand::special("nevermind")).unwrap()["json"]["code"][2],
            "special:nevermind"
        );
    }

    #[test]
    fn unknown_ask_kinds_are_tolerated() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"type":"askSpecial","ask":"something_new"}"#).unwrap();
        assert_eq!(msg, ChatMessage::AskSpecial { ask: Some(AskSpecial::Other) });
        let msg: ChatMessage = serde_json::from_str(r#"{"type":"askSpecial","ask":null}"#).unwrap();
        assert_eq!(msg, ChatMessage::AskSpecial { ask: None });
    }
}
