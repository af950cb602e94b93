use crate::models::Vote;

/// One recorded exchange, optionally annotated by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub user: String,
    pub replies: Vec<String>,
    pub vote: Option<Vote>,
    pub comment: Option<String>,
}

/// Ordered log of the turns recorded while recording mode is on.
#[derive(Debug, Default, Clone)]
pub struct RecordingLog {
    turns: Vec<Turn>,
}

impl RecordingLog {
    pub fn push(&mut self, user: String, replies: Vec<String>) {
        self.turns.push(Turn { user, replies, vote: None, comment: None });
    }

    pub fn last_mut(&mut self) -> Option<&mut Turn> {
        self.turns.last_mut()
    }

    /// Renders the log in the plain-text transcript format served by `/log`.
    pub fn render(&self, conversation_id: &str) -> String {
        let mut out = format!("# {conversation_id}\n");
        for turn in &self.turns {
            out.push_str(&format!("U: {}\n", one_line(&turn.user)));
            for reply in &turn.replies {
                out.push_str(&format!("A: {}\n", one_line(reply)));
            }
            if let Some(vote) = turn.vote {
                out.push_str(&format!("#! vote: {vote}\n"));
            }
            if let Some(comment) = &turn.comment {
                out.push_str(&format!("#! comment: {}\n", one_line(comment)));
            }
            out.push_str("====\n");
        }
        out
    }
}

fn one_line(s: &str) -> String {
    s.replace('\n', " ")
}
