use serde_json::Value;

use crate::models::{AskSpecial, ChatMessage, Rdl};

/// An actionable item inside a button grid.
#[derive(Clone, Debug, PartialEq)]
pub enum GridItem {
    Choice { idx: usize, title: String },
    Button { title: String, json: Value },
    Link { title: String, url: String },
    /// Yes/No pair appended for a `yesno` ask.
    Special { title: &'static str, special: &'static str },
}

/// One node of the rendered transcript.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Text { text: String, icon: Option<String> },
    Picture { url: String, icon: Option<String> },
    Rdl { rdl: Rdl, icon: Option<String> },
    User { text: String },
    Grid { items: Vec<GridItem> },
}

/// An entry with the id the view keys it by. Ids are never reused.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: u64,
    pub entry: Entry,
}

/// What the caller must do after a message has been applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Applied {
    /// New content for the input box.
    pub input: Option<String>,
    pub scroll: bool,
}

/// Model of the chat transcript the view renders from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript {
    nodes: Vec<Node>,
    next_id: u64,
    /// Index into `nodes` of the grid that choices and buttons append to.
    open_grid: Option<usize>,
    ask: Option<AskSpecial>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Current items of the grid with node id `id`; empty once it is gone.
    pub fn grid_items(&self, id: u64) -> Vec<GridItem> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| match &n.entry {
                Entry::Grid { items } => Some(items.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn ask(&self) -> Option<AskSpecial> {
        self.ask
    }

    pub fn masks_input(&self) -> bool {
        self.ask == Some(AskSpecial::Password)
    }

    pub fn shows_cancel(&self) -> bool {
        self.ask.is_some()
    }

    pub fn apply(&mut self, message: ChatMessage) -> Applied {
        let scroll = Applied { input: None, scroll: true };
        match message {
            ChatMessage::Text { text, icon } | ChatMessage::Result { fallback: text, icon } => {
                self.push_closing(Entry::Text { text, icon });
                scroll
            }
            ChatMessage::Picture { url, icon } => {
                self.push_closing(Entry::Picture { url, icon });
                scroll
            }
            ChatMessage::Rdl { rdl, icon } => {
                self.push_closing(Entry::Rdl { rdl, icon });
                scroll
            }
            ChatMessage::Choice { idx, title } => {
                self.grid().push(GridItem::Choice { idx, title });
                scroll
            }
            ChatMessage::Button { title, json } => {
                self.grid().push(GridItem::Button { title, json });
                scroll
            }
            ChatMessage::Link { title, url } => {
                self.grid().push(GridItem::Link { title, url });
                scroll
            }
            ChatMessage::AskSpecial { ask } => {
                self.ask = ask;
                if ask == Some(AskSpecial::YesNo) {
                    let grid = self.grid();
                    grid.push(GridItem::Special { title: "Yes", special: "yes" });
                    grid.push(GridItem::Special { title: "No", special: "no" });
                    return scroll;
                }
                Applied::default()
            }
            ChatMessage::Hypothesis { hypothesis } => {
                Applied { input: Some(hypothesis), scroll: false }
            }
            ChatMessage::Command { text } => {
                self.collapse_buttons();
                self.push(Entry::User { text });
                Applied { input: Some(String::new()), scroll: false }
            }
        }
    }

    fn push(&mut self, entry: Entry) {
        self.nodes.push(Node { id: self.next_id, entry });
        self.next_id += 1;
    }

    fn push_closing(&mut self, entry: Entry) {
        self.push(entry);
        self.open_grid = None;
    }

    fn grid(&mut self) -> &mut Vec<GridItem> {
        let idx = match self.open_grid {
            Some(idx) => idx,
            None => {
                self.push(Entry::Grid { items: Vec::new() });
                let idx = self.nodes.len() - 1;
                self.open_grid = Some(idx);
                idx
            }
        };
        match &mut self.nodes[idx].entry {
            Entry::Grid { items } => items,
            _ => unreachable!("open_grid always points at a grid"),
        }
    }

    /// Drops every pending button, choice, link and yes/no item.
    fn collapse_buttons(&mut self) {
        self.nodes.retain(|n| !matches!(n.entry, Entry::Grid { .. }));
        self.open_grid = None;
    }
}
