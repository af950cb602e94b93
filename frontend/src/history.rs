/// Shell-style history of submitted commands, browsed with Up/Down.
///
/// `up` holds older entries (most recent on top), `down` holds entries
/// stepped past while browsing back. `current` is the entry last pulled into
/// the input box, kept so it is not lost if the user edits it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandHistory {
    up: Vec<String>,
    down: Vec<String>,
    current: Option<String>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Up arrow: returns the text to show, or `None` when there is nothing older.
    pub fn older(&mut self, input: &str) -> Option<String> {
        let entry = self.up.pop()?;
        if !input.is_empty() {
            self.down.push(input.to_string());
        }
        self.current = Some(entry.clone());
        Some(entry)
    }

    /// Down arrow: mirror of [`older`](Self::older).
    pub fn newer(&mut self, input: &str) -> Option<String> {
        let entry = self.down.pop()?;
        if !input.is_empty() {
            self.up.push(input.to_string());
        }
        self.current = Some(entry.clone());
        Some(entry)
    }

    /// Records a submitted line and resets browsing.
    pub fn submit(&mut self, text: &str) {
        if let Some(current) = self.current.take() {
            if !current.is_empty() {
                self.up.push(current);
            }
        }
        while let Some(entry) = self.down.pop() {
            self.up.push(entry);
        }
        self.up.push(text.to_string());
    }
}
