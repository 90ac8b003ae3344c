//! Line commands read from the terminal.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain conversation
    Say(String),
    /// Reassurance, counted as care even without a keyword match
    Care(String),
    /// `detail <fragment_id> <text>`
    Detail { fragment_id: String, text: String },
    /// The user is back at the keyboard
    Here,
    Status,
    Memories,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  [say] <text>              talk to her
  care <text>               reassure her
  detail <fragment> <text>  tell her about a memory she is missing
  here                      let her know you are around
  status                    stage, memories and mood
  memories                  recovered memory fragments
  help                      this list
  quit                      save and exit
A leading / is optional.";

impl Command {
    /// `None` for blank lines. Commands may be written with or without a
    /// leading `/`; a line whose first word is not a command is speech.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let word = line.strip_prefix('/').unwrap_or(line);
        let (name, arg) = match word.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (word, ""),
        };
        let cmd = match name.to_ascii_lowercase().as_str() {
            "say" if !arg.is_empty() => Command::Say(arg.to_string()),
            "care" if !arg.is_empty() => Command::Care(arg.to_string()),
            "detail" => match arg.split_once(char::is_whitespace) {
                Some((id, text)) if !text.trim().is_empty() => Command::Detail {
                    fragment_id: id.to_string(),
                    text: text.trim().to_string(),
                },
                _ => Command::Help,
            },
            "here" if arg.is_empty() => Command::Here,
            "status" if arg.is_empty() => Command::Status,
            "memories" if arg.is_empty() => Command::Memories,
            "help" | "?" if arg.is_empty() => Command::Help,
            "quit" | "exit" if arg.is_empty() => Command::Quit,
            _ => Command::Say(line.to_string()),
        };
        Some(cmd)
    }
}
