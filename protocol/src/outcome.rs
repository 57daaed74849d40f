use serde::Deserialize;
use serde::Serialize;

/// How a label editing session ended.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    /// The label text, with leading and trailing whitespace removed.
    Submitted { text: String },
    Cancelled,
}

impl Outcome {
    pub fn submitted(text: impl Into<String>) -> Self {
        Outcome::Submitted { text: text.into() }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Submitted { text } => Some(text),
            Outcome::Cancelled => None,
        }
    }
}
