//! Decides which key and focus events end an editing session, and how.
//!
//! Everything here is a pure function of the event and the surface content; the overlay applies
//! the decision.

use crossterm::event::KeyCode;
use crossterm::event::KeyModifiers;
use textlabel_protocol::Outcome;

use crate::key_input::KeyInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDecision {
    /// Escape on a label that already had text: put the initial text back, then commit.
    RevertAndCommit,
    /// Escape on a new label.
    Cancel,
    /// Enter without Shift, outside of any IME composition.
    Commit,
    /// Key releases, and Escape or Enter while an IME composition is in progress.
    Ignore,
    /// Not a terminal key; the surface applies its normal editing behavior.
    Default,
}

pub fn resolve_key(key: &KeyInput, init_text: &str) -> KeyDecision {
    if !key.is_key_down() {
        return KeyDecision::Ignore;
    }
    match key.event.code {
        KeyCode::Esc if key.is_ime_composition() => KeyDecision::Ignore,
        KeyCode::Esc if init_text.is_empty() => KeyDecision::Cancel,
        KeyCode::Esc => KeyDecision::RevertAndCommit,
        // Shift+Enter falls through to the surface and inserts a line break.
        KeyCode::Enter if !key.event.modifiers.contains(KeyModifiers::SHIFT) => {
            if key.is_ime_composition() {
                KeyDecision::Ignore
            } else {
                KeyDecision::Commit
            }
        }
        _ => KeyDecision::Default,
    }
}

/// The commit procedure's decision for the surface's current content.
///
/// Trailing whitespace would push the rendered label off its vertical alignment, so submitted text
/// is always trimmed; content that trims to nothing cancels.
pub fn resolve_commit(content: &str) -> Outcome {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Outcome::Cancelled
    } else {
        Outcome::submitted(trimmed)
    }
}
