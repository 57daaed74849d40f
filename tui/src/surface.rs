//! The editable surface behind a label overlay.
//!
//! A surface is a single text buffer plus a live selection, standing in for a content-editable
//! region: it has no fixed width, does not wrap, and keeps track of the inline spans that pastes
//! insert. All offsets are byte offsets into the UTF-8 buffer and always sit on char boundaries.

use std::ops::Range;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use textlabel_protocol::AnchorPoint;
use textlabel_protocol::SessionConfig;

/// Kind marker carried by every overlay surface so hosts can tell overlay layers apart.
pub const SURFACE_KIND: &str = "wysiwyg";

/// Host-assigned identity of an attached surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub(crate) u64);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("offset {offset} is past the end of the surface content ({len} bytes)")]
    OutOfBounds { offset: usize, len: usize },
    #[error("offset {0} does not fall on a character boundary")]
    NotCharBoundary(usize),
}

/// Selection inside the surface. `anchor` stays put while `head` follows the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn collapsed(at: usize) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn range(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }
}

/// Presentation of the surface. Color and font are opaque strings handed through to rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceStyle {
    pub anchor: AnchorPoint,
    pub stroke_color: String,
    pub font: String,
    pub alpha: f32,
    /// Horizontal padding, in cells, between the focus ring and the text.
    pub padding: u16,
    pub min_height: u16,
    pub focus_ring: bool,
}

impl SurfaceStyle {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            anchor: config.anchor,
            stroke_color: config.stroke_color.clone(),
            font: config.font.clone(),
            alpha: config.alpha(),
            padding: 1,
            min_height: 1,
            focus_ring: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditableSurface {
    id: SurfaceId,
    text: String,
    /// Inline spans inserted by sanitized pastes, in insertion order.
    spans: Vec<Range<usize>>,
    selection: Option<Selection>,
    style: SurfaceStyle,
}

impl EditableSurface {
    pub fn new(id: SurfaceId, style: SurfaceStyle) -> Self {
        Self {
            id,
            text: String::new(),
            spans: Vec::new(),
            selection: None,
            style,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        SURFACE_KIND
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &SurfaceStyle {
        &self.style
    }

    pub fn spans(&self) -> &[Range<usize>] {
        &self.spans
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Replace the whole visible content. Any live selection collapses to the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.spans.clear();
        if self.selection.is_some() {
            self.selection = Some(Selection::collapsed(self.text.len()));
        }
    }

    pub fn select_all(&mut self) {
        self.selection = Some(Selection {
            anchor: 0,
            head: self.text.len(),
        });
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), SurfaceError> {
        self.check_offset(selection.anchor)?;
        self.check_offset(selection.head)?;
        self.selection = Some(selection);
        Ok(())
    }

    /// Remove the selected text and collapse the selection onto the removal point.
    ///
    /// Returns the collapsed offset, or `None` when there is no selection at all.
    pub fn delete_selection(&mut self) -> Result<Option<usize>, SurfaceError> {
        let Some(selection) = self.selection else {
            return Ok(None);
        };
        let range = selection.range();
        self.check_offset(range.start)?;
        self.check_offset(range.end)?;
        self.splice(range.clone(), "");
        self.selection = Some(Selection::collapsed(range.start));
        Ok(Some(range.start))
    }

    /// Insert `text` as a new inline span at `at` and return the span's range.
    ///
    /// The selection is left untouched; callers decide where the caret goes afterwards.
    pub fn insert_span(&mut self, at: usize, text: &str) -> Result<Range<usize>, SurfaceError> {
        self.check_offset(at)?;
        self.splice(at..at, text);
        let span = at..at + text.len();
        if !span.is_empty() {
            self.spans.push(span.clone());
        }
        Ok(span)
    }

    /// Typing behavior: replace the selection (or insert at the caret) with `text`.
    ///
    /// Without any selection there is no insertion point, so text is appended at the end.
    pub fn insert_text(&mut self, text: &str) {
        let range = match self.selection {
            Some(selection) => selection.range(),
            None => self.text.len()..self.text.len(),
        };
        let end = range.start + text.len();
        self.splice(range, text);
        self.selection = Some(Selection::collapsed(end));
    }

    pub fn backspace(&mut self) {
        let Some(selection) = self.selection else {
            return;
        };
        if !selection.is_collapsed() {
            self.insert_text("");
            return;
        }
        let Some(prev) = self.prev_boundary(selection.head) else {
            return;
        };
        self.splice(prev..selection.head, "");
        self.selection = Some(Selection::collapsed(prev));
    }

    pub fn delete_forward(&mut self) {
        let Some(selection) = self.selection else {
            return;
        };
        if !selection.is_collapsed() {
            self.insert_text("");
            return;
        }
        let Some(next) = self.next_boundary(selection.head) else {
            return;
        };
        self.splice(selection.head..next, "");
    }

    /// Apply the surface's default editing behavior for a key press.
    ///
    /// Returns `false` when the key has no editing meaning.
    pub fn apply_key(&mut self, key: &KeyEvent) -> bool {
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.select_all();
                true
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let mut buf = [0; 4];
                self.insert_text(c.encode_utf8(&mut buf));
                true
            }
            KeyCode::Enter => {
                self.insert_text("\n");
                true
            }
            KeyCode::Backspace => {
                self.backspace();
                true
            }
            KeyCode::Delete => {
                self.delete_forward();
                true
            }
            KeyCode::Left => {
                let to = self.caret().and_then(|caret| self.prev_boundary(caret));
                self.move_caret(to, extend)
            }
            KeyCode::Right => {
                let to = self.caret().and_then(|caret| self.next_boundary(caret));
                self.move_caret(to, extend)
            }
            KeyCode::Home => self.move_caret(Some(0), extend),
            KeyCode::End => self.move_caret(Some(self.text.len()), extend),
            _ => false,
        }
    }

    fn caret(&self) -> Option<usize> {
        self.selection.map(|selection| selection.head)
    }

    fn move_caret(&mut self, to: Option<usize>, extend: bool) -> bool {
        let Some(selection) = self.selection else {
            return false;
        };
        let head = match to {
            Some(head) => head,
            // At an edge: extending is a no-op, a plain arrow collapses in place.
            None if extend => return true,
            None => selection.head,
        };
        self.selection = Some(if extend {
            Selection {
                anchor: selection.anchor,
                head,
            }
        } else {
            Selection::collapsed(head)
        });
        true
    }

    fn prev_boundary(&self, offset: usize) -> Option<usize> {
        self.text[..offset].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self, offset: usize) -> Option<usize> {
        self.text[offset..]
            .chars()
            .next()
            .map(|c| offset + c.len_utf8())
    }

    fn check_offset(&self, offset: usize) -> Result<(), SurfaceError> {
        if offset > self.text.len() {
            return Err(SurfaceError::OutOfBounds {
                offset,
                len: self.text.len(),
            });
        }
        if !self.text.is_char_boundary(offset) {
            return Err(SurfaceError::NotCharBoundary(offset));
        }
        Ok(())
    }

    /// Replace `range` with `replacement`, keeping the recorded spans pointing at the same text.
    ///
    /// Span edges inside the replaced range collapse onto its start; spans left empty are dropped.
    fn splice(&mut self, range: Range<usize>, replacement: &str) {
        self.text.replace_range(range.clone(), replacement);
        let removed = range.end - range.start;
        let inserted = replacement.len();
        let shift = |pos: usize| {
            if pos <= range.start {
                pos
            } else if pos >= range.end {
                pos - removed + inserted
            } else {
                range.start
            }
        };
        self.spans.retain_mut(|span| {
            *span = shift(span.start)..shift(span.end);
            span.start < span.end
        });
    }
}
