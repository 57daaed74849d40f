//! Plain-text paste into an overlay surface.
//!
//! A paste replaces the current selection with the clipboard's plain text, line endings
//! normalized to `\n`, inserted as its own inline span. When that fails part way, the error is
//! logged and the host's native paste is left to run instead.
//!
//! Line feeds survive normalization, so a paste can still put several lines into a surface that
//! renders as a single line.

use std::borrow::Cow;
use std::ops::Range;

use crate::surface::EditableSurface;
use crate::surface::Selection;
use crate::surface::SurfaceError;

/// A paste directed at the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    /// Plain-text clipboard payload, if the paste source provided one.
    pub text: Option<String>,
}

impl PasteEvent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self { text: None }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PasteError {
    #[error("paste event carried no plain-text data")]
    MissingClipboardData,
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum PasteOutcome {
    /// Text was inserted as `span`; the native paste is suppressed.
    Sanitized { span: Range<usize> },
    /// No selection to paste into; the event was left alone.
    Propagated,
    /// Sanitizing failed; the native paste runs instead.
    NativeFallback(PasteError),
}

impl PasteOutcome {
    pub fn prevents_default(&self) -> bool {
        matches!(self, PasteOutcome::Sanitized { .. })
    }
}

/// Replace every CRLF and lone CR with LF.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

pub fn sanitize_paste(surface: &mut EditableSurface, event: &PasteEvent) -> PasteOutcome {
    if surface.selection().is_none() {
        tracing::debug!("paste without a selection; leaving it to the host");
        return PasteOutcome::Propagated;
    }
    match insert_plain_text(surface, event) {
        Ok(span) => PasteOutcome::Sanitized { span },
        Err(err) => {
            tracing::error!("failed to sanitize paste: {err}");
            PasteOutcome::NativeFallback(err)
        }
    }
}

/// The host's own paste: raw clipboard text replaces the selection, without normalization.
///
/// With no selection there is no insertion point and nothing happens.
pub fn native_paste(surface: &mut EditableSurface, event: &PasteEvent) {
    if surface.selection().is_none() {
        return;
    }
    if let Some(text) = event.text.as_deref() {
        surface.insert_text(text);
    }
}

fn insert_plain_text(
    surface: &mut EditableSurface,
    event: &PasteEvent,
) -> Result<Range<usize>, PasteError> {
    // Selection goes first: a paste that turns out to carry no data still removes it.
    let at = surface.delete_selection()?.unwrap_or(surface.text().len());
    let text = event
        .text
        .as_deref()
        .ok_or(PasteError::MissingClipboardData)?;
    let text = normalize_line_endings(text);
    let span = surface.insert_span(at, &text)?;
    surface.set_selection(Selection::collapsed(span.end))?;
    Ok(span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostWindow;
    use crate::host::OverlayHost;
    use crate::surface::SurfaceStyle;
    use pretty_assertions::assert_eq;
    use textlabel_protocol::AnchorPoint;
    use textlabel_protocol::SessionConfig;

    fn surface(text: &str) -> EditableSurface {
        let style = SurfaceStyle::from_config(&SessionConfig {
            init_text: String::new(),
            anchor: AnchorPoint::new(5, 5),
            stroke_color: "white".to_string(),
            font: "mono".to_string(),
            opacity: 100,
        });
        let mut surface = EditableSurface::new(OverlayHost::new().allocate_surface_id(), style);
        surface.set_text(text);
        surface
    }

    #[test]
    fn normalizes_crlf_and_lone_cr() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
        assert!(matches!(normalize_line_endings("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn paste_replaces_selection_with_normalized_span() {
        let mut surface = surface("say hi!");
        surface
            .set_selection(Selection { anchor: 4, head: 6 })
            .expect("select");

        let outcome = sanitize_paste(&mut surface, &PasteEvent::plain("hello\r\nthere"));

        assert_eq!(outcome, PasteOutcome::Sanitized { span: 4..15 });
        assert!(outcome.prevents_default());
        assert_eq!(surface.text(), "say hello\nthere!");
        assert_eq!(surface.spans(), &[4..15]);
        assert_eq!(surface.selection(), Some(Selection::collapsed(15)));
    }

    #[test]
    fn paste_without_selection_propagates_untouched() {
        let mut surface = surface("label");

        let outcome = sanitize_paste(&mut surface, &PasteEvent::plain("x"));

        assert_eq!(outcome, PasteOutcome::Propagated);
        assert!(!outcome.prevents_default());
        assert_eq!(surface.text(), "label");
    }

    #[test]
    fn missing_payload_falls_back_to_native_paste() {
        let mut surface = surface("label");
        surface.select_all();

        let outcome = sanitize_paste(&mut surface, &PasteEvent::empty());

        assert_eq!(
            outcome,
            PasteOutcome::NativeFallback(PasteError::MissingClipboardData)
        );
        assert!(!outcome.prevents_default());
        assert_eq!(surface.text(), "");
    }

    #[test]
    fn native_paste_keeps_raw_line_endings() {
        let mut surface = surface("");
        surface.select_all();

        native_paste(&mut surface, &PasteEvent::plain("a\r\nb"));

        assert_eq!(surface.text(), "a\r\nb");
        assert!(surface.spans().is_empty());
    }
}
