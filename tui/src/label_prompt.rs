//! Running a label overlay on a live terminal.
//!
//! The prompt draws the caller's background, puts the label overlay on top and feeds terminal
//! input to it until the session resolves.

use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::Frame;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use textlabel_protocol::Outcome;
use textlabel_protocol::SessionConfig;

use crate::host::OverlayHost;
use crate::overlay::OutcomeCallbacks;
use crate::overlay::OverlayEvent;
use crate::overlay::TextOverlay;
use crate::paste::PasteEvent;
use crate::render::LabelView;
use crate::render::label_area;
use crate::render::renderable::Renderable;
use crate::tui::Tui;
use crate::tui::TuiEvent;

pub struct LabelPrompt {
    overlay: TextOverlay<OverlayHost>,
    outcome: Rc<RefCell<Option<Outcome>>>,
}

impl LabelPrompt {
    pub fn new(host: OverlayHost, config: SessionConfig) -> Self {
        let outcome = Rc::new(RefCell::new(None));
        let submitted = Rc::clone(&outcome);
        let cancelled = Rc::clone(&outcome);
        let callbacks = OutcomeCallbacks::new(
            move |text| {
                submitted.replace(Some(Outcome::Submitted { text }));
            },
            move || {
                cancelled.replace(Some(Outcome::Cancelled));
            },
        );
        Self {
            overlay: TextOverlay::create(host, config, callbacks),
            outcome,
        }
    }

    pub fn is_done(&self) -> bool {
        !self.overlay.is_active()
    }

    /// What the outcome callbacks reported, once the session has resolved.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome.borrow().clone()
    }

    /// Abandon the session; it resolves as cancelled.
    pub fn cancel(&mut self) {
        self.overlay.teardown();
    }

    /// Route one terminal event. `area` is the screen the label is laid out in.
    pub fn handle_event(&mut self, event: TuiEvent, area: Rect) {
        match event {
            TuiEvent::Key(key)
                if key.kind == KeyEventKind::Press
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('c')) =>
            {
                self.cancel();
            }
            TuiEvent::Key(key) => {
                self.overlay.handle_event(OverlayEvent::Key(key.into()));
            }
            TuiEvent::Paste(text) => {
                self.overlay
                    .handle_event(OverlayEvent::Paste(PasteEvent::plain(text)));
            }
            TuiEvent::FocusLost => {
                self.overlay.handle_event(OverlayEvent::FocusLost);
            }
            TuiEvent::Wheel(wheel) => {
                let dispatch = self.overlay.host().dispatch_wheel(&wheel);
                tracing::trace!(?dispatch, "wheel over label prompt");
            }
            TuiEvent::Click { column, row } => {
                let label = label_area(self.overlay.surface(), area);
                if !label.contains(Position::new(column, row)) {
                    self.overlay.blur();
                }
            }
            TuiEvent::Draw => {}
        }
    }

    pub fn render(&self, background: &dyn Renderable, frame: &mut Frame) {
        let area = frame.area();
        background.render(area, frame.buffer_mut());
        if self.is_done() {
            return;
        }
        let view = LabelView::new(self.overlay.surface());
        view.render(area, frame.buffer_mut());
        if let Some(position) = view.cursor_pos(area) {
            frame.set_cursor_position(position);
        }
    }
}

/// Edit one label on top of `background` and return how the session ended.
///
/// Wheel events go through `host`, so listeners the caller registered there stay shadowed while
/// the label is open.
pub async fn prompt_label(
    tui: &mut Tui,
    host: &OverlayHost,
    config: SessionConfig,
    background: &dyn Renderable,
) -> anyhow::Result<Outcome> {
    let mut prompt = LabelPrompt::new(host.clone(), config);
    tui.draw(|frame| prompt.render(background, frame))?;

    while !prompt.is_done() {
        let Some(event) = tui.next_event().await else {
            prompt.cancel();
            break;
        };
        let area = tui.area()?;
        prompt.handle_event(event, area);
        tui.draw(|frame| prompt.render(background, frame))?;
    }

    Ok(prompt.outcome().unwrap_or(Outcome::Cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostWindow;
    use crate::host::WheelEvent;
    use crate::host::WheelFlow;
    use crate::host::WheelPhase;
    use crossterm::event::KeyEvent;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::Backend as _;
    use ratatui::backend::TestBackend;
    use std::cell::Cell;
    use textlabel_protocol::AnchorPoint;

    const SCREEN: Rect = Rect::new(0, 0, 30, 9);

    fn config(init_text: &str) -> SessionConfig {
        SessionConfig {
            init_text: init_text.to_string(),
            anchor: AnchorPoint::new(15, 4),
            stroke_color: "yellow".to_string(),
            font: "mono".to_string(),
            opacity: 100,
        }
    }

    fn key(code: KeyCode) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(prompt: &mut LabelPrompt, text: &str) {
        for c in text.chars() {
            prompt.handle_event(key(KeyCode::Char(c)), SCREEN);
        }
    }

    #[test]
    fn typing_then_enter_submits() {
        let mut prompt = LabelPrompt::new(OverlayHost::new(), config(""));

        type_text(&mut prompt, "note ");
        assert!(!prompt.is_done());
        prompt.handle_event(key(KeyCode::Enter), SCREEN);

        assert!(prompt.is_done());
        assert_eq!(prompt.outcome(), Some(Outcome::submitted("note")));
    }

    #[test]
    fn typing_replaces_the_preselected_initial_text() {
        let mut prompt = LabelPrompt::new(OverlayHost::new(), config("old"));

        type_text(&mut prompt, "new");
        prompt.handle_event(key(KeyCode::Enter), SCREEN);

        assert_eq!(prompt.outcome(), Some(Outcome::submitted("new")));
    }

    #[test]
    fn ctrl_c_cancels() {
        let host = OverlayHost::new();
        let mut prompt = LabelPrompt::new(host.clone(), config("old"));

        prompt.handle_event(
            TuiEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            SCREEN,
        );

        assert_eq!(prompt.outcome(), Some(Outcome::Cancelled));
        assert_eq!(host.attached_count(), 0);
    }

    #[test]
    fn click_outside_the_label_commits_and_inside_does_not() {
        let mut prompt = LabelPrompt::new(OverlayHost::new(), config("keep"));

        prompt.handle_event(TuiEvent::Click { column: 15, row: 4 }, SCREEN);
        assert!(!prompt.is_done());

        prompt.handle_event(TuiEvent::Click { column: 0, row: 0 }, SCREEN);
        assert_eq!(prompt.outcome(), Some(Outcome::submitted("keep")));
    }

    #[test]
    fn wheel_is_swallowed_while_open_and_reaches_the_host_after() {
        let host = OverlayHost::new();
        let scrolled = Rc::new(Cell::new(0));
        let counter = Rc::clone(&scrolled);
        host.add_wheel_listener(
            WheelPhase::Bubble,
            Box::new(move |event: &WheelEvent| {
                counter.set(counter.get() + i32::from(event.delta));
                WheelFlow::Continue
            }),
        );
        let wheel = WheelEvent {
            column: 1,
            row: 1,
            delta: 1,
        };

        let mut prompt = LabelPrompt::new(host.clone(), config(""));
        prompt.handle_event(TuiEvent::Wheel(wheel), SCREEN);
        assert_eq!(scrolled.get(), 0);

        prompt.handle_event(key(KeyCode::Esc), SCREEN);
        host.dispatch_wheel(&wheel);
        assert_eq!(scrolled.get(), 1);
    }

    #[test]
    fn pasted_text_is_normalized_before_submit() {
        let mut prompt = LabelPrompt::new(OverlayHost::new(), config(""));

        prompt.handle_event(TuiEvent::Paste("a\r\nb".to_string()), SCREEN);
        prompt.handle_event(TuiEvent::FocusLost, SCREEN);

        assert_eq!(prompt.outcome(), Some(Outcome::submitted("a\nb")));
    }

    #[test]
    fn renders_label_over_background_with_cursor() {
        let prompt = LabelPrompt::new(OverlayHost::new(), config("ab"));
        let mut terminal = Terminal::new(TestBackend::new(SCREEN.width, SCREEN.height))
            .expect("terminal");

        terminal
            .draw(|frame| prompt.render(&(), frame))
            .expect("draw");

        let row: String = (0..SCREEN.width)
            .map(|x| terminal.backend().buffer()[(x, 4)].symbol())
            .collect();
        assert_eq!(row, "            │ ab │            ");
        assert_eq!(
            terminal.backend_mut().get_cursor_position().expect("cursor"),
            Position::new(16, 4)
        );
    }
}
