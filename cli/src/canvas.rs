//! Demo canvas for trying the label overlay interactively.
//!
//! Clicking empty space opens a new label at the click; clicking a label reopens it with its text.
//! The wheel scrolls the canvas through a bubble-phase listener on the host, so an open overlay
//! shadows it.

use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::style::Stylize as _;
use serde::Serialize;
use textlabel_protocol::AnchorPoint;
use textlabel_protocol::Outcome;
use textlabel_protocol::SessionConfig;
use textlabel_tui::HostWindow;
use textlabel_tui::OverlayHost;
use textlabel_tui::Renderable;
use textlabel_tui::WheelEvent;
use textlabel_tui::WheelFlow;
use textlabel_tui::WheelPhase;
use textlabel_tui::prompt_label;
use textlabel_tui::tui::Tui;
use textlabel_tui::tui::TuiEvent;
use unicode_width::UnicodeWidthStr;

use crate::config::LabelDefaults;

const HINT: &str = "click: add or edit a label   wheel: scroll   q: quit";

/// A committed label. `row` is in canvas coordinates, i.e. before scrolling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasLabel {
    pub text: String,
    pub column: u16,
    pub row: i32,
}

impl CanvasLabel {
    fn size(&self) -> (u16, u16) {
        let width = self
            .text
            .lines()
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0);
        let height = self.text.lines().count().max(1);
        (
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(height).unwrap_or(u16::MAX),
        )
    }

    /// Screen cell where the first line starts, matching how an open overlay centers the text.
    fn text_origin(&self, scroll: i32) -> (u16, i32) {
        let (width, height) = self.size();
        (
            self.column.saturating_sub(width / 2),
            self.row - scroll - i32::from(height / 2),
        )
    }

    fn contains(&self, column: u16, row: u16, scroll: i32) -> bool {
        let (width, height) = self.size();
        let (x, y) = self.text_origin(scroll);
        let row = i32::from(row);
        (x..x.saturating_add(width.max(1))).contains(&column)
            && (y..y + i32::from(height)).contains(&row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingEdit {
    /// Index of the label being revised; `None` for a new one.
    index: Option<usize>,
    column: u16,
    row: i32,
}

pub struct Canvas {
    labels: Vec<CanvasLabel>,
    scroll: Rc<Cell<i32>>,
    defaults: LabelDefaults,
    pending: Option<PendingEdit>,
}

impl Canvas {
    /// Create a canvas that scrolls on wheel events reaching `host`'s bubble phase.
    pub fn new(host: &OverlayHost, defaults: LabelDefaults) -> Self {
        let scroll = Rc::new(Cell::new(0));
        let listener_scroll = Rc::clone(&scroll);
        host.add_wheel_listener(
            WheelPhase::Bubble,
            Box::new(move |event: &WheelEvent| {
                listener_scroll.set(listener_scroll.get() + i32::from(event.delta));
                WheelFlow::Continue
            }),
        );
        Self {
            labels: Vec::new(),
            scroll,
            defaults,
            pending: None,
        }
    }

    pub fn labels(&self) -> &[CanvasLabel] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<CanvasLabel> {
        self.labels
    }

    pub fn scroll(&self) -> i32 {
        self.scroll.get()
    }

    fn label_at(&self, column: u16, row: u16) -> Option<usize> {
        let scroll = self.scroll();
        self.labels
            .iter()
            .rposition(|label| label.contains(column, row, scroll))
    }

    /// Start editing whatever is under the click and return the session to open.
    pub fn begin_edit(&mut self, column: u16, row: u16) -> SessionConfig {
        let scroll = self.scroll();
        let (pending, init_text, anchor) = match self.label_at(column, row) {
            Some(index) => {
                let label = &self.labels[index];
                let screen_row = u16::try_from(label.row - scroll).unwrap_or(row);
                (
                    PendingEdit {
                        index: Some(index),
                        column: label.column,
                        row: label.row,
                    },
                    label.text.clone(),
                    AnchorPoint::new(label.column, screen_row),
                )
            }
            None => (
                PendingEdit {
                    index: None,
                    column,
                    row: i32::from(row) + scroll,
                },
                String::new(),
                AnchorPoint::new(column, row),
            ),
        };
        self.pending = Some(pending);
        SessionConfig {
            init_text,
            anchor,
            stroke_color: self.defaults.stroke_color.clone(),
            font: self.defaults.font.clone(),
            opacity: self.defaults.opacity,
        }
    }

    /// Apply the outcome of the session opened by [`Canvas::begin_edit`].
    ///
    /// A revised label that comes back cancelled was emptied, so it is removed.
    pub fn finish_edit(&mut self, outcome: Outcome) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match (pending.index, outcome) {
            (Some(index), Outcome::Submitted { text }) => self.labels[index].text = text,
            (Some(index), Outcome::Cancelled) => {
                self.labels.remove(index);
            }
            (None, Outcome::Submitted { text }) => self.labels.push(CanvasLabel {
                text,
                column: pending.column,
                row: pending.row,
            }),
            (None, Outcome::Cancelled) => {}
        }
    }

    fn label_style(&self) -> Style {
        self.defaults
            .stroke_color
            .parse::<Color>()
            .map_or_else(|_| Style::default(), |color| Style::default().fg(color))
    }
}

impl Renderable for Canvas {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        let scroll = self.scroll();
        let style = self.label_style();
        let editing = self.pending.and_then(|pending| pending.index);
        for (index, label) in self.labels.iter().enumerate() {
            if Some(index) == editing {
                continue;
            }
            let (x, y) = label.text_origin(scroll);
            for (offset, line) in (0..).zip(label.text.lines()) {
                let Ok(row) = u16::try_from(y + offset) else {
                    continue;
                };
                if row < area.bottom() && x < area.right() {
                    buf.set_stringn(x, row, line, usize::from(area.right() - x), style);
                }
            }
        }
        if let Some(last_row) = area.bottom().checked_sub(1) {
            let hint = ratatui::text::Line::from(HINT.dim());
            buf.set_line(area.x, last_row, &hint, area.width);
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') => key.modifiers.is_empty(),
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Run the canvas until the user quits and return the labels on it.
pub async fn run_canvas(
    tui: &mut Tui,
    defaults: LabelDefaults,
) -> anyhow::Result<Vec<CanvasLabel>> {
    let host = OverlayHost::new();
    let mut canvas = Canvas::new(&host, defaults);
    tui.draw(|frame| canvas.render(frame.area(), frame.buffer_mut()))?;

    while let Some(event) = tui.next_event().await {
        match event {
            TuiEvent::Key(key) if is_quit(&key) => break,
            TuiEvent::Wheel(wheel) => {
                host.dispatch_wheel(&wheel);
            }
            TuiEvent::Click { column, row } => {
                let config = canvas.begin_edit(column, row);
                let outcome = prompt_label(tui, &host, config, &canvas).await?;
                canvas.finish_edit(outcome);
                tracing::debug!(labels = canvas.labels().len(), "canvas label edited");
            }
            TuiEvent::Key(_) | TuiEvent::Paste(_) | TuiEvent::FocusLost | TuiEvent::Draw => {}
        }
        tui.draw(|frame| canvas.render(frame.area(), frame.buffer_mut()))?;
    }

    Ok(canvas.into_labels())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use textlabel_tui::LabelPrompt;

    fn rows(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    fn draw(canvas: &Canvas) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(16, 5)).expect("terminal");
        terminal
            .draw(|frame| canvas.render(frame.area(), frame.buffer_mut()))
            .expect("draw");
        rows(terminal.backend().buffer())
    }

    fn wheel(delta: i16) -> WheelEvent {
        WheelEvent {
            column: 0,
            row: 0,
            delta,
        }
    }

    #[test]
    fn clicking_empty_space_opens_a_new_label_there() {
        let host = OverlayHost::new();
        let mut canvas = Canvas::new(&host, LabelDefaults::default());

        let config = canvas.begin_edit(6, 2);
        assert_eq!(config.init_text, "");
        assert_eq!(config.anchor, AnchorPoint::new(6, 2));

        canvas.finish_edit(Outcome::submitted("hey"));
        assert_eq!(
            canvas.labels(),
            &[CanvasLabel {
                text: "hey".to_string(),
                column: 6,
                row: 2,
            }]
        );
        assert_eq!(draw(&canvas)[2], "     hey        ");
    }

    #[test]
    fn cancelled_new_label_leaves_the_canvas_alone() {
        let host = OverlayHost::new();
        let mut canvas = Canvas::new(&host, LabelDefaults::default());

        canvas.begin_edit(3, 1);
        canvas.finish_edit(Outcome::Cancelled);

        assert!(canvas.labels().is_empty());
    }

    #[test]
    fn clicking_a_label_reopens_it_and_an_emptied_label_is_removed() {
        let host = OverlayHost::new();
        let mut canvas = Canvas::new(&host, LabelDefaults::default());
        canvas.begin_edit(6, 2);
        canvas.finish_edit(Outcome::submitted("hey"));

        let config = canvas.begin_edit(7, 2);
        assert_eq!(config.init_text, "hey");
        assert_eq!(config.anchor, AnchorPoint::new(6, 2));
        assert_eq!(draw(&canvas)[2], " ".repeat(16));

        canvas.finish_edit(Outcome::submitted("hello"));
        assert_eq!(canvas.labels()[0].text, "hello");

        canvas.begin_edit(6, 2);
        canvas.finish_edit(Outcome::Cancelled);
        assert!(canvas.labels().is_empty());
    }

    #[test]
    fn wheel_scrolls_the_canvas_only_while_no_label_is_open() {
        let host = OverlayHost::new();
        let mut canvas = Canvas::new(&host, LabelDefaults::default());
        canvas.begin_edit(6, 2);
        canvas.finish_edit(Outcome::submitted("hey"));

        host.dispatch_wheel(&wheel(1));
        assert_eq!(canvas.scroll(), 1);
        assert_eq!(draw(&canvas)[1], "     hey        ");

        let config = canvas.begin_edit(6, 1);
        let mut prompt = LabelPrompt::new(host.clone(), config);
        host.dispatch_wheel(&wheel(1));
        assert_eq!(canvas.scroll(), 1);

        prompt.handle_event(
            TuiEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            Rect::new(0, 0, 16, 5),
        );
        canvas.finish_edit(prompt.outcome().expect("outcome"));
        host.dispatch_wheel(&wheel(-1));
        assert_eq!(canvas.scroll(), 0);
        assert_eq!(canvas.labels()[0].text, "hey");
    }

    #[test]
    fn new_label_row_is_stored_in_canvas_coordinates() {
        let host = OverlayHost::new();
        let mut canvas = Canvas::new(&host, LabelDefaults::default());
        host.dispatch_wheel(&wheel(3));

        canvas.begin_edit(2, 1);
        canvas.finish_edit(Outcome::submitted("x"));

        assert_eq!(canvas.labels()[0].row, 4);
    }

    #[test]
    fn hint_sits_on_the_last_row() {
        let host = OverlayHost::new();
        let canvas = Canvas::new(&host, LabelDefaults::default());
        let rows = draw(&canvas);
        assert_eq!(rows[4], "click: add or ed");
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_quit(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::NONE
        )));
    }
}
