use std::io;
use std::io::Stdout;
use std::io::stdout;

use crossterm::cursor::Show;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableFocusChange;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableFocusChange;
use crossterm::event::EnableMouseCapture;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Frame;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tokio_stream::StreamExt;

use crate::host::WheelEvent;

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Enter raw mode on the alternate screen, with mouse, bracketed paste and focus reporting on.
pub fn init() -> io::Result<Terminal> {
    enable_raw_mode()?;
    set_panic_hook();
    execute!(
        stdout(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste,
        EnableFocusChange
    )?;
    Terminal::new(CrosstermBackend::new(stdout()))
}

/// Undo everything [`init`] did.
pub fn restore() -> io::Result<()> {
    execute!(
        stdout(),
        DisableFocusChange,
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen,
        Show
    )?;
    disable_raw_mode()
}

fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        hook(panic_info);
    }));
}

/// Terminal input the label UI reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    FocusLost,
    Wheel(WheelEvent),
    Click { column: u16, row: u16 },
    /// The screen needs repainting (resize, focus regained).
    Draw,
}

impl TuiEvent {
    pub fn from_crossterm(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) => Some(TuiEvent::Key(key)),
            Event::Paste(text) => Some(TuiEvent::Paste(text)),
            Event::FocusLost => Some(TuiEvent::FocusLost),
            Event::FocusGained | Event::Resize(_, _) => Some(TuiEvent::Draw),
            Event::Mouse(mouse) => Self::from_mouse(mouse),
        }
    }

    fn from_mouse(mouse: MouseEvent) -> Option<Self> {
        let wheel = |delta| {
            Some(TuiEvent::Wheel(WheelEvent {
                column: mouse.column,
                row: mouse.row,
                delta,
            }))
        };
        match mouse.kind {
            MouseEventKind::ScrollUp => wheel(-1),
            MouseEventKind::ScrollDown => wheel(1),
            MouseEventKind::Down(MouseButton::Left) => Some(TuiEvent::Click {
                column: mouse.column,
                row: mouse.row,
            }),
            _ => None,
        }
    }
}

pub struct Tui {
    pub terminal: Terminal,
    events: Option<EventStream>,
}

impl Tui {
    pub fn new(terminal: Terminal) -> Self {
        Self {
            terminal,
            events: None,
        }
    }

    /// Wait for the next event the UI cares about. `None` once the input stream has ended.
    pub async fn next_event(&mut self) -> Option<TuiEvent> {
        let events = self.events.get_or_insert_with(EventStream::new);
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let Some(event) = TuiEvent::from_crossterm(event) {
                        return Some(event);
                    }
                }
                Err(err) => {
                    tracing::warn!("failed to read terminal event: {err}");
                    return None;
                }
            }
        }
        None
    }

    /// Drop the crossterm reader so it stops consuming stdin; the next [`Tui::next_event`]
    /// starts a fresh one.
    pub fn pause_events(&mut self) {
        self.events = None;
    }

    pub fn area(&self) -> io::Result<Rect> {
        let size = self.terminal.size()?;
        Ok(Rect::new(0, 0, size.width, size.height))
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }
}
