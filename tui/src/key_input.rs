use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;

/// Legacy key code some platforms report for every key that an input method is processing.
pub const IME_PROCESS_KEY_CODE: u32 = 229;

/// A key event as seen by the overlay, with the composition state the terminal key event lacks.
///
/// Hosts that embed an input method set `is_composing` (or forward the legacy key code) while a
/// composition is in progress; plain terminal input converts with `From<KeyEvent>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub event: KeyEvent,
    pub is_composing: bool,
    pub legacy_key_code: Option<u32>,
}

impl KeyInput {
    pub fn composing(event: KeyEvent) -> Self {
        Self {
            event,
            is_composing: true,
            legacy_key_code: None,
        }
    }

    pub fn with_legacy_key_code(mut self, code: u32) -> Self {
        self.legacy_key_code = Some(code);
        self
    }

    pub fn is_ime_composition(&self) -> bool {
        self.is_composing || self.legacy_key_code == Some(IME_PROCESS_KEY_CODE)
    }

    /// Press and auto-repeat count as key-down; releases do not.
    pub fn is_key_down(&self) -> bool {
        self.event.kind != KeyEventKind::Release
    }
}

impl From<KeyEvent> for KeyInput {
    fn from(event: KeyEvent) -> Self {
        Self {
            event,
            is_composing: false,
            legacy_key_code: None,
        }
    }
}
