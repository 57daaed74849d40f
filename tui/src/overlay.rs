//! The label editing session.
//!
//! [`TextOverlay::create`] attaches a fresh surface to the host, installs its handlers plus a
//! capturing wheel suppressor, focuses it and selects everything. From then on the host feeds it
//! [`OverlayEvent`]s until a terminal event (Escape, Enter, focus loss) fires exactly one of the
//! outcome callbacks and tears the session down.
//!
//! # Session state
//!
//! ```text
//! Active ──commit──▶ Committing ──▶ TornDown
//!    └────cancel──▶ Cancelling ──▶ TornDown
//! ```
//!
//! Every entry point checks the state first; once `TornDown`, events are answered with
//! [`Handled::Inert`] and a further `teardown` is a no-op.

use std::collections::BTreeSet;

use textlabel_protocol::AnchorPoint;
use textlabel_protocol::Outcome;
use textlabel_protocol::SessionConfig;

use crate::host::HostWindow;
use crate::host::ListenerId;
use crate::host::WheelEvent;
use crate::host::WheelFlow;
use crate::host::WheelPhase;
use crate::key_input::KeyInput;
use crate::paste::PasteEvent;
use crate::paste::PasteOutcome;
use crate::paste::native_paste;
use crate::paste::sanitize_paste;
use crate::resolver::KeyDecision;
use crate::resolver::resolve_commit;
use crate::resolver::resolve_key;
use crate::surface::EditableSurface;
use crate::surface::SurfaceId;
use crate::surface::SurfaceStyle;

/// The two ways back into the host application. Exactly one of them runs, once.
pub struct OutcomeCallbacks {
    on_submit: Box<dyn FnOnce(String)>,
    on_cancel: Box<dyn FnOnce()>,
}

impl OutcomeCallbacks {
    pub fn new(
        on_submit: impl FnOnce(String) + 'static,
        on_cancel: impl FnOnce() + 'static,
    ) -> Self {
        Self {
            on_submit: Box::new(on_submit),
            on_cancel: Box::new(on_cancel),
        }
    }

    fn fire(self, outcome: &Outcome) {
        match outcome {
            Outcome::Submitted { text } => (self.on_submit)(text.clone()),
            Outcome::Cancelled => (self.on_cancel)(),
        }
    }
}

impl std::fmt::Debug for OutcomeCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeCallbacks").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Committing,
    Cancelling,
    TornDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HandlerKind {
    Paste,
    Key,
    FocusLoss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    Key(KeyInput),
    Paste(PasteEvent),
    FocusLost,
}

impl OverlayEvent {
    fn handler(&self) -> HandlerKind {
        match self {
            OverlayEvent::Key(_) => HandlerKind::Key,
            OverlayEvent::Paste(_) => HandlerKind::Paste,
            OverlayEvent::FocusLost => HandlerKind::FocusLoss,
        }
    }
}

/// What the overlay did with an event.
#[derive(Debug, PartialEq, Eq)]
pub enum Handled {
    /// The event ended the session with this outcome.
    Finished(Outcome),
    /// The surface applied its default editing behavior.
    Edited,
    /// The event was swallowed (key releases, IME composition, keys with no editing meaning).
    Ignored,
    Paste(PasteOutcome),
    /// The session is already torn down.
    Inert,
}

pub struct TextOverlay<H: HostWindow> {
    host: H,
    surface: EditableSurface,
    init_text: String,
    state: SessionState,
    handlers: BTreeSet<HandlerKind>,
    wheel_suppressor: Option<ListenerId>,
    callbacks: Option<OutcomeCallbacks>,
}

impl<H: HostWindow> TextOverlay<H> {
    pub fn create(host: H, config: SessionConfig, callbacks: OutcomeCallbacks) -> Self {
        let id = host.allocate_surface_id();
        let mut surface = EditableSurface::new(id, SurfaceStyle::from_config(&config));
        surface.set_text(&config.init_text);

        host.attach_surface(id);
        let wheel_suppressor = host.add_wheel_listener(
            WheelPhase::Capture,
            Box::new(|_: &WheelEvent| WheelFlow::StopPropagation),
        );
        host.focus(id);
        surface.select_all();

        tracing::debug!(
            surface = ?id,
            x = config.anchor.x,
            y = config.anchor.y,
            "label overlay created"
        );

        Self {
            host,
            surface,
            init_text: config.init_text,
            state: SessionState::Active,
            handlers: BTreeSet::from([
                HandlerKind::Paste,
                HandlerKind::Key,
                HandlerKind::FocusLoss,
            ]),
            wheel_suppressor: Some(wheel_suppressor),
            callbacks: Some(callbacks),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn surface(&self) -> &EditableSurface {
        &self.surface
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface.id()
    }

    pub fn anchor(&self) -> AnchorPoint {
        self.surface.style().anchor
    }

    pub fn text(&self) -> &str {
        self.surface.text()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn handle_event(&mut self, event: OverlayEvent) -> Handled {
        if self.state != SessionState::Active || !self.handlers.contains(&event.handler()) {
            return Handled::Inert;
        }
        match event {
            OverlayEvent::Key(key) => self.handle_key(&key),
            OverlayEvent::Paste(paste) => self.handle_paste(&paste),
            OverlayEvent::FocusLost => Handled::Finished(self.commit()),
        }
    }

    /// Take focus away from the surface, which ends the session like any other focus loss.
    pub fn blur(&mut self) -> Handled {
        self.host.blur(self.surface.id());
        self.handle_event(OverlayEvent::FocusLost)
    }

    /// Tear the session down from outside.
    ///
    /// A session still active at this point resolves as cancelled, so the host always hears
    /// back exactly once. Returns `false` when the session was already torn down.
    pub fn teardown(&mut self) -> bool {
        match self.state {
            SessionState::TornDown => false,
            SessionState::Active => {
                self.cancel();
                true
            }
            SessionState::Committing | SessionState::Cancelling => {
                self.release();
                true
            }
        }
    }

    fn handle_key(&mut self, key: &KeyInput) -> Handled {
        match resolve_key(key, &self.init_text) {
            KeyDecision::RevertAndCommit => {
                self.surface.set_text(&self.init_text);
                Handled::Finished(self.commit())
            }
            KeyDecision::Cancel => Handled::Finished(self.cancel()),
            KeyDecision::Commit => Handled::Finished(self.commit()),
            KeyDecision::Ignore => Handled::Ignored,
            KeyDecision::Default => {
                if self.surface.apply_key(&key.event) {
                    Handled::Edited
                } else {
                    Handled::Ignored
                }
            }
        }
    }

    fn handle_paste(&mut self, paste: &PasteEvent) -> Handled {
        let outcome = sanitize_paste(&mut self.surface, paste);
        if !outcome.prevents_default() {
            native_paste(&mut self.surface, paste);
        }
        Handled::Paste(outcome)
    }

    fn commit(&mut self) -> Outcome {
        self.state = SessionState::Committing;
        let outcome = resolve_commit(self.surface.text());
        if let Some(callbacks) = self.callbacks.take() {
            callbacks.fire(&outcome);
        }
        self.release();
        outcome
    }

    /// Cancel without running the commit procedure: teardown first, then the callback.
    fn cancel(&mut self) -> Outcome {
        self.state = SessionState::Cancelling;
        self.release();
        let outcome = Outcome::Cancelled;
        if let Some(callbacks) = self.callbacks.take() {
            callbacks.fire(&outcome);
        }
        outcome
    }

    fn release(&mut self) {
        if self.state == SessionState::TornDown {
            return;
        }
        self.handlers.clear();
        if let Some(listener) = self.wheel_suppressor.take() {
            self.host.remove_wheel_listener(listener);
        }
        self.host.blur(self.surface.id());
        self.host.detach_surface(self.surface.id());
        self.state = SessionState::TornDown;
        tracing::debug!(surface = ?self.surface.id(), "label overlay torn down");
    }
}

impl<H: HostWindow> Drop for TextOverlay<H> {
    fn drop(&mut self) {
        // Never leave the wheel suppressor installed on the host.
        self.teardown();
    }
}
