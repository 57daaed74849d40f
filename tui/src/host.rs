//! The host window an overlay attaches to.
//!
//! The host owns the stack of attached surfaces, keyboard focus, and the wheel-event channel.
//! Everything runs on the UI thread inside one event dispatch at a time, so the shared state sits
//! behind `Rc<RefCell<_>>` and [`OverlayHost`] handles are cheap to clone.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::surface::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelPhase {
    /// Runs before any bubble listener, in registration order.
    Capture,
    Bubble,
}

/// A mouse-wheel step at a screen position. Negative `delta` scrolls up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelEvent {
    pub column: u16,
    pub row: u16,
    pub delta: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelFlow {
    Continue,
    /// Shadow every listener that would have run after this one.
    StopPropagation,
}

pub type WheelListener = Box<dyn FnMut(&WheelEvent) -> WheelFlow>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// What happened to a dispatched wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelDispatch {
    /// Number of listeners that saw the event.
    pub delivered: usize,
    pub stopped: bool,
}

/// The operations an overlay session needs from its host window.
pub trait HostWindow {
    fn allocate_surface_id(&self) -> SurfaceId;
    fn attach_surface(&self, id: SurfaceId);
    /// Returns `false` when the surface was not attached.
    fn detach_surface(&self, id: SurfaceId) -> bool;
    fn focus(&self, id: SurfaceId);
    /// Drop focus if `id` currently holds it.
    fn blur(&self, id: SurfaceId);
    fn add_wheel_listener(&self, phase: WheelPhase, listener: WheelListener) -> ListenerId;
    /// Returns `false` when no listener with that id was registered.
    fn remove_wheel_listener(&self, id: ListenerId) -> bool;
}

type SharedListener = Rc<RefCell<WheelListener>>;

#[derive(Default)]
struct HostState {
    next_id: u64,
    /// Attached surfaces, bottom to top.
    layers: Vec<SurfaceId>,
    focused: Option<SurfaceId>,
    capture: BTreeMap<ListenerId, SharedListener>,
    bubble: BTreeMap<ListenerId, SharedListener>,
}

impl HostState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct OverlayHost {
    state: Rc<RefCell<HostState>>,
}

impl OverlayHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self, id: SurfaceId) -> bool {
        self.state.borrow().layers.contains(&id)
    }

    pub fn attached_count(&self) -> usize {
        self.state.borrow().layers.len()
    }

    pub fn focused_surface(&self) -> Option<SurfaceId> {
        self.state.borrow().focused
    }

    pub fn wheel_listener_count(&self) -> usize {
        let state = self.state.borrow();
        state.capture.len() + state.bubble.len()
    }

    /// Deliver a wheel event: capture listeners first, then bubble listeners, stopping as soon as
    /// one of them asks to.
    ///
    /// Listeners are snapshotted up front, so a listener added or removed during dispatch only
    /// takes effect for the next event.
    pub fn dispatch_wheel(&self, event: &WheelEvent) -> WheelDispatch {
        let listeners: Vec<SharedListener> = {
            let state = self.state.borrow();
            state
                .capture
                .values()
                .chain(state.bubble.values())
                .cloned()
                .collect()
        };

        let mut delivered = 0;
        for listener in listeners {
            delivered += 1;
            let flow = (&mut **listener.borrow_mut())(event);
            if flow == WheelFlow::StopPropagation {
                return WheelDispatch {
                    delivered,
                    stopped: true,
                };
            }
        }
        WheelDispatch {
            delivered,
            stopped: false,
        }
    }
}

impl HostWindow for OverlayHost {
    fn allocate_surface_id(&self) -> SurfaceId {
        SurfaceId(self.state.borrow_mut().next_id())
    }

    fn attach_surface(&self, id: SurfaceId) {
        let mut state = self.state.borrow_mut();
        if !state.layers.contains(&id) {
            state.layers.push(id);
        }
    }

    fn detach_surface(&self, id: SurfaceId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.layers.len();
        state.layers.retain(|layer| *layer != id);
        if state.focused == Some(id) {
            state.focused = None;
        }
        state.layers.len() != before
    }

    fn focus(&self, id: SurfaceId) {
        self.state.borrow_mut().focused = Some(id);
    }

    fn blur(&self, id: SurfaceId) {
        let mut state = self.state.borrow_mut();
        if state.focused == Some(id) {
            state.focused = None;
        }
    }

    fn add_wheel_listener(&self, phase: WheelPhase, listener: WheelListener) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id());
        let listener = Rc::new(RefCell::new(listener));
        match phase {
            WheelPhase::Capture => state.capture.insert(id, listener),
            WheelPhase::Bubble => state.bubble.insert(id, listener),
        };
        id
    }

    fn remove_wheel_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        state.capture.remove(&id).is_some() || state.bubble.remove(&id).is_some()
    }
}
