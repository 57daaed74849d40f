// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod host;
mod key_input;
mod label_prompt;
mod overlay;
mod paste;
mod render;
mod resolver;
mod surface;
pub mod tui;

pub use host::HostWindow;
pub use host::ListenerId;
pub use host::OverlayHost;
pub use host::WheelDispatch;
pub use host::WheelEvent;
pub use host::WheelFlow;
pub use host::WheelListener;
pub use host::WheelPhase;
pub use key_input::IME_PROCESS_KEY_CODE;
pub use key_input::KeyInput;
pub use label_prompt::LabelPrompt;
pub use label_prompt::prompt_label;
pub use overlay::Handled;
pub use overlay::OutcomeCallbacks;
pub use overlay::OverlayEvent;
pub use overlay::SessionState;
pub use overlay::TextOverlay;
pub use paste::PasteError;
pub use paste::PasteEvent;
pub use paste::PasteOutcome;
pub use paste::normalize_line_endings;
pub use paste::sanitize_paste;
pub use render::LabelView;
pub use render::label_area;
pub use render::renderable::Renderable;
pub use resolver::KeyDecision;
pub use resolver::resolve_commit;
pub use resolver::resolve_key;
pub use surface::EditableSurface;
pub use surface::SURFACE_KIND;
pub use surface::Selection;
pub use surface::SurfaceError;
pub use surface::SurfaceId;
pub use surface::SurfaceStyle;
