mod outcome;
mod session;

pub use outcome::Outcome;
pub use session::AnchorPoint;
pub use session::SessionConfig;
