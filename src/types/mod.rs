pub mod events;

// Re-export commonly used types
pub use events::{FatalKind, GainSelection, Notification, SessionEvent};
