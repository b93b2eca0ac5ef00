//! Conversation state machine: typed dialog states, input classification,
//! field validation, the pure transition table, per-user sessions and the
//! engine that executes side effects.

pub mod engine;
pub mod input;
pub mod machine;
pub mod session;
pub mod state;
pub mod validation;

pub use engine::{handle, Inbound};
pub use input::Input;
pub use session::DialogSessions;
pub use state::DialogState;
