pub mod enums;
pub mod profile;
pub mod health_entry;
pub mod medication;
pub mod cycle;
pub mod achievement;

pub use enums::*;
pub use profile::*;
pub use health_entry::*;
pub use medication::*;
pub use cycle::*;
pub use achievement::*;

/// Chat-platform user identifier. Private chats share the user's id.
pub type UserId = i64;
