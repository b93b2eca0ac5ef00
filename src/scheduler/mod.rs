//! Reminder and weekly-report scheduler.

pub mod background;
pub mod registry;

pub use background::{start_scheduler, wake};
pub use registry::{Trigger, TriggerAction, TriggerKey, TriggerRegistry};
