//! Private per-unit recording
//!
//! While a unit runs, every reporting call is captured as a command in
//! a log owned by that unit alone. Nothing is shared until replay.

mod command;
mod sink;

pub use command::{EventCommand, EventLog};
pub use sink::RecordingSink;
