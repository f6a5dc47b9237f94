//! Application-level orchestration.
//!
//! This module owns the run lifecycle, registry loading, summarization and the chat
//! relay, and keeps all of their state in one store. Presentation layers send
//! commands in and render the snapshots that come back out.

mod controller;
mod policy;
mod store;

pub use controller::{Command, CommandSender, ControllerHandle};
pub use policy::{FailurePolicy, CHAT_FALLBACK};
pub use store::Dashboard;
