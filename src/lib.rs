//! Client-side controller for the Trackit notebook runner.
//!
//! Drives a remote Gateway: list notebooks and logs, start and stop a run, keep
//! the run status reconciled by polling, request log summaries from a chosen
//! inference provider, and relay a best-effort chat.

pub mod feed;
pub mod gateway;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod telemetry;
pub mod view;

pub use gateway::{GatewayClient, GatewayError};
pub use model::{ControllerConfig, Provider};
pub use orchestrator::{Command, ControllerHandle, Dashboard};
