//! WebSocket transport layer.
//!
//! Home of [`ControlChannel`], the persistent duplex client that keeps
//! the agent attached to its remote coordinator.

mod control;

pub use control::{ControlChannel, RECONNECT_DELAY};
