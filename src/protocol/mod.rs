//! Wire protocol message types.
//!
//! The agent speaks a duplex, JSON-framed, fire-and-forget protocol:
//! commands in (`{"type": "START"}`), events out
//! (`{"type": "STATUS_UPDATE", "data": {...}}`). No correlation ids tie
//! a command to its effects.

mod command;
mod event;

pub use command::{Command, Inbound, decode_inbound};
pub use event::{OutboundEvent, ProgressData};
