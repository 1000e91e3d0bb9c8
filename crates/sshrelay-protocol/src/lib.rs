//! sshrelay-protocol — wire types for the WS relay protocol.
//!
//! Inbound: one JSON object per frame carrying an `action` verb plus the
//! fields that verb requires. Outbound: one JSON object per frame with
//! exactly one of the top-level keys `info`, `error`, `output`, or
//! `directories`.

pub mod action;
pub mod outbound;

pub use action::{Action, ActionError, ActionMessage, Credentials};
pub use outbound::Outbound;
