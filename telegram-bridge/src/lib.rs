//! Telegram messaging collaborator.
//!
//! One chat drives the whole protocol: recommendations go out as HTML
//! messages, and free-text replies come back through `getUpdates` with an
//! idempotent cursor. Parsing and pending-signal matching live here too,
//! next to the transport that feeds them.

mod client;
mod confirm;
pub mod format;

pub use client::{InboundMessage, TelegramClient};
pub use confirm::{Confirmation, PendingSignals, ReplyParser};
