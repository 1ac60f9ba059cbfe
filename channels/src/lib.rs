//! Channel emulators that reuse the caseworker backend without the portal.
//!
//! [`whatsapp::WhatsAppChat`] is a turn-based message thread with a simulated
//! microphone. [`ivr::IvrSession`] is a phone call with a timestamped event log.

pub mod ivr;
pub mod whatsapp;

pub use ivr::{CallLogEntry, CallStatus, IvrError, IvrSession};
pub use whatsapp::{MessageSender, WhatsAppChat, WhatsAppMessage};
