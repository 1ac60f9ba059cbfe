// This crate centralizes the cross-surface contract between the chat surface
// and the mock portal: message definitions and the link/endpoint channel.

pub mod link; // Chat surface -> portal frames, portal -> chat surface readiness
pub mod portal_messages; // AUTO_FILL / READY message shapes

pub use link::{portal_channel, LinkError, PortalEndpoint, PortalLink};
pub use portal_messages::{AutoFillPayload, PortalCommand, PortalSignal};
