//! Mock government portal surface.
//!
//! The portal listens on a [`setu_ipc::PortalEndpoint`], and on every
//! `AUTO_FILL` it replays the directive's fields into the matching scheme form
//! with fixed pacing. The [`reveal::PortalRevealer`] is the chat surface's side:
//! it makes the portal visible and forwards directives once the portal is ready.

pub mod events;
pub mod render;
pub mod reveal;
pub mod state;
pub mod surface;

pub use events::PortalEvent;
pub use reveal::PortalRevealer;
pub use state::{FormPhase, PortalFormState, SharedFormState};
pub use surface::{FillTimings, PortalError, PortalHandle, PortalSurface};
