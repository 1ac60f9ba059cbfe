use serde::{Deserialize, Serialize};
use setu_core::{ActionDirective, FieldValues};

/// Payload of an `AUTO_FILL` message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AutoFillPayload {
    /// Scheme name, looked up in the portal's catalog
    pub scheme: String,
    /// Field values to replay, in order
    pub details: FieldValues,
}

impl From<ActionDirective> for AutoFillPayload {
    fn from(directive: ActionDirective) -> Self {
        Self {
            scheme: directive.scheme_name,
            details: directive.details,
        }
    }
}

/// Messages sent from the chat surface to the portal.
///
/// Wire form: `{"type": "AUTO_FILL", "payload": {"scheme": "...", "details": {...}}}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortalCommand {
    AutoFill(AutoFillPayload),
}

/// Readiness published by the portal back to the chat surface.
///
/// Wire form: `{"type": "LOADING"}` / `{"type": "READY"}`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortalSignal {
    Loading,
    Ready,
}
