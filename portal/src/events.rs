use crate::state::FormPhase;

/// Observable changes on the portal, in the order they happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalEvent {
    PhaseChanged { scheme: String, phase: FormPhase },
    FieldFilled { key: String, value: String },
    /// An `AUTO_FILL` named a scheme the catalog does not know
    Ignored { scheme: String },
}
