use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use setu_core::FieldValues;

/// Progress of one fill cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Draft,
    AgentAccessing,
    FormFilling,
    Submitted,
}

impl FormPhase {
    /// Status text shown in the portal header
    pub fn label(&self) -> &'static str {
        match self {
            FormPhase::Draft => "Draft",
            FormPhase::AgentAccessing => "Agent Accessing Portal...",
            FormPhase::FormFilling => "Form Filling...",
            FormPhase::Submitted => "Application Submitted Successfully ✅",
        }
    }

    /// Text on the submit button
    pub fn button_label(&self) -> &'static str {
        match self {
            FormPhase::Draft => "Waiting for AI Agent...",
            other => other.label(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FormPhase::Submitted)
    }
}

impl fmt::Display for FormPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the portal form currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalFormState {
    pub active_scheme: String,
    pub values: FieldValues,
    pub phase: FormPhase,
    /// Bumped by every [`PortalFormState::begin`]; a fill task only writes while it matches
    pub cycle: u64,
}

impl PortalFormState {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            active_scheme: scheme.into(),
            values: FieldValues::new(),
            phase: FormPhase::Draft,
            cycle: 0,
        }
    }

    /// Starts a new cycle: clears values and switches scheme. Returns the cycle id.
    pub fn begin(&mut self, scheme: &str) -> u64 {
        self.active_scheme = scheme.to_string();
        self.values.clear();
        self.phase = FormPhase::AgentAccessing;
        self.cycle += 1;
        self.cycle
    }

    pub fn is_filled(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Form state shared between the portal's fill task and its observers
#[derive(Debug, Clone)]
pub struct SharedFormState(Arc<Mutex<PortalFormState>>);

impl SharedFormState {
    pub fn new(state: PortalFormState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, PortalFormState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> PortalFormState {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_resets_values_and_switches_scheme() {
        let mut state = PortalFormState::new("PM Awas Yojana");
        state.values.insert("income".to_string(), "15000".to_string());
        state.phase = FormPhase::Submitted;

        let first = state.begin("PM Kisan");
        assert_eq!(state.active_scheme, "PM Kisan");
        assert!(state.values.is_empty());
        assert_eq!(state.phase, FormPhase::AgentAccessing);

        let second = state.begin("Ladli Behna");
        assert!(second > first);
        assert_eq!(state.cycle, second);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FormPhase::Draft.button_label(), "Waiting for AI Agent...");
        assert_eq!(FormPhase::FormFilling.button_label(), "Form Filling...");
        assert!(FormPhase::Submitted.is_terminal());
        assert!(!FormPhase::FormFilling.is_terminal());
    }
}
