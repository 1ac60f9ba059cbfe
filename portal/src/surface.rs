use std::sync::Arc;
use std::time::Duration;

use setu_core::schemes::DEFAULT_SCHEME;
use setu_core::{PortalConfig, SchemeCatalog};
use setu_ipc::{AutoFillPayload, PortalCommand, PortalEndpoint};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::PortalEvent;
use crate::state::{FormPhase, PortalFormState, SharedFormState};

/// Errors from handling a portal command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error("unknown scheme '{0}'")]
    UnknownScheme(String),
}

/// Pacing of one fill cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTimings {
    pub access_delay: Duration,
    pub field_delay: Duration,
    pub submit_delay: Duration,
}

impl Default for FillTimings {
    fn default() -> Self {
        Self::from(&PortalConfig::default())
    }
}

impl From<&PortalConfig> for FillTimings {
    fn from(config: &PortalConfig) -> Self {
        Self {
            access_delay: config.access_delay(),
            field_delay: config.field_delay(),
            submit_delay: config.submit_delay(),
        }
    }
}

type EventSink = Option<UnboundedSender<PortalEvent>>;

fn emit(events: &EventSink, event: PortalEvent) {
    if let Some(tx) = events {
        // Observer may have gone away; the portal keeps working without it
        let _ = tx.send(event);
    }
}

/// Moves the form to `phase` unless a newer cycle has begun. Returns false when stale.
fn set_phase(state: &SharedFormState, events: &EventSink, cycle: u64, phase: FormPhase) -> bool {
    let scheme = {
        let mut form = state.lock();
        if form.cycle != cycle {
            return false;
        }
        form.phase = phase;
        form.active_scheme.clone()
    };
    debug!("Portal phase: {}", phase);
    emit(events, PortalEvent::PhaseChanged { scheme, phase });
    true
}

async fn run_fill(
    state: SharedFormState,
    events: EventSink,
    timings: FillTimings,
    cycle: u64,
    fields: Vec<(String, String)>,
) {
    tokio::time::sleep(timings.access_delay).await;
    if !set_phase(&state, &events, cycle, FormPhase::FormFilling) {
        debug!("Fill cycle {} superseded before filling", cycle);
        return;
    }

    for (key, value) in fields {
        {
            let mut form = state.lock();
            if form.cycle != cycle {
                debug!("Fill cycle {} superseded, dropping '{}'", cycle, key);
                return;
            }
            form.values.insert(key.clone(), value.clone());
        }
        emit(&events, PortalEvent::FieldFilled { key, value });
        tokio::time::sleep(timings.field_delay).await;
    }

    tokio::time::sleep(timings.submit_delay).await;
    if set_phase(&state, &events, cycle, FormPhase::Submitted) {
        info!("Portal application submitted");
    }
}

/// The mock portal: a scheme form that fills itself from `AUTO_FILL` commands
pub struct PortalSurface {
    catalog: Arc<SchemeCatalog>,
    timings: FillTimings,
    state: SharedFormState,
    events: EventSink,
    fill_task: Option<JoinHandle<()>>,
}

impl PortalSurface {
    pub fn new(catalog: Arc<SchemeCatalog>, timings: FillTimings) -> Self {
        Self {
            catalog,
            timings,
            state: SharedFormState::new(PortalFormState::new(DEFAULT_SCHEME)),
            events: None,
            fill_task: None,
        }
    }

    /// Publishes every transition and field write to `events`
    pub fn with_events(mut self, events: UnboundedSender<PortalEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Handle to the form state for rendering
    pub fn state(&self) -> SharedFormState {
        self.state.clone()
    }

    pub fn is_filling(&self) -> bool {
        self.fill_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Applies one command. Unknown schemes leave the form untouched.
    ///
    /// A new `AUTO_FILL` cancels a fill cycle still in progress.
    pub fn handle_command(&mut self, command: PortalCommand) -> Result<(), PortalError> {
        match command {
            PortalCommand::AutoFill(payload) => self.auto_fill(payload),
        }
    }

    fn auto_fill(&mut self, payload: AutoFillPayload) -> Result<(), PortalError> {
        let AutoFillPayload { scheme, details } = payload;
        let Some(template) = self.catalog.get(&scheme) else {
            emit(&self.events, PortalEvent::Ignored {
                scheme: scheme.clone(),
            });
            return Err(PortalError::UnknownScheme(scheme));
        };

        let fields: Vec<(String, String)> = details
            .into_iter()
            .filter(|(key, _)| {
                let declared = template.declares(key);
                if !declared {
                    debug!("Dropping field '{}' not on the {} form", key, scheme);
                }
                declared
            })
            .collect();

        if let Some(previous) = self.fill_task.take() {
            if !previous.is_finished() {
                info!("New AUTO_FILL supersedes the running fill cycle");
            }
            previous.abort();
        }

        let cycle = self.state.lock().begin(&scheme);
        emit(&self.events, PortalEvent::PhaseChanged {
            scheme: scheme.clone(),
            phase: FormPhase::AgentAccessing,
        });
        info!("Agent filling {} form with {} fields", scheme, fields.len());

        self.fill_task = Some(tokio::spawn(run_fill(
            self.state.clone(),
            self.events.clone(),
            self.timings,
            cycle,
            fields,
        )));
        Ok(())
    }

    /// Waits for the current fill cycle, if any, to finish
    pub async fn wait_idle(&mut self) {
        if let Some(task) = self.fill_task.take() {
            if let Err(e) = task.await {
                debug!("Fill task ended early: {}", e);
            }
        }
    }

    /// Serves commands from `endpoint` until every link is dropped
    pub async fn serve(mut self, mut endpoint: PortalEndpoint) {
        endpoint.signal_ready();
        while let Some(command) = endpoint.recv().await {
            if let Err(e) = self.handle_command(command) {
                warn!("Ignoring AUTO_FILL: {}", e);
            }
        }
        debug!("Portal endpoint closed");
    }

    /// Runs [`PortalSurface::serve`] on a task tied to the returned handle
    pub fn spawn(self, endpoint: PortalEndpoint) -> PortalHandle {
        let state = self.state();
        let task = tokio::spawn(self.serve(endpoint));
        PortalHandle { state, task }
    }
}

impl Drop for PortalSurface {
    fn drop(&mut self) {
        if let Some(task) = self.fill_task.take() {
            task.abort();
        }
    }
}

/// Owns a running portal; dropping it tears the portal down, fill task included
#[derive(Debug)]
pub struct PortalHandle {
    state: SharedFormState,
    task: JoinHandle<()>,
}

impl PortalHandle {
    pub fn state(&self) -> SharedFormState {
        self.state.clone()
    }

    pub fn snapshot(&self) -> PortalFormState {
        self.state.snapshot()
    }
}

impl Drop for PortalHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
