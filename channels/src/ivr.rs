use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local};
use setu_core::dispatcher::APOLOGY;
use setu_core::history::{serialize_history, HistoryFormat};
use setu_core::{Backend, ChannelConfig, ChatRequest, ConversationTurn};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub const CALL_INITIATED: &str = "Initiating call to AI agent...";
pub const CALL_CONNECTED: &str = "Call connected.";
pub const CALL_GREETING: &str =
    "Namaste, main Yojana-Setu hoon. Aapki kya sahayata kar sakta hoon?";
pub const CALL_ENDED: &str = "Call ended.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Idle,
    Calling,
    Connected,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Idle => write!(f, "idle"),
            CallStatus::Calling => write!(f, "calling"),
            CallStatus::Connected => write!(f, "connected"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IvrError {
    #[error("no call is connected")]
    NotConnected,

    #[error("nothing was said")]
    Silence,
}

/// A line in the call log, rendered as `HH:MM:SS: message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallLogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for CallLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.at.format("%H:%M:%S"), self.message)
    }
}

#[derive(Debug)]
struct CallState {
    status: CallStatus,
    log: Vec<CallLogEntry>,
    turns: Vec<ConversationTurn>,
    observer: Option<UnboundedSender<CallLogEntry>>,
}

impl CallState {
    fn record(&mut self, message: impl Into<String>) {
        let entry = CallLogEntry {
            at: Local::now(),
            message: message.into(),
        };
        debug!("IVR: {}", entry.message);
        if let Some(observer) = &self.observer {
            let _ = observer.send(entry.clone());
        }
        self.log.push(entry);
    }
}

#[derive(Debug, Clone)]
struct SharedCall(Arc<Mutex<CallState>>);

impl SharedCall {
    fn lock(&self) -> MutexGuard<'_, CallState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// IVR-style call session.
///
/// The connect delay runs on a task owned by the session; ending the call or
/// dropping the session cancels it.
pub struct IvrSession {
    backend: Arc<dyn Backend>,
    phone: String,
    history_window: usize,
    connect_delay: Duration,
    call: SharedCall,
    connect_task: Option<JoinHandle<()>>,
}

impl IvrSession {
    pub fn new(backend: Arc<dyn Backend>, config: &ChannelConfig) -> Self {
        Self {
            backend,
            phone: config.demo_phone.clone(),
            history_window: config.history_window,
            connect_delay: config.ivr_connect_delay(),
            call: SharedCall(Arc::new(Mutex::new(CallState {
                status: CallStatus::Idle,
                log: Vec::new(),
                turns: Vec::new(),
                observer: None,
            }))),
            connect_task: None,
        }
    }

    /// Streams every new log entry to `observer`
    pub fn with_observer(self, observer: UnboundedSender<CallLogEntry>) -> Self {
        self.call.lock().observer = Some(observer);
        self
    }

    pub fn status(&self) -> CallStatus {
        self.call.lock().status
    }

    pub fn log(&self) -> Vec<CallLogEntry> {
        self.call.lock().log.clone()
    }

    /// Dials the agent. Returns false if a call is already in progress.
    pub fn start_call(&mut self) -> bool {
        {
            let mut call = self.call.lock();
            if call.status != CallStatus::Idle {
                return false;
            }
            call.status = CallStatus::Calling;
            call.turns.clear();
            call.record(CALL_INITIATED);
        }

        let call = self.call.clone();
        let delay = self.connect_delay;
        self.connect_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = call.lock();
            if state.status == CallStatus::Calling {
                state.status = CallStatus::Connected;
                state.record(CALL_CONNECTED);
                state.record(format!("AI: {}", CALL_GREETING));
                state.turns.push(ConversationTurn::assistant(CALL_GREETING));
                info!("IVR call connected");
            }
        }));
        true
    }

    /// Hangs up, cancelling a connect still pending. Returns false when idle.
    pub fn end_call(&mut self) -> bool {
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        let mut call = self.call.lock();
        if call.status == CallStatus::Idle {
            return false;
        }
        call.status = CallStatus::Idle;
        call.record(CALL_ENDED);
        true
    }

    /// Says something to the agent while connected and logs its answer
    pub async fn speak(&self, utterance: &str) -> Result<(), IvrError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(IvrError::Silence);
        }

        let history = {
            let mut call = self.call.lock();
            if call.status != CallStatus::Connected {
                return Err(IvrError::NotConnected);
            }
            call.record(format!("You: {}", utterance));
            let history =
                serialize_history(&call.turns, HistoryFormat::Plain, Some(self.history_window));
            call.turns.push(ConversationTurn::user(utterance));
            history
        };

        let answer = match history {
            Ok(history) => {
                let request = ChatRequest {
                    message: utterance.to_string(),
                    phone: self.phone.clone(),
                    history,
                };
                match self.backend.chat(&request).await {
                    Ok(reply) => reply.reply,
                    Err(e) => {
                        error!("IVR chat failed: {}", e);
                        APOLOGY.to_string()
                    }
                }
            }
            Err(e) => {
                error!("Failed to serialize call history: {}", e);
                APOLOGY.to_string()
            }
        };

        let mut call = self.call.lock();
        if call.status == CallStatus::Connected {
            call.record(format!("AI: {}", answer));
            call.turns.push(ConversationTurn::assistant(answer));
        }
        Ok(())
    }
}

impl Drop for IvrSession {
    fn drop(&mut self) {
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
    }
}
