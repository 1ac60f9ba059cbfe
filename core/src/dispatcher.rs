//! Chat turn dispatcher: one citizen message in, one assistant turn out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::client::Backend;
use crate::directive::{extract_directive, ActionDirective};
use crate::history::{serialize_history, HistoryFormat};
use crate::session::AppSession;
use crate::types::{ChatRequest, ConversationTurn};

/// Assistant turn appended when the backend cannot be reached or rejects the request
pub const APOLOGY: &str = "Maaf kijiye, server se judne mein dikkat ho rahi hai.";

/// Receives directives extracted from assistant replies
pub trait DirectiveHandler: Send + Sync {
    /// Called once per extracted directive; must not block
    fn on_directive(&self, directive: ActionDirective);
}

/// Reasons a message was not dispatched at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("a chat request is already in flight")]
    Busy,
}

/// What a dispatched turn produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Assistant turn appended to the transcript
    pub reply: ConversationTurn,
    /// Directive handed to the handler, if the reply carried one
    pub directive: Option<ActionDirective>,
    /// True when the backend call failed and the apology was appended
    pub failed: bool,
}

/// Clears the in-flight flag on every exit path
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the chat transcript and sends each turn to the backend
pub struct ChatDispatcher {
    backend: Arc<dyn Backend>,
    session: AppSession,
    transcript: Mutex<Vec<ConversationTurn>>,
    in_flight: AtomicBool,
    handler: Option<Arc<dyn DirectiveHandler>>,
}

impl ChatDispatcher {
    /// Creates a dispatcher whose transcript starts with the session's welcome turn
    pub fn new(backend: Arc<dyn Backend>, session: AppSession) -> Self {
        let welcome = session.welcome_turn();
        Self {
            backend,
            session,
            transcript: Mutex::new(vec![welcome]),
            in_flight: AtomicBool::new(false),
            handler: None,
        }
    }

    pub fn with_directive_handler(mut self, handler: Arc<dyn DirectiveHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn session(&self) -> &AppSession {
        &self.session
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot of the transcript
    pub fn transcript(&self) -> Vec<ConversationTurn> {
        self.turns().clone()
    }

    fn turns(&self) -> MutexGuard<'_, Vec<ConversationTurn>> {
        self.transcript
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn append(&self, turn: ConversationTurn) {
        self.turns().push(turn);
    }

    fn fail(&self) -> TurnOutcome {
        let reply = ConversationTurn::assistant(APOLOGY);
        self.append(reply.clone());
        TurnOutcome {
            reply,
            directive: None,
            failed: true,
        }
    }

    /// Dispatches one citizen message.
    ///
    /// The user turn is appended before the request goes out. Backend failures
    /// are reported as an apology turn, not as an error.
    pub async fn send(&self, input: &str) -> Result<TurnOutcome, DispatchError> {
        let message = input.trim();
        if message.is_empty() {
            return Err(DispatchError::EmptyMessage);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(DispatchError::Busy)?;

        let history = {
            let mut turns = self.turns();
            let history = serialize_history(&turns, HistoryFormat::Plain, None);
            turns.push(ConversationTurn::user(message));
            history
        };

        let history = match history {
            Ok(history) => history,
            Err(e) => {
                error!("Failed to serialize chat history: {}", e);
                return Ok(self.fail());
            }
        };

        let request = ChatRequest {
            message: message.to_string(),
            phone: self.session.phone().to_string(),
            history,
        };

        debug!("Dispatching chat turn for {}", request.phone);
        let reply = match self.backend.chat(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Chat Error: {}", e);
                return Ok(self.fail());
            }
        };

        let extraction = extract_directive(&reply.reply);
        let turn = ConversationTurn::assistant(extraction.display_text);
        self.append(turn.clone());

        if let Some(directive) = &extraction.directive {
            info!("Reply requested portal for scheme '{}'", directive.scheme_name);
            match &self.handler {
                Some(handler) => handler.on_directive(directive.clone()),
                None => debug!("No directive handler registered, directive dropped"),
            }
        }

        Ok(TurnOutcome {
            reply: turn,
            directive: extraction.directive,
            failed: false,
        })
    }
}
