use std::fmt;
use std::sync::Arc;

use chrono::Local;
use setu_core::history::{serialize_history, HistoryFormat};
use setu_core::{Backend, ChannelConfig, ChatRequest, ConversationTurn};
use tracing::{debug, error};
use uuid::Uuid;

pub const GREETING: &str =
    "Namaste! I am Yojana-Setu, your AI assistant for government schemes. How can I help you today?";
pub const BACKEND_DOWN: &str =
    "Maaf kijiye, backend se connect nahi ho pa raha. Check if server is running.";
pub const VOICE_PLACEHOLDER: &str = "🎤 Voice message sent";
pub const VOICE_ACK: &str =
    "Samjha! Aapka awaz record ho gaya hai. Main use transcribe kar raha hoon...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSender {
    User,
    Ai,
}

impl fmt::Display for MessageSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSender::User => write!(f, "user"),
            MessageSender::Ai => write!(f, "ai"),
        }
    }
}

/// One bubble in the thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppMessage {
    pub id: String,
    pub text: String,
    pub sender: MessageSender,
    /// `HH:MM`, local time
    pub timestamp: String,
    pub is_audio: bool,
}

impl WhatsAppMessage {
    fn new(text: impl Into<String>, sender: MessageSender) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Local::now().format("%H:%M").to_string(),
            is_audio: false,
        }
    }

    fn audio(text: impl Into<String>, sender: MessageSender) -> Self {
        Self {
            is_audio: true,
            ..Self::new(text, sender)
        }
    }

    fn as_turn(&self) -> ConversationTurn {
        match self.sender {
            MessageSender::User => ConversationTurn::user(self.text.clone()),
            MessageSender::Ai => ConversationTurn::assistant(self.text.clone()),
        }
    }
}

/// WhatsApp-style thread against the `/chat` endpoint
pub struct WhatsAppChat {
    backend: Arc<dyn Backend>,
    phone: String,
    history_window: usize,
    messages: Vec<WhatsAppMessage>,
    recording: bool,
}

impl WhatsAppChat {
    pub fn new(backend: Arc<dyn Backend>, config: &ChannelConfig) -> Self {
        Self {
            backend,
            phone: config.demo_phone.clone(),
            history_window: config.history_window,
            messages: vec![WhatsAppMessage::new(GREETING, MessageSender::Ai)],
            recording: false,
        }
    }

    pub fn messages(&self) -> &[WhatsAppMessage] {
        &self.messages
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn recent_history(&self) -> String {
        let turns: Vec<ConversationTurn> = self.messages.iter().map(|m| m.as_turn()).collect();
        match serialize_history(&turns, HistoryFormat::Parts, Some(self.history_window)) {
            Ok(history) => history,
            Err(e) => {
                error!("Failed to serialize WhatsApp history: {}", e);
                "[]".to_string()
            }
        }
    }

    /// Sends one message and appends the reply (or the connection error).
    ///
    /// Blank input is ignored and returns None. Replies are shown verbatim.
    pub async fn send(&mut self, input: &str) -> Option<&WhatsAppMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        // History is the thread as it was before this message
        let history = self.recent_history();
        self.messages
            .push(WhatsAppMessage::new(text, MessageSender::User));

        let request = ChatRequest {
            message: text.to_string(),
            phone: self.phone.clone(),
            history,
        };
        debug!("WhatsApp message from {}", request.phone);

        let reply = match self.backend.chat(&request).await {
            Ok(reply) => WhatsAppMessage::new(reply.reply, MessageSender::Ai),
            Err(e) => {
                error!("Error sending message: {}", e);
                WhatsAppMessage::new(BACKEND_DOWN, MessageSender::Ai)
            }
        };
        self.messages.push(reply);
        self.messages.last()
    }

    /// Flips the microphone. Stopping a recording appends the canned voice
    /// pair; nothing is captured or sent. Returns whether it is now recording.
    pub fn toggle_recording(&mut self) -> bool {
        if self.recording {
            self.recording = false;
            self.messages
                .push(WhatsAppMessage::audio(VOICE_PLACEHOLDER, MessageSender::User));
            self.messages
                .push(WhatsAppMessage::new(VOICE_ACK, MessageSender::Ai));
            debug!("Voice message simulated");
        } else {
            self.recording = true;
        }
        self.recording
    }
}
