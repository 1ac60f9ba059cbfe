use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::portal_messages::{PortalCommand, PortalSignal};

/// Errors on the chat surface side of the portal link
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("portal did not signal ready within {0:?}")]
    NotReady(Duration),

    #[error("portal endpoint has gone away")]
    Closed,

    #[error("portal inbox is full")]
    Full,

    #[error("malformed portal frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Sending half held by the chat surface
#[derive(Debug, Clone)]
pub struct PortalLink {
    frames: mpsc::Sender<String>,
    signal: watch::Receiver<PortalSignal>,
}

/// Receiving half owned by the portal surface
#[derive(Debug)]
pub struct PortalEndpoint {
    frames: mpsc::Receiver<String>,
    signal: watch::Sender<PortalSignal>,
}

/// Creates a connected link/endpoint pair; the portal starts out `Loading`
pub fn portal_channel(capacity: usize) -> (PortalLink, PortalEndpoint) {
    let (frames_tx, frames_rx) = mpsc::channel(capacity.max(1));
    let (signal_tx, signal_rx) = watch::channel(PortalSignal::Loading);
    (
        PortalLink {
            frames: frames_tx,
            signal: signal_rx,
        },
        PortalEndpoint {
            frames: frames_rx,
            signal: signal_tx,
        },
    )
}

/// Decodes one JSON frame into a typed command
pub fn decode_command(frame: &str) -> Result<PortalCommand, LinkError> {
    Ok(serde_json::from_str(frame)?)
}

impl PortalLink {
    pub fn is_ready(&self) -> bool {
        *self.signal.borrow() == PortalSignal::Ready
    }

    /// Waits until the portal signals ready, giving up after `timeout`
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), LinkError> {
        let mut signal = self.signal.clone();
        let waited =
            tokio::time::timeout(timeout, signal.wait_for(|s| *s == PortalSignal::Ready)).await;
        match waited {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(LinkError::Closed),
            Err(_) => Err(LinkError::NotReady(timeout)),
        }
    }

    /// Fire-and-forget delivery of a command; no acknowledgement is expected
    pub fn post(&self, command: &PortalCommand) -> Result<(), LinkError> {
        let frame = serde_json::to_string(command)?;
        self.post_frame(frame)
    }

    /// Delivers an already encoded frame
    pub fn post_frame(&self, frame: String) -> Result<(), LinkError> {
        self.frames.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => LinkError::Full,
            mpsc::error::TrySendError::Closed(_) => LinkError::Closed,
        })
    }
}

impl PortalEndpoint {
    /// Tells the chat surface the portal is listening
    pub fn signal_ready(&self) {
        self.signal.send_replace(PortalSignal::Ready);
        debug!("Portal signalled ready");
    }

    /// Next well-formed command; malformed frames are logged and skipped.
    /// Returns None once every link has been dropped.
    pub async fn recv(&mut self) -> Option<PortalCommand> {
        loop {
            let frame = self.frames.recv().await?;
            match decode_command(&frame) {
                Ok(command) => return Some(command),
                Err(e) => warn!("Ignoring portal frame: {}", e),
            }
        }
    }
}

impl Drop for PortalEndpoint {
    fn drop(&mut self) {
        self.signal.send_replace(PortalSignal::Loading);
    }
}
