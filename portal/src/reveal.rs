use std::sync::Mutex;
use std::time::Duration;

use setu_core::{ActionDirective, DirectiveHandler};
use setu_ipc::{AutoFillPayload, LinkError, PortalCommand, PortalLink};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Chat-side half of the reveal sequence: shows the portal and forwards a
/// directive's payload once the portal reports ready
pub struct PortalRevealer {
    link: PortalLink,
    visible: watch::Sender<bool>,
    ready_timeout: Duration,
    pending: Mutex<Option<JoinHandle<Result<(), LinkError>>>>,
}

impl PortalRevealer {
    pub fn new(link: PortalLink, ready_timeout: Duration) -> Self {
        let (visible, _) = watch::channel(false);
        Self {
            link,
            visible,
            ready_timeout,
            pending: Mutex::new(None),
        }
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Receiver that observes every visibility change
    pub fn subscribe_visibility(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }

    /// Flips visibility by hand, returning the new value
    pub fn toggle_visibility(&self) -> bool {
        let shown = !self.is_visible();
        self.visible.send_replace(shown);
        shown
    }

    /// Shows the portal and starts forwarding `payload`.
    ///
    /// A reveal still waiting for the portal is cancelled in favour of this one.
    pub fn reveal(&self, payload: AutoFillPayload) {
        self.visible.send_replace(true);

        let link = self.link.clone();
        let timeout = self.ready_timeout;
        let task = tokio::spawn(async move {
            if let Err(e) = link.wait_ready(timeout).await {
                warn!("Portal not ready, dropping AUTO_FILL for {}: {}", payload.scheme, e);
                return Err(e);
            }
            let scheme = payload.scheme.clone();
            link.post(&PortalCommand::AutoFill(payload))?;
            info!("AUTO_FILL sent to portal for {}", scheme);
            Ok(())
        });

        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Waits for the latest reveal to deliver or give up.
    /// Returns None when there was nothing pending or it was cancelled.
    pub async fn settle(&self) -> Option<Result<(), LinkError>> {
        let task = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()?;
        match task.await {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("Reveal task did not complete: {}", e);
                None
            }
        }
    }
}

impl DirectiveHandler for PortalRevealer {
    fn on_directive(&self, directive: ActionDirective) {
        self.reveal(directive.into());
    }
}

impl Drop for PortalRevealer {
    fn drop(&mut self) {
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setu_core::FieldValues;
    use setu_ipc::portal_channel;

    fn payload(scheme: &str) -> AutoFillPayload {
        let mut details = FieldValues::new();
        details.insert("aadhar".to_string(), "1234".to_string());
        AutoFillPayload {
            scheme: scheme.to_string(),
            details,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_waits_for_ready_then_posts() {
        let (link, mut endpoint) = portal_channel(4);
        let revealer = PortalRevealer::new(link, Duration::from_millis(1500));
        assert!(!revealer.is_visible());

        revealer.reveal(payload("PM Kisan"));
        assert!(revealer.is_visible());

        tokio::time::sleep(Duration::from_millis(300)).await;
        endpoint.signal_ready();

        assert!(matches!(revealer.settle().await, Some(Ok(()))));
        assert_eq!(
            endpoint.recv().await,
            Some(PortalCommand::AutoFill(payload("PM Kisan")))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_gives_up_after_timeout() {
        let (link, mut endpoint) = portal_channel(4);
        let revealer = PortalRevealer::new(link, Duration::from_millis(1500));

        revealer.reveal(payload("PM Kisan"));
        assert!(matches!(
            revealer.settle().await,
            Some(Err(LinkError::NotReady(_)))
        ));

        // Nothing was delivered even once the portal comes up
        endpoint.signal_ready();
        drop(revealer);
        assert_eq!(endpoint.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_reveal_cancels_pending_one() {
        let (link, mut endpoint) = portal_channel(4);
        let revealer = PortalRevealer::new(link, Duration::from_secs(5));

        revealer.reveal(payload("PM Kisan"));
        revealer.reveal(payload("Ladli Behna"));
        endpoint.signal_ready();

        assert!(matches!(revealer.settle().await, Some(Ok(()))));
        assert_eq!(
            endpoint.recv().await,
            Some(PortalCommand::AutoFill(payload("Ladli Behna")))
        );
        drop(revealer);
        assert_eq!(endpoint.recv().await, None);
    }

    #[tokio::test]
    async fn test_toggle_visibility() {
        let (link, _endpoint) = portal_channel(1);
        let revealer = PortalRevealer::new(link, Duration::from_millis(10));
        let mut watcher = revealer.subscribe_visibility();

        assert!(revealer.toggle_visibility());
        assert!(watcher.has_changed().unwrap());
        assert!(*watcher.borrow_and_update());
        assert!(!revealer.toggle_visibility());
        assert!(!revealer.is_visible());
    }

    #[tokio::test]
    async fn test_settle_without_reveal() {
        let (link, _endpoint) = portal_channel(1);
        let revealer = PortalRevealer::new(link, Duration::from_millis(10));
        assert!(revealer.settle().await.is_none());
    }
}
