use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use setu_core::directive::FALLBACK_ACKNOWLEDGEMENT;
use setu_core::session::AppSession;
use setu_core::{
    Backend, ChatDispatcher, ChatReply, ChatRequest, RegistrationRequest, Role, SchemeCatalog,
    SetuError, SetuResult,
};
use setu_ipc::portal_channel;
use setu_portal::{FillTimings, FormPhase, PortalEvent, PortalRevealer, PortalSurface};
use tokio::sync::mpsc;

const KISAN_TAG: &str = r#"[ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {"aadhar":"1234-5678-9012","bank_account":"30991234"}]"#;

struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn register(&self, _request: &RegistrationRequest) -> SetuResult<()> {
        Ok(())
    }

    async fn chat(&self, _request: &ChatRequest) -> SetuResult<ChatReply> {
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => Ok(ChatReply { reply }),
            None => Err(SetuError::RequestError("no scripted reply".into())),
        }
    }
}

async fn wait_for_submitted(rx: &mut mpsc::UnboundedReceiver<PortalEvent>) -> Vec<PortalEvent> {
    let mut seen = Vec::new();
    while let Some(event) = rx.recv().await {
        let done = matches!(
            event,
            PortalEvent::PhaseChanged {
                phase: FormPhase::Submitted,
                ..
            }
        );
        seen.push(event);
        if done {
            break;
        }
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_apply_for_pm_kisan_fills_portal() {
    let (link, endpoint) = portal_channel(8);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let portal = PortalSurface::new(Arc::new(SchemeCatalog::builtin()), FillTimings::default())
        .with_events(events_tx)
        .spawn(endpoint);

    let revealer = Arc::new(PortalRevealer::new(link, Duration::from_millis(1500)));
    let dispatcher = ChatDispatcher::new(ScriptedBackend::new(&[KISAN_TAG]), AppSession::guest())
        .with_directive_handler(revealer.clone());

    let outcome = dispatcher.send("Apply for PM Kisan").await.unwrap();
    assert!(!outcome.failed);
    assert_eq!(outcome.reply.role, Role::Assistant);
    assert_eq!(outcome.reply.content, FALLBACK_ACKNOWLEDGEMENT);
    assert_eq!(
        dispatcher.transcript().last().map(|t| t.content.as_str()),
        Some(FALLBACK_ACKNOWLEDGEMENT)
    );
    assert!(revealer.is_visible());

    assert!(matches!(revealer.settle().await, Some(Ok(()))));
    let events = wait_for_submitted(&mut events_rx).await;

    let phases: Vec<FormPhase> = events
        .iter()
        .filter_map(|e| match e {
            PortalEvent::PhaseChanged { scheme, phase } => {
                assert_eq!(scheme, "PM Kisan");
                Some(*phase)
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            FormPhase::AgentAccessing,
            FormPhase::FormFilling,
            FormPhase::Submitted
        ]
    );

    let form = portal.snapshot();
    assert_eq!(form.active_scheme, "PM Kisan");
    assert_eq!(form.phase, FormPhase::Submitted);
    assert_eq!(form.values["aadhar"], "1234-5678-9012");
    assert_eq!(form.values["bank_account"], "30991234");
    assert!(!form.is_filled("farmer_id"));
}

#[tokio::test(start_paused = true)]
async fn test_leading_text_is_kept_and_portal_still_fills() {
    let (link, endpoint) = portal_channel(8);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let portal = PortalSurface::new(Arc::new(SchemeCatalog::builtin()), FillTimings::default())
        .with_events(events_tx)
        .spawn(endpoint);

    let revealer = Arc::new(PortalRevealer::new(link, Duration::from_millis(1500)));
    let reply = format!("Theek hai! {}", KISAN_TAG);
    let dispatcher = ChatDispatcher::new(ScriptedBackend::new(&[&reply]), AppSession::guest())
        .with_directive_handler(revealer.clone());

    let outcome = dispatcher.send("Apply for PM Kisan").await.unwrap();
    assert_eq!(outcome.reply.content, "Theek hai!");

    assert!(matches!(revealer.settle().await, Some(Ok(()))));
    wait_for_submitted(&mut events_rx).await;
    assert_eq!(portal.snapshot().values.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_directive_leaves_portal_hidden() {
    let (link, endpoint) = portal_channel(8);
    let portal = PortalSurface::new(Arc::new(SchemeCatalog::builtin()), FillTimings::default())
        .spawn(endpoint);

    let revealer = Arc::new(PortalRevealer::new(link, Duration::from_millis(1500)));
    let dispatcher = ChatDispatcher::new(
        ScriptedBackend::new(&[
            "Ek minute. [ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {aadhar: 1234}]",
        ]),
        AppSession::guest(),
    )
    .with_directive_handler(revealer.clone());

    let outcome = dispatcher.send("Apply for PM Kisan").await.unwrap();
    assert!(outcome.directive.is_none());
    assert_eq!(outcome.reply.content, "Ek minute.");
    assert!(!revealer.is_visible());
    assert!(revealer.settle().await.is_none());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(portal.snapshot().phase, FormPhase::Draft);
}
