//! Messages between the background question service and UI sessions.
//!
//! A session asks for the question list once; the service answers every
//! request exactly once, with either the questions or an error string. The
//! service also relays the global toggle command to the active page.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::QuestionRecord;
use crate::config::AssetSource;
use crate::controller::{Controller, Effect, UiEvent};
use crate::loader::load_questions_async;

/// Reply text when the asset cannot be loaded.
pub const LOAD_FAILURE_REPLY: &str = "Failed to load questions";
/// Name of the global toggle command.
pub const TOGGLE_COMMAND: &str = "toggle-overlay";

const REQUEST_QUEUE: usize = 16;

/// An inbound message, `{"action": "get-questions"}` or
/// `{"action": "toggle-overlay"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Request {
    GetQuestions,
    ToggleOverlay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionsReply {
    Questions { questions: Arc<[QuestionRecord]> },
    Error { error: String },
}

impl QuestionsReply {
    pub fn error(message: impl Into<String>) -> Self {
        QuestionsReply::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QuestionsReply::Error { .. })
    }

    /// The reply as the `Loaded` event a controller consumes.
    pub fn into_event(self) -> UiEvent {
        match self {
            QuestionsReply::Questions { questions } => UiEvent::Loaded(Ok(questions)),
            QuestionsReply::Error { error } => UiEvent::Loaded(Err(error)),
        }
    }
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageReply {
    Questions(QuestionsReply),
    /// Whether the toggle reached an active page.
    Relayed { delivered: bool },
}

impl MessageReply {
    pub fn is_error(&self) -> bool {
        matches!(self, MessageReply::Questions(reply) if reply.is_error())
    }
}

/// Loads questions on request.
#[derive(Debug, Clone, Default)]
pub struct QuestionService {
    source: AssetSource,
}

impl QuestionService {
    pub fn new(source: AssetSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    /// Loads the asset afresh and builds the reply.
    pub async fn get_questions(&self) -> QuestionsReply {
        match load_questions_async(self.source.clone()).await {
            Ok(questions) => {
                debug!(count = questions.len(), source = %self.source, "answering get-questions");
                QuestionsReply::Questions { questions }
            }
            Err(err) => {
                error!(%err, source = %self.source, "error loading questions");
                QuestionsReply::error(LOAD_FAILURE_REPLY)
            }
        }
    }

    /// Runs the service on its own task. It stops once every handle is dropped.
    pub fn spawn(self) -> ServiceHandle {
        let (tx, mut rx) = mpsc::channel::<Envelope>(REQUEST_QUEUE);
        tokio::spawn(async move {
            info!(source = %self.source, "question service started");
            while let Some(envelope) = rx.recv().await {
                let reply = self.get_questions().await;
                if envelope.reply.send(reply).is_err() {
                    debug!("requester went away before the reply");
                }
            }
            info!("question service stopped");
        });
        ServiceHandle { tx }
    }
}

struct Envelope {
    reply: oneshot::Sender<QuestionsReply>,
}

/// Cheap, cloneable connection to a running [`QuestionService`].
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Envelope>,
}

impl ServiceHandle {
    /// Sends a `get-questions` request and waits for its single reply.
    pub async fn request_questions(&self) -> QuestionsReply {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Envelope { reply }).await.is_err() {
            return QuestionsReply::error(LOAD_FAILURE_REPLY);
        }
        rx.await
            .unwrap_or_else(|_| QuestionsReply::error(LOAD_FAILURE_REPLY))
    }

    /// Answers one inbound message; toggles go to the page active in `commands`.
    pub async fn dispatch(&self, request: Request, commands: &Mutex<CommandRouter>) -> MessageReply {
        match request {
            Request::GetQuestions => MessageReply::Questions(self.request_questions().await),
            Request::ToggleOverlay => {
                let delivered = commands.lock().on_command(TOGGLE_COMMAND);
                MessageReply::Relayed { delivered }
            }
        }
    }
}

/// Forwards global commands to the page that currently has focus.
#[derive(Debug, Default)]
pub struct CommandRouter {
    active: Option<mpsc::UnboundedSender<UiEvent>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&mut self, page: mpsc::UnboundedSender<UiEvent>) {
        self.active = Some(page);
    }

    /// Delivers `command` to the active page. Returns whether it was delivered.
    pub fn on_command(&mut self, command: &str) -> bool {
        if command != TOGGLE_COMMAND {
            debug!(command, "ignoring unknown command");
            return false;
        }
        let Some(page) = &self.active else {
            return false;
        };
        if page.send(UiEvent::Toggle).is_err() {
            self.active = None;
            return false;
        }
        true
    }
}

/// Runs one UI session: requests the question list, then feeds page events to
/// `controller` until the page closes its event channel.
///
/// Events are handled while the load is still in flight. `sink` sees the
/// controller after every event together with the effects it produced.
pub async fn run_session<C, F>(
    controller: &mut C,
    service: &ServiceHandle,
    mut events: mpsc::UnboundedReceiver<UiEvent>,
    mut sink: F,
) where
    C: Controller,
    F: FnMut(&C, Vec<Effect>),
{
    let load = service.request_questions();
    tokio::pin!(load);
    let mut loaded = false;
    loop {
        tokio::select! {
            reply = &mut load, if !loaded => {
                loaded = true;
                if reply.is_error() {
                    error!("question list request failed");
                }
                let effects = controller.handle(reply.into_event());
                sink(controller, effects);
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let effects = controller.handle(event);
                sink(controller, effects);
            }
        }
    }
    debug!("ui session detached");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::controller::{OverlayController, PopupController, Visibility};
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn request_wire_format() {
        let request: Request = serde_json::from_value(json!({"action": "get-questions"})).unwrap();
        assert_eq!(request, Request::GetQuestions);
        assert_eq!(
            serde_json::to_value(Request::ToggleOverlay).unwrap(),
            json!({"action": "toggle-overlay"})
        );
    }

    #[test]
    fn reply_wire_format() {
        let reply = QuestionsReply::Questions {
            questions: vec![QuestionRecord::new("1", "What is OSPF?")].into(),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["questions"][0]["question_text"], "What is OSPF?");

        let value = serde_json::to_value(QuestionsReply::error(LOAD_FAILURE_REPLY)).unwrap();
        assert_eq!(value, json!({"error": "Failed to load questions"}));
    }

    #[tokio::test]
    async fn service_answers_each_request_once() {
        let handle = QuestionService::new(AssetSource::Bundled).spawn();
        let (first, second) = tokio::join!(handle.request_questions(), handle.request_questions());
        for reply in [first, second] {
            match reply {
                QuestionsReply::Questions { questions } => assert!(!questions.is_empty()),
                QuestionsReply::Error { error } => panic!("unexpected error {error}"),
            }
        }
    }

    #[tokio::test]
    async fn service_reports_failed_load() {
        let service = QuestionService::new(AssetSource::File(PathBuf::from("/no/such/asset.json")));
        let reply = service.spawn().request_questions().await;
        match reply {
            QuestionsReply::Error { error } => assert_eq!(error, LOAD_FAILURE_REPLY),
            QuestionsReply::Questions { .. } => panic!("expected an error reply"),
        }
    }

    #[tokio::test]
    async fn failed_load_surfaces_error_indicator() {
        let service = QuestionService::new(AssetSource::File(PathBuf::from("/no/such/asset.json")));
        let handle = service.spawn();
        let mut popup = PopupController::new(SearchConfig::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let mut page = Some(tx);
        run_session(&mut popup, &handle, rx, |popup, _| {
            if !popup.view().loading {
                page.take();
            }
        })
        .await;
        let view = popup.view();
        assert!(view.error.is_some());
        assert!(!view.no_results);
        assert!(view.list.is_empty());
    }

    #[tokio::test]
    async fn session_routes_toggle_command_to_overlay() {
        let handle = QuestionService::new(AssetSource::Bundled).spawn();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut router = CommandRouter::new();
        router.set_active(tx.clone());

        let session = tokio::spawn(async move {
            let mut overlay = OverlayController::new(SearchConfig::default());
            let mut visibility_changes = Vec::new();
            run_session(&mut overlay, &handle, rx, |_, effects| {
                for effect in effects {
                    if let Effect::VisibilityChanged(v) = effect {
                        visibility_changes.push(v);
                    }
                }
            })
            .await;
            (overlay, visibility_changes)
        });

        assert!(router.on_command(TOGGLE_COMMAND));
        assert!(!router.on_command("reload"));
        tx.send(UiEvent::Input("ospf".into())).unwrap();
        drop(tx);
        drop(router);

        let (overlay, changes) = session.await.unwrap();
        assert_eq!(changes, vec![Visibility::Visible]);
        assert!(overlay.is_visible());
        assert_eq!(overlay.session().input(), "ospf");
    }

    #[tokio::test]
    async fn dispatch_answers_each_action() {
        let handle = QuestionService::new(AssetSource::Bundled).spawn();
        let commands = Mutex::new(CommandRouter::new());

        let request: Request = serde_json::from_str(r#"{"action":"get-questions"}"#).unwrap();
        match handle.dispatch(request, &commands).await {
            MessageReply::Questions(QuestionsReply::Questions { questions }) => {
                assert!(!questions.is_empty())
            }
            other => panic!("unexpected reply {other:?}"),
        }

        let toggle: Request = serde_json::from_str(r#"{"action":"toggle-overlay"}"#).unwrap();
        let reply = handle.dispatch(toggle, &commands).await;
        assert_eq!(serde_json::to_value(&reply).unwrap(), json!({"delivered": false}));

        let (tx, mut rx) = mpsc::unbounded_channel();
        commands.lock().set_active(tx);
        let reply = handle.dispatch(toggle, &commands).await;
        assert_eq!(serde_json::to_value(&reply).unwrap(), json!({"delivered": true}));
        assert!(matches!(rx.try_recv(), Ok(UiEvent::Toggle)));
    }

    #[tokio::test]
    async fn dispatch_reports_failed_load() {
        let service = QuestionService::new(AssetSource::File(PathBuf::from("/no/such/asset.json")));
        let commands = Mutex::new(CommandRouter::new());
        let reply = service.spawn().dispatch(Request::GetQuestions, &commands).await;
        assert!(reply.is_error());
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"error": LOAD_FAILURE_REPLY})
        );
    }

    #[test]
    fn router_without_page_drops_command() {
        let mut router = CommandRouter::new();
        assert!(!router.on_command(TOGGLE_COMMAND));
        let (tx, rx) = mpsc::unbounded_channel();
        router.set_active(tx);
        drop(rx);
        assert!(!router.on_command(TOGGLE_COMMAND));
    }
}
