//! Contact-support screen logic.
//!
//! The coordinator is owned by the UI's main context. Service and opener calls
//! run on a tokio runtime; their results come back through a queue and are
//! applied only when the owner drains it, so store updates and observer
//! callbacks always happen on the owning context, one at a time.

use std::sync::Arc;

use log::{debug, error, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

use crate::api::ContactService;
use crate::api::error::ServiceError;
use crate::api::models::{ContactRecord, OutboundMessage};
use crate::opener::{ExternalAppOpener, ExternalIntent, OpenError, OpenRequest};
use crate::utils;

/// Receives lifecycle notifications. Implementations may touch UI state
/// directly; they are never called from a background task.
pub trait ContactSupportObserver {
    fn loading_started(&self);
    fn loading_ended(&self);
    fn error_occurred(&self, dismiss_screen: bool);
    fn message_sent(&self);
}

#[derive(Debug, Default)]
pub struct ContactInfoStore {
    record: Option<Arc<ContactRecord>>,
}

impl ContactInfoStore {
    pub fn current(&self) -> Option<Arc<ContactRecord>> {
        self.record.clone()
    }

    pub fn phone(&self) -> Option<&str> {
        self.record.as_deref().and_then(ContactRecord::phone)
    }

    pub fn email(&self) -> Option<&str> {
        self.record.as_deref().and_then(ContactRecord::email)
    }

    pub fn chat_handle(&self) -> Option<&str> {
        self.record.as_deref().and_then(ContactRecord::chat_handle)
    }

    fn replace(&mut self, record: ContactRecord) {
        self.record = Some(Arc::new(record));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Default)]
struct OperationTracker {
    in_flight: usize,
    last_outcome: Option<Outcome>,
}

impl OperationTracker {
    fn start(&mut self) {
        self.in_flight += 1;
    }

    fn finish(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.last_outcome = Some(outcome);
    }

    fn phase(&self) -> Phase {
        if self.in_flight > 0 { Phase::Loading } else { Phase::Idle }
    }
}

enum Completion {
    Fetched(Result<ContactRecord, ServiceError>),
    Sent(Result<(), ServiceError>),
    Opened(Result<(), OpenError>),
}

/// Values that differ between deployments of the screen.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub greeting: String,
    /// Opened when no messaging app can take the chat intent.
    pub fallback_url: Url,
}

pub struct ContactSupportCoordinator {
    service: Arc<dyn ContactService>,
    opener: Arc<dyn ExternalAppOpener>,
    observer: Box<dyn ContactSupportObserver>,
    chat: ChatSettings,
    store: ContactInfoStore,
    fetch: OperationTracker,
    send: OperationTracker,
    outstanding: usize,
    runtime: Handle,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
}

impl ContactSupportCoordinator {
    pub fn new(
        service: Arc<dyn ContactService>,
        opener: Arc<dyn ExternalAppOpener>,
        observer: Box<dyn ContactSupportObserver>,
        chat: ChatSettings,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            opener,
            observer,
            chat,
            store: ContactInfoStore::default(),
            fetch: OperationTracker::default(),
            send: OperationTracker::default(),
            outstanding: 0,
            runtime: utils::runtime_handle(),
            tx,
            rx,
        }
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn store(&self) -> &ContactInfoStore {
        &self.store
    }

    pub fn fetch_phase(&self) -> Phase {
        self.fetch.phase()
    }

    pub fn send_phase(&self) -> Phase {
        self.send.phase()
    }

    pub fn last_fetch_outcome(&self) -> Option<Outcome> {
        self.fetch.last_outcome
    }

    pub fn last_send_outcome(&self) -> Option<Outcome> {
        self.send.last_outcome
    }

    /// Background calls whose results have not been applied yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Starts a fetch of the support contact data. A fetch already in flight
    /// is not cancelled; whichever succeeds last decides the stored record.
    pub fn load_contact(&mut self) {
        self.fetch.start();
        self.observer.loading_started();
        let service = Arc::clone(&self.service);
        self.spawn(
            async move { Completion::Fetched(service.fetch_contact().await) },
            |e| Completion::Fetched(Err(ServiceError::Task(e))),
        );
    }

    pub fn request_phone_call(&mut self) {
        let Some(number) = self.store.phone().map(str::to_string) else {
            debug!("no support phone number, ignoring call request");
            return;
        };
        self.open(OpenRequest::direct(ExternalIntent::PhoneCall { number }));
    }

    pub fn request_email(&mut self) {
        let Some(address) = self.store.email().map(str::to_string) else {
            debug!("no support email, ignoring email request");
            return;
        };
        self.open(OpenRequest::direct(ExternalIntent::Email { address }));
    }

    pub fn request_chat(&mut self) {
        let Some(handle) = self.store.chat_handle().map(str::to_string) else {
            debug!("no support chat handle, ignoring chat request");
            return;
        };
        let app = ExternalIntent::Chat { handle, greeting: self.chat.greeting.clone() };
        let web = ExternalIntent::Web { url: self.chat.fallback_url.clone() };
        self.open(OpenRequest::with_fallback(app, web));
    }

    /// Sends `body` to support from the stored email address. A blank body or
    /// a missing address does nothing.
    pub fn send_message(&mut self, body: &str) {
        if body.trim().is_empty() {
            debug!("empty support message, ignoring send request");
            return;
        }
        let Some(sender_email) = self.store.email().map(str::to_string) else {
            debug!("no support email loaded, ignoring send request");
            return;
        };
        self.send.start();
        self.observer.loading_started();
        let message = OutboundMessage::new(sender_email, body);
        let service = Arc::clone(&self.service);
        self.spawn(
            async move { Completion::Sent(service.send_message(&message).await) },
            |e| Completion::Sent(Err(ServiceError::Task(e))),
        );
    }

    /// Waits for the next background result and applies it. Returns `false`
    /// when nothing is outstanding.
    pub async fn process_next(&mut self) -> bool {
        if self.outstanding == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Applies every result that has already arrived, without waiting.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    pub async fn run_until_idle(&mut self) {
        while self.process_next().await {}
    }

    fn open(&mut self, request: OpenRequest) {
        let opener = Arc::clone(&self.opener);
        self.spawn(
            async move { Completion::Opened(opener.open(&request).await) },
            |e| Completion::Opened(Err(OpenError::Task(e))),
        );
    }

    /// `on_panic` turns a panicked task into a failed completion, so every
    /// spawned call is applied exactly once.
    fn spawn<Fut, P>(&mut self, fut: Fut, on_panic: P)
    where
        Fut: std::future::Future<Output = Completion> + Send + 'static,
        P: FnOnce(String) -> Completion + Send + 'static,
    {
        self.outstanding += 1;
        utils::run_async_to_main(&self.runtime, self.tx.clone(), fut, on_panic);
    }

    fn apply(&mut self, completion: Completion) {
        self.outstanding = self.outstanding.saturating_sub(1);
        match completion {
            Completion::Fetched(Ok(record)) => {
                self.fetch.finish(Outcome::Succeeded);
                self.store.replace(record);
                self.observer.loading_ended();
            }
            Completion::Fetched(Err(e)) => {
                error!("failed to fetch contact data: {}", e.log_message());
                self.fetch.finish(Outcome::Failed);
                self.observer.loading_ended();
                self.observer.error_occurred(true);
            }
            Completion::Sent(Ok(())) => {
                self.send.finish(Outcome::Succeeded);
                self.observer.loading_ended();
                self.observer.message_sent();
            }
            Completion::Sent(Err(e)) => {
                error!("failed to send support message: {}", e.log_message());
                self.send.finish(Outcome::Failed);
                self.observer.loading_ended();
                self.observer.error_occurred(false);
            }
            Completion::Opened(Ok(())) => {}
            Completion::Opened(Err(e)) => warn!("could not open external app: {e}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
