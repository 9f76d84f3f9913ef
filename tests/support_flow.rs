use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::Value;
use tokio::net::TcpListener;
use url::Url;

use contact_support::api::client::HttpContactService;
use contact_support::app::AppConfig;
use contact_support::coordinator::{ContactSupportCoordinator, ContactSupportObserver};
use contact_support::opener::{ExternalAppOpener, OpenError};

#[derive(Clone)]
struct Backend {
    messages: Arc<Mutex<Vec<Value>>>,
    accept_messages: bool,
}

async fn contact() -> Json<Value> {
    Json(serde_json::json!({
        "phone": "+55 11 3333-4444",
        "mail": "support@example.com",
        "whatsapp": "551133334444"
    }))
}

async fn message(State(backend): State<Backend>, Json(body): Json<Value>) -> StatusCode {
    backend.messages.lock().unwrap().push(body);
    if backend.accept_messages {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn start_backend(accept_messages: bool) -> (String, Backend) {
    let backend = Backend { messages: Arc::new(Mutex::new(Vec::new())), accept_messages };
    let router = Router::new()
        .route("/contact-us", get(contact))
        .route("/contact-us/message", post(message))
        .with_state(backend.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), backend)
}

#[derive(Default)]
struct Log(Rc<RefCell<Vec<String>>>);

impl ContactSupportObserver for Log {
    fn loading_started(&self) {
        self.0.borrow_mut().push("loading_started".into());
    }

    fn loading_ended(&self) {
        self.0.borrow_mut().push("loading_ended".into());
    }

    fn error_occurred(&self, dismiss_screen: bool) {
        self.0.borrow_mut().push(format!("error_occurred({dismiss_screen})"));
    }

    fn message_sent(&self) {
        self.0.borrow_mut().push("message_sent".into());
    }
}

#[derive(Default)]
struct RecordingPlatform {
    opened: Mutex<Vec<String>>,
}

#[async_trait]
impl ExternalAppOpener for RecordingPlatform {
    async fn can_open(&self, url: &Url) -> bool {
        url.scheme() != "whatsapp"
    }

    async fn open_url(&self, url: &Url) -> Result<(), OpenError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

fn screen(
    base_url: &str,
    platform: Arc<RecordingPlatform>,
) -> (ContactSupportCoordinator, Rc<RefCell<Vec<String>>>) {
    let service = HttpContactService::new(base_url, Duration::from_secs(5)).unwrap();
    let log = Log::default();
    let events = Rc::clone(&log.0);
    let settings = AppConfig::default().chat_settings().unwrap();
    let coordinator =
        ContactSupportCoordinator::new(Arc::new(service), platform, Box::new(log), settings);
    (coordinator, events)
}

#[tokio::test]
async fn load_then_contact_through_every_channel() {
    let (base, backend) = start_backend(true).await;
    let platform = Arc::new(RecordingPlatform::default());
    let (mut coordinator, events) = screen(&base, platform.clone());

    coordinator.load_contact();
    coordinator.run_until_idle().await;
    assert_eq!(*events.borrow(), vec!["loading_started", "loading_ended"]);

    coordinator.request_phone_call();
    coordinator.request_email();
    coordinator.request_chat();
    coordinator.run_until_idle().await;

    let mut opened = platform.opened.lock().unwrap().clone();
    opened.sort();
    assert_eq!(
        opened,
        vec![
            "https://apps.apple.com/app/whatsapp-messenger/id310633997".to_string(),
            "mailto:support@example.com".to_string(),
            "tel:+551133334444".to_string(),
        ]
    );

    coordinator.send_message("Where is my order?");
    coordinator.run_until_idle().await;

    assert_eq!(
        backend.messages.lock().unwrap().clone(),
        vec![serde_json::json!({
            "email": "support@example.com",
            "mensagem": "Where is my order?"
        })]
    );
    assert_eq!(events.borrow().last().map(String::as_str), Some("message_sent"));
}

#[tokio::test]
async fn rejected_message_keeps_screen_open() {
    let (base, _backend) = start_backend(false).await;
    let (mut coordinator, events) = screen(&base, Arc::new(RecordingPlatform::default()));

    coordinator.load_contact();
    coordinator.run_until_idle().await;
    events.borrow_mut().clear();

    coordinator.send_message("Hello");
    coordinator.run_until_idle().await;

    assert_eq!(
        *events.borrow(),
        vec!["loading_started", "loading_ended", "error_occurred(false)"]
    );
}

#[tokio::test]
async fn unreachable_server_dismisses_screen() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (mut coordinator, events) =
        screen(&format!("http://{addr}"), Arc::new(RecordingPlatform::default()));

    coordinator.load_contact();
    coordinator.run_until_idle().await;

    assert_eq!(
        *events.borrow(),
        vec!["loading_started", "loading_ended", "error_occurred(true)"]
    );
    assert!(coordinator.store().current().is_none());
}
