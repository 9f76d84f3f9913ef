use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;

use crate::app::Variant;
use crate::coordinator::{ContactSupportCoordinator, ContactSupportObserver};

/// Wording for one support screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenProfile {
    pub title: &'static str,
    pub error_title: &'static str,
    pub error_message: &'static str,
    pub success_title: &'static str,
    pub success_message: &'static str,
}

impl Variant {
    pub fn profile(self) -> ScreenProfile {
        match self {
            Variant::Mel => ScreenProfile {
                title: "Contact us",
                error_title: "Oops",
                error_message: "Something went wrong",
                success_title: "Done",
                success_message: "Your message was sent",
            },
            Variant::Rum => ScreenProfile {
                title: "Fale conosco",
                error_title: "Ops..",
                error_message: "Ocorreu algum erro",
                success_title: "Sucesso..",
                success_message: "Sua mensagem foi enviada",
            },
        }
    }
}

/// Whether an alert has closed the screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenHandle {
    dismissed: Rc<Cell<bool>>,
}

impl ScreenHandle {
    pub fn is_dismissed(&self) -> bool {
        self.dismissed.get()
    }

    pub fn dismiss(&self) {
        self.dismissed.set(true);
    }
}

/// Renders loading state and alerts as text lines.
pub struct ConsoleObserver<W: Write> {
    profile: ScreenProfile,
    out: RefCell<W>,
    loading: Cell<usize>,
    screen: ScreenHandle,
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(profile: ScreenProfile, out: W) -> (Self, ScreenHandle) {
        let screen = ScreenHandle::default();
        let observer = Self {
            profile,
            out: RefCell::new(out),
            loading: Cell::new(0),
            screen: screen.clone(),
        };
        (observer, screen)
    }

    fn line(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            log::warn!("failed to write to console: {e}");
        }
    }
}

impl<W: Write> ContactSupportObserver for ConsoleObserver<W> {
    fn loading_started(&self) {
        self.loading.set(self.loading.get() + 1);
        if self.loading.get() == 1 {
            self.line("Loading...");
        }
    }

    fn loading_ended(&self) {
        self.loading.set(self.loading.get().saturating_sub(1));
    }

    fn error_occurred(&self, dismiss_screen: bool) {
        self.line(&format!("[{}] {}", self.profile.error_title, self.profile.error_message));
        if dismiss_screen {
            self.screen.dismiss();
        }
    }

    fn message_sent(&self) {
        self.line(&format!("[{}] {}", self.profile.success_title, self.profile.success_message));
        self.screen.dismiss();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Phone,
    Email,
    Chat,
    Send(String),
    Reload,
    Close,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match word.to_ascii_lowercase().as_str() {
            "phone" | "call" => Some(Command::Phone),
            "email" | "mail" => Some(Command::Email),
            "chat" | "whatsapp" => Some(Command::Chat),
            "send" => Some(Command::Send(rest.trim().to_string())),
            "reload" => Some(Command::Reload),
            "close" | "quit" | "exit" => Some(Command::Close),
            "help" | "?" => Some(Command::Help),
            _ => None,
        }
    }

    /// Forwards the command to the coordinator. Returns `false` when the user
    /// closed the screen.
    pub fn dispatch(self, coordinator: &mut ContactSupportCoordinator) -> bool {
        match self {
            Command::Phone => coordinator.request_phone_call(),
            Command::Email => coordinator.request_email(),
            Command::Chat => coordinator.request_chat(),
            Command::Send(body) => coordinator.send_message(&body),
            Command::Reload => coordinator.load_contact(),
            Command::Close => return false,
            Command::Help => {}
        }
        true
    }
}

pub const HELP: &str = "commands: phone | email | chat | send <message> | reload | close";

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  phone "), Some(Command::Phone));
        assert_eq!(Command::parse("MAIL"), Some(Command::Email));
        assert_eq!(Command::parse("send  Hello there "), Some(Command::Send("Hello there".into())));
        assert_eq!(Command::parse("send"), Some(Command::Send(String::new())));
        assert_eq!(Command::parse("exit"), Some(Command::Close));
        assert_eq!(Command::parse("dance"), None);
    }

    #[test]
    fn fatal_error_dismisses_screen() {
        let buf = SharedBuf::default();
        let (observer, screen) = ConsoleObserver::new(Variant::Rum.profile(), buf.clone());

        observer.loading_started();
        observer.loading_ended();
        observer.error_occurred(true);

        assert!(screen.is_dismissed());
        assert_eq!(buf.text(), "Loading...\n[Ops..] Ocorreu algum erro\n");
    }

    #[test]
    fn recoverable_error_keeps_screen_open() {
        let buf = SharedBuf::default();
        let (observer, screen) = ConsoleObserver::new(Variant::Mel.profile(), buf.clone());

        observer.error_occurred(false);

        assert!(!screen.is_dismissed());
        assert!(buf.text().contains("Something went wrong"));
    }

    #[test]
    fn sent_message_dismisses_screen() {
        let buf = SharedBuf::default();
        let (observer, screen) = ConsoleObserver::new(Variant::Mel.profile(), buf.clone());

        observer.message_sent();

        assert!(screen.is_dismissed());
        assert_eq!(buf.text(), "[Done] Your message was sent\n");
    }

    #[test]
    fn nested_loading_prints_once() {
        let buf = SharedBuf::default();
        let (observer, _screen) = ConsoleObserver::new(Variant::Mel.profile(), buf.clone());

        observer.loading_started();
        observer.loading_started();
        observer.loading_ended();
        observer.loading_ended();
        observer.loading_started();

        assert_eq!(buf.text(), "Loading...\nLoading...\n");
    }
}
