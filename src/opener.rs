use std::io;

use async_trait::async_trait;
use log::{debug, info};
use thiserror::Error;
use tokio::process::Command;
use url::Url;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("no handler installed for {0}:")]
    Unavailable(String),
    #[error("failed to launch handler: {0}")]
    Launch(#[from] io::Error),
    #[error("handler exited with status {0}")]
    HandlerFailed(i32),
    #[error("cannot build intent: {0}")]
    InvalidIntent(String),
    #[error("background task failed: {0}")]
    Task(String),
}

/// Platform actions the support screen can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalIntent {
    PhoneCall { number: String },
    Email { address: String },
    Chat { handle: String, greeting: String },
    Web { url: Url },
}

impl ExternalIntent {
    pub fn to_url(&self) -> Result<Url, OpenError> {
        let parsed = match self {
            ExternalIntent::PhoneCall { number } => {
                let digits: String = number
                    .chars()
                    .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
                    .collect();
                if digits.is_empty() {
                    return Err(OpenError::InvalidIntent("empty phone number".into()));
                }
                Url::parse(&format!("tel:{digits}"))
            }
            ExternalIntent::Email { address } => Url::parse(&format!("mailto:{}", address.trim())),
            ExternalIntent::Chat { handle, greeting } => {
                Url::parse("whatsapp://send").map(|mut url| {
                    url.query_pairs_mut()
                        .append_pair("phone", handle.trim())
                        .append_pair("text", greeting);
                    url
                })
            }
            ExternalIntent::Web { url } => return Ok(url.clone()),
        };
        parsed.map_err(|e| OpenError::InvalidIntent(e.to_string()))
    }
}

/// What to open, plus what to open instead when the platform has no handler
/// for the primary intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub primary: ExternalIntent,
    pub fallback: Option<ExternalIntent>,
}

impl OpenRequest {
    pub fn direct(intent: ExternalIntent) -> Self {
        Self { primary: intent, fallback: None }
    }

    pub fn with_fallback(intent: ExternalIntent, fallback: ExternalIntent) -> Self {
        Self { primary: intent, fallback: Some(fallback) }
    }
}

#[async_trait]
pub trait ExternalAppOpener: Send + Sync {
    async fn can_open(&self, url: &Url) -> bool;

    async fn open_url(&self, url: &Url) -> Result<(), OpenError>;

    /// Opens the primary intent, or the fallback when the primary one has no
    /// handler.
    async fn open(&self, request: &OpenRequest) -> Result<(), OpenError> {
        let primary = request.primary.to_url()?;
        let Some(fallback) = &request.fallback else {
            return self.open_url(&primary).await;
        };
        if self.can_open(&primary).await {
            self.open_url(&primary).await
        } else {
            let fallback = fallback.to_url()?;
            info!("no handler for {}:, opening {fallback} instead", primary.scheme());
            self.open_url(&fallback).await
        }
    }
}

/// Hands URLs to the desktop's registered handler.
#[derive(Debug, Default, Clone)]
pub struct SystemOpener;

impl SystemOpener {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "macos")]
    fn launcher() -> Command {
        Command::new("open")
    }

    #[cfg(not(target_os = "macos"))]
    fn launcher() -> Command {
        Command::new("xdg-open")
    }
}

#[async_trait]
impl ExternalAppOpener for SystemOpener {
    async fn can_open(&self, url: &Url) -> bool {
        if matches!(url.scheme(), "http" | "https") {
            return true;
        }
        if cfg!(target_os = "macos") {
            return true;
        }
        let output = Command::new("xdg-mime")
            .args(["query", "default"])
            .arg(format!("x-scheme-handler/{}", url.scheme()))
            .output()
            .await;
        match output {
            Ok(out) => out.status.success() && !out.stdout.trim_ascii().is_empty(),
            Err(e) => {
                debug!("xdg-mime unavailable: {e}");
                false
            }
        }
    }

    async fn open_url(&self, url: &Url) -> Result<(), OpenError> {
        debug!("opening {url}");
        let status = Self::launcher().arg(url.as_str()).status().await?;
        if status.success() {
            Ok(())
        } else {
            Err(OpenError::HandlerFailed(status.code().unwrap_or(-1)))
        }
    }
}
