pub mod client;
pub mod error;
pub mod models;

use async_trait::async_trait;

use crate::api::error::ServiceError;
use crate::api::models::{ContactRecord, OutboundMessage};

/// Remote support backend. Each call is a single attempt.
#[async_trait]
pub trait ContactService: Send + Sync {
    async fn fetch_contact(&self) -> Result<ContactRecord, ServiceError>;
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), ServiceError>;
}
