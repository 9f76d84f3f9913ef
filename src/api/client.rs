use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

use crate::api::ContactService;
use crate::api::error::ServiceError;
use crate::api::models::{ContactRecord, OutboundMessage};

const CONTACT_PATH: &str = "contact-us";
const MESSAGE_PATH: &str = "contact-us/message";

pub struct HttpContactService {
    pub http: HttpClient,
    base: Url,
}

impl HttpContactService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: HttpClient, base_url: &str) -> Result<Self, ServiceError> {
        let base = Url::parse(&Self::base_api(base_url))?;
        Ok(Self { http, base })
    }

    /// Joining relative paths onto a base without a trailing slash would drop
    /// its last segment.
    fn base_api(base_url: &str) -> String {
        format!("{}/", base_url.trim().trim_end_matches('/'))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base.join(path)?)
    }
}

#[async_trait]
impl ContactService for HttpContactService {
    /// Accepts either the record itself or the record wrapped in `data`.
    async fn fetch_contact(&self) -> Result<ContactRecord, ServiceError> {
        let endpoint = self.endpoint(CONTACT_PATH)?;
        debug!("fetching contact data from {endpoint}");
        let resp = self.http.get(endpoint).send().await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Status(resp.status().as_u16()));
        }
        let json: Value = resp
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        let payload = match json.get("data").filter(|inner| inner.is_object()).cloned() {
            Some(inner) => inner,
            None => json,
        };
        serde_json::from_value(payload).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn send_message(&self, message: &OutboundMessage) -> Result<(), ServiceError> {
        let endpoint = self.endpoint(MESSAGE_PATH)?;
        debug!("posting support message to {endpoint}");
        let resp = self.http.post(endpoint).json(message).send().await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}
