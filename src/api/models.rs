use serde::{Deserialize, Serialize};

/// Support contact details returned by the contact endpoint.
///
/// Blank fields are treated the same as missing ones: the matching action is
/// unavailable.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ContactRecord {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, rename = "mail", alias = "email")]
    pub email: Option<String>,
    #[serde(default, rename = "whatsapp", alias = "chat_handle")]
    pub chat_handle: Option<String>,
}

impl ContactRecord {
    pub fn phone(&self) -> Option<&str> {
        non_blank(self.phone.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    pub fn chat_handle(&self) -> Option<&str> {
        non_blank(self.chat_handle.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    #[serde(rename = "email")]
    pub sender_email: String,
    #[serde(rename = "mensagem")]
    pub body: String,
}

impl OutboundMessage {
    pub fn new(sender_email: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender_email: sender_email.into(),
            body: body.into(),
        }
    }
}
