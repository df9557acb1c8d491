use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PHONE: &str = "phone";
pub const FIELD_SERVICE: &str = "service";
pub const FIELD_MESSAGE: &str = "message";

const ANONYMOUS_SENDER: &str = "website visitor";

/// Field values collected from a form at submit time. Missing keys read as empty.
///
/// Serialized as a flat JSON object, which is also the body posted to the enquiry endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.get(FIELD_NAME)
    }

    pub fn email(&self) -> &str {
        self.get(FIELD_EMAIL)
    }

    pub fn phone(&self) -> &str {
        self.get(FIELD_PHONE)
    }

    pub fn service(&self) -> &str {
        self.get(FIELD_SERVICE)
    }

    pub fn message(&self) -> &str {
        self.get(FIELD_MESSAGE)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormFields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Mail-composition request handed to the platform when the primary channel is not usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailComposeRequest {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl MailComposeRequest {
    pub fn enquiry(recipient: impl Into<String>, fields: &FormFields) -> Self {
        Self {
            recipient: recipient.into(),
            subject: enquiry_subject(fields),
            body: enquiry_body(fields),
        }
    }

    pub fn to_mailto_uri(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.recipient,
            encode_component(&self.subject),
            encode_component(&self.body)
        )
    }
}

fn enquiry_subject(fields: &FormFields) -> String {
    let sender = [fields.name(), fields.email()]
        .into_iter()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_SENDER);
    format!("Project enquiry from {sender}")
}

fn enquiry_body(fields: &FormFields) -> String {
    format!(
        "Name: {}\nEmail: {}\nPhone: {}\nService: {}\n\n{}",
        fields.name(),
        fields.email(),
        fields.phone(),
        fields.service(),
        fields.message()
    )
}

// Form encoding writes spaces as '+', which mail clients show literally.
// A literal '+' is already escaped as %2B, so the swap is lossless.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
