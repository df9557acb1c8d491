//! Delivery channels for contact-form submissions.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use shared::{
    error::DeliveryTransportError,
    protocol::{FormFields, MailComposeRequest},
};
use url::Url;

/// Primary channel: a network endpoint accepting the field mapping as JSON.
#[async_trait]
pub trait EnquiryTransport: Send + Sync {
    async fn deliver(&self, endpoint: &Url, fields: &FormFields)
        -> Result<(), DeliveryTransportError>;
}

/// Fallback channel: the platform's mail-composition mechanism.
#[async_trait]
pub trait MailHandoff: Send + Sync {
    async fn compose(&self, request: &MailComposeRequest) -> Result<()>;
}

pub struct HttpEnquiryTransport {
    http: Client,
}

impl HttpEnquiryTransport {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

impl Default for HttpEnquiryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnquiryTransport for HttpEnquiryTransport {
    async fn deliver(
        &self,
        endpoint: &Url,
        fields: &FormFields,
    ) -> Result<(), DeliveryTransportError> {
        let res = self
            .http
            .post(endpoint.clone())
            .header(ACCEPT, "application/json")
            .json(fields)
            .send()
            .await
            .map_err(|err| DeliveryTransportError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(DeliveryTransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

pub struct MissingEnquiryTransport;

#[async_trait]
impl EnquiryTransport for MissingEnquiryTransport {
    async fn deliver(
        &self,
        _endpoint: &Url,
        _fields: &FormFields,
    ) -> Result<(), DeliveryTransportError> {
        Err(DeliveryTransportError::Unconfigured)
    }
}

pub struct MissingMailHandoff;

#[async_trait]
impl MailHandoff for MissingMailHandoff {
    async fn compose(&self, request: &MailComposeRequest) -> Result<()> {
        Err(anyhow!(
            "mail handoff is unavailable for recipient {}",
            request.recipient
        ))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
