use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::RequiredField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    DeliveryTransport,
    CapabilityUnavailable,
}

/// A user-correctable problem with the submitted fields. Blocks delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    pub field: RequiredField,
    pub message: String,
}

impl ValidationError {
    pub fn missing(field: RequiredField) -> Self {
        Self {
            field,
            message: field.missing_message().to_string(),
        }
    }
}

/// Primary-channel failure. Always recovered by the mail fallback.
#[derive(Debug, Error)]
pub enum DeliveryTransportError {
    #[error("no delivery endpoint configured")]
    Unconfigured,
    #[error("endpoint rejected submission with status {0}")]
    Status(u16),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{capability} is unavailable in this runtime")]
pub struct CapabilityUnavailable {
    pub capability: &'static str,
}

impl ErrorKind {
    pub fn is_blocking(self) -> bool {
        self == ErrorKind::Validation
    }
}

impl From<&ValidationError> for ErrorKind {
    fn from(_: &ValidationError) -> Self {
        ErrorKind::Validation
    }
}

impl From<&DeliveryTransportError> for ErrorKind {
    fn from(_: &DeliveryTransportError) -> Self {
        ErrorKind::DeliveryTransport
    }
}

impl From<&CapabilityUnavailable> for ErrorKind {
    fn from(_: &CapabilityUnavailable) -> Self {
        ErrorKind::CapabilityUnavailable
    }
}
