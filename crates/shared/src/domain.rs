use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, protocol::MailComposeRequest};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ElementId);
id_newtype!(FormId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalState {
    Closed,
    Opening,
    Open,
}

/// Content bound into the modal on open. Absent values render as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalContent {
    pub image: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ModalContent {
    pub fn new(
        image: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            image: non_empty(image.into()),
            title: non_empty(title.into()),
            description: non_empty(description.into()),
        }
    }

    pub fn image_src(&self) -> &str {
        self.image.as_deref().unwrap_or_default()
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Controls a contact form may declare as required, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Name,
    Email,
    Message,
}

impl RequiredField {
    pub const VALIDATION_ORDER: [RequiredField; 3] =
        [RequiredField::Name, RequiredField::Email, RequiredField::Message];

    pub fn key(self) -> &'static str {
        match self {
            RequiredField::Name => "name",
            RequiredField::Email => "email",
            RequiredField::Message => "message",
        }
    }

    pub fn missing_message(self) -> &'static str {
        match self {
            RequiredField::Name => "Please enter your name.",
            RequiredField::Email => "Please enter your email address.",
            RequiredField::Message => "Please enter a message.",
        }
    }
}

/// User-visible status line of a contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum FormStatus {
    Error(String),
    Sending,
    Sent,
    OpeningFallback,
}

impl FormStatus {
    pub fn text(&self) -> &str {
        match self {
            FormStatus::Error(reason) => reason,
            FormStatus::Sending => "Sending…",
            FormStatus::Sent => "Thanks! Your message has been sent.",
            FormStatus::OpeningFallback => "Opening your email app to finish sending…",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FormStatus::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The primary endpoint accepted the submission.
    Sent,
    /// The primary channel failed or was unconfigured; the mail handoff was invoked.
    Deferred(MailComposeRequest),
    /// Validation failed before any delivery attempt.
    Rejected(ValidationError),
}

impl DeliveryOutcome {
    /// `Sent` and `Deferred` end an attempt; only then are the form controls cleared.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryOutcome::Rejected(_))
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
