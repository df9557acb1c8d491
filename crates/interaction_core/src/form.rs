//! Contact-form submission: validate, try the endpoint, fall back to mail composition.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::{DeliveryOutcome, FormId, FormStatus, RequiredField},
    error::{DeliveryTransportError, ErrorKind, ValidationError},
    protocol::{FormFields, MailComposeRequest},
};
use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

use crate::{
    events::ControllerEvent,
    surface::PageSurface,
    transport::{EnquiryTransport, MailHandoff},
};

pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(8);

/// Shown when primary delivery fails and no fallback address is configured.
pub const DELIVERY_UNAVAILABLE_MESSAGE: &str =
    "Sorry, your message could not be sent right now. Please try again later.";

/// Which required controls exist on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSchema {
    pub name: bool,
    pub email: bool,
    pub message: bool,
}

impl Default for FormSchema {
    fn default() -> Self {
        Self {
            name: true,
            email: true,
            message: true,
        }
    }
}

impl FormSchema {
    fn requires(&self, field: RequiredField) -> bool {
        match field {
            RequiredField::Name => self.name,
            RequiredField::Email => self.email,
            RequiredField::Message => self.message,
        }
    }

    /// Reports only the first empty required field, in name, email, message order.
    pub fn validate(&self, fields: &FormFields) -> Result<(), ValidationError> {
        match RequiredField::VALIDATION_ORDER
            .into_iter()
            .filter(|field| self.requires(*field))
            .find(|field| fields.get(field.key()).trim().is_empty())
        {
            Some(field) => Err(ValidationError::missing(field)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// Absent means every submission goes straight to the fallback.
    pub endpoint: Option<Url>,
    pub fallback_address: String,
    pub submit_timeout: Duration,
}

impl FormConfig {
    pub fn fallback_only(fallback_address: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            fallback_address: fallback_address.into(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

pub struct FormSubmissionPipeline {
    form: FormId,
    schema: FormSchema,
    transport: Arc<dyn EnquiryTransport>,
    mail: Arc<dyn MailHandoff>,
    surface: Arc<dyn PageSurface>,
    events: broadcast::Sender<ControllerEvent>,
    attempts: AtomicU64,
}

impl FormSubmissionPipeline {
    pub fn new(
        form: FormId,
        schema: FormSchema,
        transport: Arc<dyn EnquiryTransport>,
        mail: Arc<dyn MailHandoff>,
        surface: Arc<dyn PageSurface>,
        events: broadcast::Sender<ControllerEvent>,
    ) -> Self {
        Self {
            form,
            schema,
            transport,
            mail,
            surface,
            events,
            attempts: AtomicU64::new(0),
        }
    }

    pub fn form(&self) -> FormId {
        self.form
    }

    pub fn schema(&self) -> FormSchema {
        self.schema
    }

    /// Runs one independent attempt. Transport failures never escape: they route the
    /// submission to the mail fallback. The form is left untouched when validation fails
    /// or when no fallback address is configured.
    pub async fn submit(&self, fields: &FormFields, config: &FormConfig) -> DeliveryOutcome {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;

        if let Err(err) = self.schema.validate(fields) {
            warn!(
                form = %self.form,
                attempt,
                field = err.field.key(),
                kind = ?ErrorKind::from(&err),
                "submission rejected"
            );
            self.report(attempt, FormStatus::Error(err.message.clone()));
            return self.finish(attempt, DeliveryOutcome::Rejected(err));
        }

        self.report(attempt, FormStatus::Sending);

        let outcome = match self.deliver_primary(fields, config).await {
            Ok(()) => {
                info!(form = %self.form, attempt, "submission delivered");
                self.report(attempt, FormStatus::Sent);
                DeliveryOutcome::Sent
            }
            Err(err) => {
                warn!(
                    form = %self.form,
                    attempt,
                    error = %err,
                    kind = ?ErrorKind::from(&err),
                    "primary delivery unavailable; falling back to mail"
                );
                let request = MailComposeRequest::enquiry(&config.fallback_address, fields);
                if request.recipient.trim().is_empty() {
                    // Fields stay populated so the visitor can retry.
                    warn!(
                        form = %self.form,
                        attempt,
                        "no fallback address configured; mail handoff skipped"
                    );
                    let status = FormStatus::Error(DELIVERY_UNAVAILABLE_MESSAGE.to_string());
                    self.report(attempt, status);
                    return self.finish(attempt, DeliveryOutcome::Deferred(request));
                }
                self.report(attempt, FormStatus::OpeningFallback);
                self.hand_off(attempt, &request).await;
                DeliveryOutcome::Deferred(request)
            }
        };

        self.surface.clear_form(self.form);
        self.finish(attempt, outcome)
    }

    async fn deliver_primary(
        &self,
        fields: &FormFields,
        config: &FormConfig,
    ) -> Result<(), DeliveryTransportError> {
        let Some(endpoint) = &config.endpoint else {
            return Err(DeliveryTransportError::Unconfigured);
        };

        match tokio::time::timeout(config.submit_timeout, self.transport.deliver(endpoint, fields))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DeliveryTransportError::Timeout(config.submit_timeout)),
        }
    }

    async fn hand_off(&self, attempt: u64, request: &MailComposeRequest) {
        if let Err(err) = self.mail.compose(request).await {
            warn!(form = %self.form, attempt, error = %err, "mail handoff failed");
        }
    }

    fn report(&self, attempt: u64, status: FormStatus) {
        self.surface.set_form_status(self.form, &status);
        let _ = self.events.send(ControllerEvent::SubmissionStatus {
            form: self.form,
            attempt,
            status,
        });
    }

    fn finish(&self, attempt: u64, outcome: DeliveryOutcome) -> DeliveryOutcome {
        let _ = self.events.send(ControllerEvent::SubmissionFinished {
            form: self.form,
            attempt,
            outcome: outcome.clone(),
        });
        outcome
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
