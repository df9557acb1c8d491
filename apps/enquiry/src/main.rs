use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use interaction_core::{
    load_settings_from, FormSchema, FormSubmissionPipeline, HttpEnquiryTransport, MailHandoff,
    TracingSurface,
};
use shared::{
    domain::{DeliveryOutcome, FormId},
    protocol::{FormFields, MailComposeRequest, FIELD_EMAIL, FIELD_MESSAGE, FIELD_NAME, FIELD_PHONE, FIELD_SERVICE},
};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Submit a project enquiry through the site's delivery pipeline.
#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./site.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured form endpoint.
    #[arg(long)]
    endpoint: Option<Url>,
    /// Ignore any configured endpoint and go straight to the mail fallback.
    #[arg(long)]
    fallback_only: bool,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    service: String,
    #[arg(long, default_value = "")]
    message: String,
}

impl Args {
    fn fields(&self) -> FormFields {
        FormFields::new()
            .with(FIELD_NAME, self.name.as_str())
            .with(FIELD_EMAIL, self.email.as_str())
            .with(FIELD_PHONE, self.phone.as_str())
            .with(FIELD_SERVICE, self.service.as_str())
            .with(FIELD_MESSAGE, self.message.as_str())
    }
}

/// Prints the compose URI so the user can open it in their mail client.
struct StdoutMailHandoff;

#[async_trait]
impl MailHandoff for StdoutMailHandoff {
    async fn compose(&self, request: &MailComposeRequest) -> Result<()> {
        println!("{}", request.to_mailto_uri());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings =
        load_settings_from(args.config.as_deref()).context("failed to load site settings")?;
    if let Some(endpoint) = args.endpoint.clone() {
        settings.form_endpoint = Some(endpoint);
    }
    if args.fallback_only {
        settings.form_endpoint = None;
    }

    let (events, _) = broadcast::channel(16);
    let pipeline = FormSubmissionPipeline::new(
        FormId(1),
        FormSchema::default(),
        Arc::new(HttpEnquiryTransport::new()),
        Arc::new(StdoutMailHandoff),
        Arc::new(TracingSurface),
        events,
    );

    match pipeline.submit(&args.fields(), &settings.form_config()).await {
        DeliveryOutcome::Sent => info!("enquiry delivered"),
        DeliveryOutcome::Deferred(request) => {
            info!(recipient = %request.recipient, "enquiry handed off to mail client")
        }
        DeliveryOutcome::Rejected(err) => bail!("{err}"),
    }

    Ok(())
}
