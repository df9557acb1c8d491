//! Interaction controller for the marketing site: viewport-driven reveals, the project
//! gallery modal, and the contact-form delivery pipeline.

pub mod config;
mod controller;
pub mod events;
pub mod form;
pub mod modal;
pub mod reveal;
pub mod surface;
pub mod transport;
pub mod viewport;

pub use config::{load_settings, load_settings_from, ConfigError, Settings};
pub use controller::{ControllerError, PageDependencies, SiteController};
pub use events::{ControllerEvent, PageEvent};
pub use form::{FormConfig, FormSchema, FormSubmissionPipeline};
pub use modal::{ClickTarget, GalleryCard, Key, ModalController};
pub use reveal::{RevealOptions, RevealScheduler};
pub use surface::{LayoutSource, PageSurface, TracingSurface};
pub use transport::{
    EnquiryTransport, HttpEnquiryTransport, MailHandoff, MissingEnquiryTransport,
    MissingMailHandoff,
};
pub use viewport::{ElementBounds, Viewport, ViewportWatcher, VisibilityCapability, WatchOptions};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
