//! Recording doubles for the page and delivery seams.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{ElementId, FormId, FormStatus, ModalContent},
    error::DeliveryTransportError,
    protocol::{FormFields, MailComposeRequest},
};
use url::Url;

use crate::{
    surface::{LayoutSource, PageSurface},
    transport::{EnquiryTransport, MailHandoff},
    viewport::ElementBounds,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    AddClass(ElementId, String),
    RemoveClass(ElementId, String),
    ScrollLocked(bool),
    BindModal(ModalContent),
    FormStatus(FormId, FormStatus),
    ClearForm(FormId),
}

#[derive(Default)]
pub struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
    classes: Mutex<HashMap<ElementId, HashSet<String>>>,
    scroll_locked: AtomicBool,
}

impl RecordingSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn locked() -> Arc<Self> {
        let surface = Self::default();
        surface.scroll_locked.store(true, Ordering::SeqCst);
        Arc::new(surface)
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.classes
            .lock()
            .expect("classes")
            .get(&element)
            .is_some_and(|classes| classes.contains(class))
    }

    pub fn add_class_count(&self, element: ElementId, class: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SurfaceCall::AddClass(e, c) if *e == element && c == class))
            .count()
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked.load(Ordering::SeqCst)
    }

    pub fn last_bound_modal(&self) -> Option<ModalContent> {
        self.calls().into_iter().rev().find_map(|call| match call {
            SurfaceCall::BindModal(content) => Some(content),
            _ => None,
        })
    }

    pub fn statuses(&self, form: FormId) -> Vec<FormStatus> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::FormStatus(f, status) if f == form => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self, form: FormId) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == SurfaceCall::ClearForm(form))
            .count()
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().expect("calls").push(call);
    }
}

impl PageSurface for RecordingSurface {
    fn add_class(&self, element: ElementId, class: &str) {
        self.classes
            .lock()
            .expect("classes")
            .entry(element)
            .or_default()
            .insert(class.to_string());
        self.record(SurfaceCall::AddClass(element, class.to_string()));
    }

    fn remove_class(&self, element: ElementId, class: &str) {
        if let Some(classes) = self.classes.lock().expect("classes").get_mut(&element) {
            classes.remove(class);
        }
        self.record(SurfaceCall::RemoveClass(element, class.to_string()));
    }

    fn set_scroll_locked(&self, locked: bool) {
        self.scroll_locked.store(locked, Ordering::SeqCst);
        self.record(SurfaceCall::ScrollLocked(locked));
    }

    fn bind_modal(&self, content: &ModalContent) {
        self.record(SurfaceCall::BindModal(content.clone()));
    }

    fn set_form_status(&self, form: FormId, status: &FormStatus) {
        self.record(SurfaceCall::FormStatus(form, status.clone()));
    }

    fn clear_form(&self, form: FormId) {
        self.record(SurfaceCall::ClearForm(form));
    }
}

#[derive(Default)]
pub struct StaticLayout {
    bounds: Mutex<HashMap<ElementId, ElementBounds>>,
}

impl StaticLayout {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn place(&self, element: ElementId, top: f64, height: f64) {
        self.bounds
            .lock()
            .expect("bounds")
            .insert(element, ElementBounds { top, height });
    }
}

impl LayoutSource for StaticLayout {
    fn bounds(&self, element: ElementId) -> Option<ElementBounds> {
        self.bounds.lock().expect("bounds").get(&element).copied()
    }
}

/// Transport answering from a queue of scripted results; `Ok` once the queue is empty.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<(), DeliveryTransportError>>>,
    deliveries: Mutex<Vec<(Url, FormFields)>>,
    hang: bool,
}

impl ScriptedTransport {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_with(errors: Vec<DeliveryTransportError>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(errors.into_iter().map(Err).collect()),
            ..Self::default()
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Self::default()
        })
    }

    pub fn deliveries(&self) -> Vec<(Url, FormFields)> {
        self.deliveries.lock().expect("deliveries").clone()
    }
}

#[async_trait]
impl EnquiryTransport for ScriptedTransport {
    async fn deliver(
        &self,
        endpoint: &Url,
        fields: &FormFields,
    ) -> Result<(), DeliveryTransportError> {
        self.deliveries
            .lock()
            .expect("deliveries")
            .push((endpoint.clone(), fields.clone()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.responses
            .lock()
            .expect("responses")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub struct RecordingMailHandoff {
    requests: Mutex<Vec<MailComposeRequest>>,
    fail: bool,
}

impl RecordingMailHandoff {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<MailComposeRequest> {
        self.requests.lock().expect("requests").clone()
    }
}

#[async_trait]
impl MailHandoff for RecordingMailHandoff {
    async fn compose(&self, request: &MailComposeRequest) -> Result<()> {
        self.requests.lock().expect("requests").push(request.clone());
        if self.fail {
            return Err(anyhow!("no mail client registered"));
        }
        Ok(())
    }
}
