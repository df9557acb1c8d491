use std::{collections::HashMap, sync::Arc};

use shared::{
    domain::{DeliveryOutcome, ElementId, FormId},
    protocol::FormFields,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::{
    config::Settings,
    events::{ControllerEvent, PageEvent},
    form::{FormConfig, FormSchema, FormSubmissionPipeline},
    modal::{ClickTarget, GalleryCard, Key, ModalController, FRAME_INTERVAL},
    reveal::{RevealOptions, RevealScheduler},
    surface::{LayoutSource, PageSurface},
    transport::{EnquiryTransport, HttpEnquiryTransport, MailHandoff, MissingMailHandoff},
    viewport::{Viewport, ViewportWatcher, VisibilityCapability},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("form {0} is not bound")]
    UnboundForm(FormId),
    #[error("gallery card {0} is not bound")]
    UnboundCard(ElementId),
    #[error("page has no modal element")]
    MissingModal,
}

/// Collaborators the controller drives. `modal` is `None` on pages without a modal.
pub struct PageDependencies {
    pub surface: Arc<dyn PageSurface>,
    pub layout: Arc<dyn LayoutSource>,
    pub capability: VisibilityCapability,
    pub transport: Arc<dyn EnquiryTransport>,
    pub mail: Arc<dyn MailHandoff>,
    pub modal: Option<ElementId>,
}

impl PageDependencies {
    pub fn new(surface: Arc<dyn PageSurface>, layout: Arc<dyn LayoutSource>) -> Self {
        Self {
            surface,
            layout,
            capability: VisibilityCapability::Available,
            transport: Arc::new(HttpEnquiryTransport::new()),
            mail: Arc::new(MissingMailHandoff),
            modal: None,
        }
    }
}

struct BoundForm {
    pipeline: Arc<FormSubmissionPipeline>,
    config: FormConfig,
}

#[derive(Default)]
struct ScrollFrame {
    latest: Option<Viewport>,
    tick: Option<JoinHandle<()>>,
}

/// Wires the three interaction contracts to a page. The components share nothing but
/// the surface and the event channel.
pub struct SiteController {
    settings: Settings,
    surface: Arc<dyn PageSurface>,
    layout: Arc<dyn LayoutSource>,
    transport: Arc<dyn EnquiryTransport>,
    mail: Arc<dyn MailHandoff>,
    watcher: Mutex<ViewportWatcher>,
    reveal: RevealScheduler,
    modal: Option<ModalController>,
    cards: Mutex<HashMap<ElementId, GalleryCard>>,
    forms: Mutex<HashMap<FormId, BoundForm>>,
    scroll: Mutex<ScrollFrame>,
    sweep: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<ControllerEvent>,
}

impl SiteController {
    pub fn new(
        settings: Settings,
        surface: Arc<dyn PageSurface>,
        layout: Arc<dyn LayoutSource>,
    ) -> Arc<Self> {
        Self::new_with_dependencies(settings, PageDependencies::new(surface, layout))
    }

    pub fn new_with_dependencies(settings: Settings, deps: PageDependencies) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        deps.surface.set_scroll_locked(false);
        let reveal = RevealScheduler::new(
            deps.surface.clone(),
            events.clone(),
            settings.stagger_unit(),
        );
        let modal = deps
            .modal
            .map(|element| ModalController::new(element, deps.surface.clone(), events.clone()));

        Arc::new(Self {
            watcher: Mutex::new(ViewportWatcher::new(settings.watch_options(), deps.capability)),
            settings,
            surface: deps.surface,
            layout: deps.layout,
            transport: deps.transport,
            mail: deps.mail,
            reveal,
            modal,
            cards: Mutex::new(HashMap::new()),
            forms: Mutex::new(HashMap::new()),
            scroll: Mutex::new(ScrollFrame::default()),
            sweep: Mutex::new(None),
            events,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn reveal(&self) -> &RevealScheduler {
        &self.reveal
    }

    pub fn modal(&self) -> Option<&ModalController> {
        self.modal.as_ref()
    }

    pub async fn register_reveal_target(&self, element: ElementId, options: RevealOptions) {
        if !self.reveal.register(element, options).await {
            debug!(%element, "reveal target already registered");
            return;
        }
        let immediate = self.watcher.lock().await.observe(element);
        if let Some(element) = immediate {
            self.reveal.force_reveal(element).await;
        }
    }

    pub async fn bind_gallery_card(&self, element: ElementId, card: GalleryCard) {
        self.cards.lock().await.insert(element, card);
    }

    pub async fn bind_form(&self, form: FormId, schema: FormSchema, config: FormConfig) {
        let pipeline = Arc::new(FormSubmissionPipeline::new(
            form,
            schema,
            self.transport.clone(),
            self.mail.clone(),
            self.surface.clone(),
            self.events.clone(),
        ));
        self.forms
            .lock()
            .await
            .insert(form, BoundForm { pipeline, config });
    }

    /// Binds a form using the endpoint and fallback address from settings.
    pub async fn bind_form_with_settings(&self, form: FormId, schema: FormSchema) {
        self.bind_form(form, schema, self.settings.form_config()).await;
    }

    /// Records the initial viewport and schedules the one-time sweep that reveals
    /// anything already on screen.
    pub async fn start(self: &Arc<Self>, viewport: Viewport) {
        self.scroll.lock().await.latest = Some(viewport);

        let controller = Arc::clone(self);
        let delay = self.settings.initial_sweep_delay();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.sweep().await;
        });
        if let Some(previous) = self.sweep.lock().await.replace(task) {
            previous.abort();
        }
        info!(delay_ms = delay.as_millis() as u64, "interaction controller started");
    }

    /// Force-reveals every pending element that intersects the last known viewport.
    pub async fn sweep(&self) -> Vec<ElementId> {
        let Some(viewport) = self.scroll.lock().await.latest else {
            return Vec::new();
        };

        let mut revealed = Vec::new();
        for element in self.reveal.unscheduled().await {
            let visible = {
                let mut watcher = self.watcher.lock().await;
                let visible = watcher.intersects(element, viewport, self.layout.as_ref());
                if visible {
                    watcher.unobserve(element);
                }
                visible
            };
            if visible && self.reveal.force_reveal(element).await {
                revealed.push(element);
            }
        }
        if !revealed.is_empty() {
            debug!(count = revealed.len(), "startup sweep revealed elements");
        }
        revealed
    }

    /// Coalesces scroll input to one evaluation per frame; the latest viewport wins.
    pub async fn on_scroll(self: &Arc<Self>, viewport: Viewport) {
        let mut frame = self.scroll.lock().await;
        frame.latest = Some(viewport);
        if frame.tick.is_some() {
            return;
        }

        let controller = Arc::clone(self);
        frame.tick = Some(tokio::spawn(async move {
            tokio::time::sleep(FRAME_INTERVAL).await;
            let latest = {
                let mut frame = controller.scroll.lock().await;
                frame.tick = None;
                frame.latest
            };
            if let Some(viewport) = latest {
                controller.evaluate_viewport(viewport).await;
            }
        }));
    }

    /// Notifies the reveal scheduler of every tracked element that crossed the threshold.
    pub async fn evaluate_viewport(&self, viewport: Viewport) -> Vec<ElementId> {
        let entered = self
            .watcher
            .lock()
            .await
            .evaluate(viewport, self.layout.as_ref());
        for element in &entered {
            self.reveal.on_viewport_enter(*element).await;
        }
        entered
    }

    pub async fn open_card(&self, element: ElementId) -> Result<(), ControllerError> {
        let content = self
            .cards
            .lock()
            .await
            .get(&element)
            .map(GalleryCard::content)
            .ok_or(ControllerError::UnboundCard(element))?;
        let modal = self.modal.as_ref().ok_or(ControllerError::MissingModal)?;
        modal.open(content).await;
        Ok(())
    }

    pub async fn on_modal_click(&self, target: ClickTarget) {
        if let Some(modal) = &self.modal {
            modal.on_click(target).await;
        }
    }

    pub async fn on_key(&self, key: &Key) {
        if let Some(modal) = &self.modal {
            modal.on_key(key).await;
        }
    }

    pub async fn submit_form(
        &self,
        form: FormId,
        fields: &FormFields,
    ) -> Result<DeliveryOutcome, ControllerError> {
        let (pipeline, config) = {
            let forms = self.forms.lock().await;
            let bound = forms.get(&form).ok_or(ControllerError::UnboundForm(form))?;
            (bound.pipeline.clone(), bound.config.clone())
        };
        Ok(pipeline.submit(fields, &config).await)
    }

    /// Routes raw page input. Clicks on unbound cards are ignored.
    pub async fn dispatch(self: &Arc<Self>, event: PageEvent) {
        match event {
            PageEvent::Scroll(viewport) => self.on_scroll(viewport).await,
            PageEvent::CardClicked(element) => {
                if let Err(err) = self.open_card(element).await {
                    debug!(error = %err, "card click ignored");
                }
            }
            PageEvent::ModalClicked(target) => self.on_modal_click(target).await,
            PageEvent::KeyDown(key) => self.on_key(&key).await,
        }
    }

    /// Cancels every outstanding timer and closes the modal, releasing scroll lock.
    pub async fn shutdown(&self) {
        if let Some(task) = self.sweep.lock().await.take() {
            task.abort();
        }
        if let Some(tick) = self.scroll.lock().await.tick.take() {
            tick.abort();
        }
        self.reveal.shutdown().await;
        if let Some(modal) = &self.modal {
            modal.close().await;
        }
        info!("interaction controller shut down");
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
