//! Single-instance gallery modal: `Closed -> Opening -> Open -> Closed`.

use std::{sync::Arc, time::Duration};

use shared::domain::{ElementId, ModalContent, ModalState};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    events::ControllerEvent,
    surface::{PageSurface, MODAL_ACTIVE_CLASS},
};

/// Delay standing in for the next animation frame between `Opening` and `Open`.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    CloseButton,
    /// The modal's own backdrop element, not one of its children.
    Backdrop,
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }
}

/// What a gallery card exposes for the modal. Explicit data values take precedence over
/// the card's own image and heading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryCard {
    pub image: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub child_image: Option<String>,
    pub heading: Option<String>,
}

impl GalleryCard {
    pub fn new(
        image: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            image: Some(image.into()),
            title: Some(title.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn content(&self) -> ModalContent {
        let pick = |explicit: &Option<String>, fallback: &Option<String>| {
            explicit
                .as_deref()
                .filter(|value| !value.is_empty())
                .or_else(|| fallback.as_deref())
                .unwrap_or_default()
                .to_string()
        };
        ModalContent::new(
            pick(&self.image, &self.child_image),
            pick(&self.title, &self.heading),
            pick(&self.description, &None),
        )
    }
}

struct ModalInner {
    state: ModalState,
    content: ModalContent,
    frame: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct ModalController {
    element: ElementId,
    inner: Arc<Mutex<ModalInner>>,
    surface: Arc<dyn PageSurface>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ModalController {
    /// Scroll lock is released unconditionally so a page left locked by a previous
    /// instance recovers on re-initialization.
    pub fn new(
        element: ElementId,
        surface: Arc<dyn PageSurface>,
        events: broadcast::Sender<ControllerEvent>,
    ) -> Self {
        surface.set_scroll_locked(false);
        Self {
            element,
            inner: Arc::new(Mutex::new(ModalInner {
                state: ModalState::Closed,
                content: ModalContent::default(),
                frame: None,
            })),
            surface,
            events,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub async fn state(&self) -> ModalState {
        self.inner.lock().await.state
    }

    pub async fn content(&self) -> ModalContent {
        self.inner.lock().await.content.clone()
    }

    pub async fn open(&self, content: ModalContent) {
        let mut inner = self.inner.lock().await;
        self.surface.bind_modal(&content);
        inner.content = content;

        let state = inner.state;
        match state {
            ModalState::Open | ModalState::Opening => {
                debug!(modal = %self.element, "modal content rebound in place");
            }
            ModalState::Closed => {
                self.surface.add_class(self.element, MODAL_ACTIVE_CLASS);
                self.transition(&mut inner, ModalState::Opening);

                let modal = self.clone();
                inner.frame = Some(tokio::spawn(async move {
                    tokio::time::sleep(FRAME_INTERVAL).await;
                    let mut inner = modal.inner.lock().await;
                    inner.frame = None;
                    if inner.state == ModalState::Opening {
                        modal.surface.set_scroll_locked(true);
                        modal.transition(&mut inner, ModalState::Open);
                    }
                }));
            }
        }
    }

    /// No-op while closed. The image is cleared immediately rather than after any
    /// closing animation.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == ModalState::Closed {
            return;
        }
        if let Some(frame) = inner.frame.take() {
            frame.abort();
        }

        self.surface.remove_class(self.element, MODAL_ACTIVE_CLASS);
        self.surface.set_scroll_locked(false);
        inner.content.image = None;
        self.surface.bind_modal(&inner.content);
        self.transition(&mut inner, ModalState::Closed);
    }

    pub async fn on_click(&self, target: ClickTarget) {
        match target {
            ClickTarget::CloseButton | ClickTarget::Backdrop => self.close().await,
            ClickTarget::Content => {}
        }
    }

    pub async fn on_key(&self, key: &Key) {
        if *key == Key::Escape {
            self.close().await;
        }
    }

    fn transition(&self, inner: &mut ModalInner, next: ModalState) {
        debug!(modal = %self.element, from = ?inner.state, to = ?next, "modal transition");
        inner.state = next;
        let _ = self.events.send(ControllerEvent::ModalStateChanged(next));
    }
}

#[cfg(test)]
#[path = "tests/modal_tests.rs"]
mod tests;
