//! Seams between the controller and the page it drives.

use shared::domain::{ElementId, FormId, FormStatus, ModalContent};
use tracing::info;

use crate::viewport::ElementBounds;

pub const VISIBLE_CLASS: &str = "visible";
pub const MODAL_ACTIVE_CLASS: &str = "active";

/// Every UI-visible side effect of the controller goes through this trait.
pub trait PageSurface: Send + Sync {
    fn add_class(&self, element: ElementId, class: &str);
    fn remove_class(&self, element: ElementId, class: &str);
    /// Page-level scroll lock. Only [`crate::ModalController`] writes it.
    fn set_scroll_locked(&self, locked: bool);
    /// Overwrites every bound modal field; absent values are rendered empty.
    fn bind_modal(&self, content: &ModalContent);
    fn set_form_status(&self, form: FormId, status: &FormStatus);
    fn clear_form(&self, form: FormId);
}

/// Geometry lookup for tracked elements. `None` means the element is not laid out.
pub trait LayoutSource: Send + Sync {
    fn bounds(&self, element: ElementId) -> Option<ElementBounds>;
}

/// Headless surface that records side effects in the log.
pub struct TracingSurface;

impl PageSurface for TracingSurface {
    fn add_class(&self, element: ElementId, class: &str) {
        info!(%element, class, "class added");
    }

    fn remove_class(&self, element: ElementId, class: &str) {
        info!(%element, class, "class removed");
    }

    fn set_scroll_locked(&self, locked: bool) {
        info!(locked, "page scroll lock");
    }

    fn bind_modal(&self, content: &ModalContent) {
        info!(
            image = content.image_src(),
            title = content.title_text(),
            description = content.description_text(),
            "modal content bound"
        );
    }

    fn set_form_status(&self, form: FormId, status: &FormStatus) {
        info!(%form, status = status.text(), "form status");
    }

    fn clear_form(&self, form: FormId) {
        info!(%form, "form cleared");
    }
}
