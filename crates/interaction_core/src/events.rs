//! Events flowing into the controller from the page and out of it to observers.

use shared::domain::{DeliveryOutcome, ElementId, FormId, FormStatus, ModalState};

use crate::{
    modal::{ClickTarget, Key},
    viewport::Viewport,
};

/// Raw page input the host forwards to [`crate::SiteController::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Scroll(Viewport),
    CardClicked(ElementId),
    ModalClicked(ClickTarget),
    KeyDown(Key),
}

/// State transitions observable through [`crate::SiteController::subscribe_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Revealed(ElementId),
    ModalStateChanged(ModalState),
    SubmissionStatus {
        form: FormId,
        attempt: u64,
        status: FormStatus,
    },
    SubmissionFinished {
        form: FormId,
        attempt: u64,
        outcome: DeliveryOutcome,
    },
}
