use super::*;
use crate::test_support::{RecordingSurface, SurfaceCall};

const MODAL: ElementId = ElementId(500);

fn modal(surface: Arc<RecordingSurface>) -> (ModalController, broadcast::Receiver<ControllerEvent>) {
    let (events, rx) = broadcast::channel(64);
    (ModalController::new(MODAL, surface, events), rx)
}

async fn next_frame() {
    tokio::time::sleep(FRAME_INTERVAL * 2).await;
}

fn harbour() -> ModalContent {
    ModalContent::new("/img/harbour.jpg", "Harbour Offices", "Fit-out of a listed warehouse.")
}

#[tokio::test(start_paused = true)]
async fn open_goes_through_opening_to_open_on_next_frame() {
    let surface = RecordingSurface::new();
    let (modal, mut rx) = modal(surface.clone());

    modal.open(harbour()).await;
    assert_eq!(modal.state().await, ModalState::Opening);
    assert!(surface.has_class(MODAL, MODAL_ACTIVE_CLASS));
    assert!(!surface.scroll_locked());

    next_frame().await;
    assert_eq!(modal.state().await, ModalState::Open);
    assert!(surface.scroll_locked());

    let transitions: Vec<ControllerEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert_eq!(
        transitions,
        vec![
            ControllerEvent::ModalStateChanged(ModalState::Opening),
            ControllerEvent::ModalStateChanged(ModalState::Open),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn close_releases_scroll_lock_and_clears_image() {
    let surface = RecordingSurface::new();
    let (modal, _rx) = modal(surface.clone());

    modal.open(harbour()).await;
    next_frame().await;
    modal.close().await;

    assert_eq!(modal.state().await, ModalState::Closed);
    assert!(!surface.scroll_locked());
    assert!(!surface.has_class(MODAL, MODAL_ACTIVE_CLASS));
    assert_eq!(modal.content().await.image, None);
    assert_eq!(surface.last_bound_modal().expect("bound").image_src(), "");
}

#[tokio::test(start_paused = true)]
async fn reopening_never_shows_previous_content() {
    let surface = RecordingSurface::new();
    let (modal, _rx) = modal(surface.clone());

    modal.open(harbour()).await;
    next_frame().await;
    modal.close().await;
    modal
        .open(ModalContent {
            image: None,
            title: Some("Riverside Loft".into()),
            description: None,
        })
        .await;
    next_frame().await;

    let bound = surface.last_bound_modal().expect("bound");
    assert_eq!(bound.image_src(), "");
    assert_eq!(bound.title_text(), "Riverside Loft");
    assert_eq!(bound.description_text(), "");
    assert_eq!(modal.content().await, bound);
}

#[tokio::test(start_paused = true)]
async fn open_while_open_rebinds_without_flashing() {
    let surface = RecordingSurface::new();
    let (modal, mut rx) = modal(surface.clone());

    modal.open(harbour()).await;
    next_frame().await;
    while rx.try_recv().is_ok() {}

    let calls_before = surface.calls().len();
    modal
        .open(ModalContent::new("/img/loft.jpg", "Loft", ""))
        .await;
    next_frame().await;

    assert_eq!(modal.state().await, ModalState::Open);
    assert!(rx.try_recv().is_err());
    assert_eq!(
        surface.calls()[calls_before..],
        [SurfaceCall::BindModal(ModalContent::new("/img/loft.jpg", "Loft", ""))]
    );
    assert!(surface.scroll_locked());
}

#[tokio::test(start_paused = true)]
async fn close_while_opening_cancels_the_frame() {
    let surface = RecordingSurface::new();
    let (modal, _rx) = modal(surface.clone());

    modal.open(harbour()).await;
    modal.close().await;
    next_frame().await;

    assert_eq!(modal.state().await, ModalState::Closed);
    assert!(!surface.scroll_locked());
}

#[tokio::test]
async fn close_while_closed_is_a_no_op() {
    let surface = RecordingSurface::new();
    let (modal, mut rx) = modal(surface.clone());
    let calls_before = surface.calls().len();

    modal.close().await;

    assert_eq!(surface.calls().len(), calls_before);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn construction_releases_a_stuck_scroll_lock() {
    let surface = RecordingSurface::locked();
    let (_modal, _rx) = modal(surface.clone());
    assert!(!surface.scroll_locked());
}

#[tokio::test(start_paused = true)]
async fn dismissal_triggers() {
    let surface = RecordingSurface::new();
    let (modal, _rx) = modal(surface.clone());

    for trigger in 0..3 {
        modal.open(harbour()).await;
        next_frame().await;

        modal.on_click(ClickTarget::Content).await;
        modal.on_key(&Key::from_name("Enter")).await;
        assert_eq!(modal.state().await, ModalState::Open);

        match trigger {
            0 => modal.on_click(ClickTarget::CloseButton).await,
            1 => modal.on_click(ClickTarget::Backdrop).await,
            _ => modal.on_key(&Key::from_name("Escape")).await,
        }
        assert_eq!(modal.state().await, ModalState::Closed);
    }
}

#[tokio::test(start_paused = true)]
async fn scroll_lock_tracks_open_state_across_sequences() {
    let surface = RecordingSurface::new();
    let (modal, _rx) = modal(surface.clone());

    // 0 = open, 1 = close, 2 = frame tick
    let script = [0, 2, 0, 1, 1, 0, 1, 2, 0, 2, 2, 0, 2, 1, 0];
    for step in script {
        match step {
            0 => modal.open(harbour()).await,
            1 => modal.close().await,
            _ => next_frame().await,
        }
        assert_eq!(
            surface.scroll_locked(),
            modal.state().await == ModalState::Open,
            "after step {step}"
        );
    }
}

#[test]
fn gallery_card_prefers_explicit_values() {
    let card = GalleryCard {
        image: Some("/img/data.jpg".into()),
        title: None,
        description: Some("From data".into()),
        child_image: Some("/img/child.jpg".into()),
        heading: Some("Heading".into()),
    };
    let content = card.content();
    assert_eq!(content.image_src(), "/img/data.jpg");
    assert_eq!(content.title_text(), "Heading");
    assert_eq!(content.description_text(), "From data");

    assert_eq!(GalleryCard::default().content(), ModalContent::default());
}
