//! Exactly-once reveal transitions with per-element delay and stagger.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use shared::domain::ElementId;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    events::ControllerEvent,
    surface::{PageSurface, VISIBLE_CLASS},
};

pub const DEFAULT_STAGGER_UNIT: Duration = Duration::from_millis(90);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealOptions {
    pub delay_ms: Option<u64>,
    pub stagger_index: Option<u32>,
}

impl RevealOptions {
    pub fn delayed(delay_ms: u64) -> Self {
        Self {
            delay_ms: Some(delay_ms),
            stagger_index: None,
        }
    }

    pub fn staggered(index: u32) -> Self {
        Self {
            delay_ms: None,
            stagger_index: Some(index),
        }
    }

    /// An explicit delay wins over the stagger slot.
    pub fn effective_delay(&self, stagger_unit: Duration) -> Duration {
        match (self.delay_ms, self.stagger_index) {
            (Some(delay_ms), _) => Duration::from_millis(delay_ms),
            (None, Some(index)) => stagger_unit * index,
            (None, None) => Duration::ZERO,
        }
    }
}

#[derive(Default)]
struct RevealState {
    pending: HashMap<ElementId, RevealOptions>,
    revealed: HashSet<ElementId>,
    timers: HashMap<ElementId, JoinHandle<()>>,
}

#[derive(Clone)]
pub struct RevealScheduler {
    inner: Arc<Mutex<RevealState>>,
    surface: Arc<dyn PageSurface>,
    events: broadcast::Sender<ControllerEvent>,
    stagger_unit: Duration,
}

impl RevealScheduler {
    pub fn new(
        surface: Arc<dyn PageSurface>,
        events: broadcast::Sender<ControllerEvent>,
        stagger_unit: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RevealState::default())),
            surface,
            events,
            stagger_unit,
        }
    }

    /// Adds `element` to the pending set. Returns `false` if it is already tracked or revealed.
    pub async fn register(&self, element: ElementId, options: RevealOptions) -> bool {
        let mut state = self.inner.lock().await;
        if state.revealed.contains(&element) || state.pending.contains_key(&element) {
            return false;
        }
        state.pending.insert(element, options);
        true
    }

    /// Schedules the reveal of a pending element after its effective delay.
    pub async fn on_viewport_enter(&self, element: ElementId) {
        let mut state = self.inner.lock().await;
        let Some(options) = state.pending.get(&element).copied() else {
            return;
        };
        if state.timers.contains_key(&element) {
            return;
        }

        let delay = options.effective_delay(self.stagger_unit);
        if delay.is_zero() {
            self.apply(&mut state, element);
            return;
        }

        debug!(%element, delay_ms = delay.as_millis() as u64, "reveal scheduled");
        let scheduler = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = scheduler.inner.lock().await;
            state.timers.remove(&element);
            scheduler.apply(&mut state, element);
        });
        state.timers.insert(element, timer);
    }

    /// Reveals a pending element now, superseding any scheduled timer.
    pub async fn force_reveal(&self, element: ElementId) -> bool {
        let mut state = self.inner.lock().await;
        if let Some(timer) = state.timers.remove(&element) {
            timer.abort();
        }
        self.apply(&mut state, element)
    }

    pub async fn is_pending(&self, element: ElementId) -> bool {
        self.inner.lock().await.pending.contains_key(&element)
    }

    pub async fn is_scheduled(&self, element: ElementId) -> bool {
        self.inner.lock().await.timers.contains_key(&element)
    }

    pub async fn is_revealed(&self, element: ElementId) -> bool {
        self.inner.lock().await.revealed.contains(&element)
    }

    /// Pending elements with no timer running, in id order.
    pub async fn unscheduled(&self) -> Vec<ElementId> {
        let state = self.inner.lock().await;
        let mut elements: Vec<ElementId> = state
            .pending
            .keys()
            .filter(|element| !state.timers.contains_key(element))
            .copied()
            .collect();
        elements.sort();
        elements
    }

    /// Cancels outstanding timers. Elements they were about to reveal stay pending.
    pub async fn shutdown(&self) {
        let mut state = self.inner.lock().await;
        for (element, timer) in state.timers.drain() {
            timer.abort();
            debug!(%element, "reveal timer cancelled");
        }
    }

    // Removing the element from `pending` is the transition itself, so a second call
    // for the same element finds nothing to do.
    fn apply(&self, state: &mut RevealState, element: ElementId) -> bool {
        if state.pending.remove(&element).is_none() {
            return false;
        }
        state.revealed.insert(element);
        self.surface.add_class(element, VISIBLE_CLASS);
        debug!(%element, "element revealed");
        let _ = self.events.send(ControllerEvent::Revealed(element));
        true
    }
}

#[cfg(test)]
#[path = "tests/reveal_tests.rs"]
mod tests;
