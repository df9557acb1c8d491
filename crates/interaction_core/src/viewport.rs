//! One-shot visibility detection for tracked elements.

use std::collections::BTreeSet;

use shared::{domain::ElementId, error::CapabilityUnavailable};
use tracing::{debug, warn};

use crate::surface::LayoutSource;

pub const DEFAULT_REVEAL_THRESHOLD: f64 = 0.12;
pub const DEFAULT_ROOT_MARGIN: f64 = 0.12;

const VISIBILITY_CAPABILITY: &str = "viewport visibility detection";

/// Vertical extent of an element in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBounds {
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, height: f64) -> Self {
        Self { scroll_top, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityCapability {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    /// Fraction of the element that must be visible, in `[0, 1]`.
    pub threshold: f64,
    /// Extends the viewport bottom by this fraction of its height.
    pub root_margin: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REVEAL_THRESHOLD,
            root_margin: DEFAULT_ROOT_MARGIN,
        }
    }
}

/// Fraction of `bounds` inside the viewport once its bottom edge is pushed down by
/// `root_margin`. Zero-height elements count as fully visible when their top is inside.
pub fn visible_ratio(bounds: ElementBounds, viewport: Viewport, root_margin: f64) -> f64 {
    let top = viewport.scroll_top;
    let bottom = viewport.scroll_top + viewport.height * (1.0 + root_margin.max(0.0));

    if bounds.height <= 0.0 {
        return if bounds.top >= top && bounds.top <= bottom {
            1.0
        } else {
            0.0
        };
    }

    let overlap = (bounds.top + bounds.height).min(bottom) - bounds.top.max(top);
    (overlap / bounds.height).clamp(0.0, 1.0)
}

pub struct ViewportWatcher {
    options: WatchOptions,
    capability: VisibilityCapability,
    observed: BTreeSet<ElementId>,
    warned_unavailable: bool,
}

impl ViewportWatcher {
    pub fn new(options: WatchOptions, capability: VisibilityCapability) -> Self {
        Self {
            options: WatchOptions {
                threshold: options.threshold.clamp(0.0, 1.0),
                root_margin: options.root_margin.max(0.0),
            },
            capability,
            observed: BTreeSet::new(),
            warned_unavailable: false,
        }
    }

    pub fn options(&self) -> WatchOptions {
        self.options
    }

    pub fn capability_error(&self) -> Option<CapabilityUnavailable> {
        match self.capability {
            VisibilityCapability::Available => None,
            VisibilityCapability::Unavailable => Some(CapabilityUnavailable {
                capability: VISIBILITY_CAPABILITY,
            }),
        }
    }

    /// Starts tracking `element`. Without visibility detection the element is returned
    /// immediately as visible and never tracked.
    pub fn observe(&mut self, element: ElementId) -> Option<ElementId> {
        if let Some(err) = self.capability_error() {
            if !self.warned_unavailable {
                warn!(error = %err, "revealing tracked elements immediately");
                self.warned_unavailable = true;
            }
            return Some(element);
        }

        self.observed.insert(element);
        None
    }

    pub fn unobserve(&mut self, element: ElementId) -> bool {
        self.observed.remove(&element)
    }

    pub fn is_observing(&self, element: ElementId) -> bool {
        self.observed.contains(&element)
    }

    pub fn observed_len(&self) -> usize {
        self.observed.len()
    }

    /// Whether `element` satisfies the visibility threshold in `viewport`.
    pub fn is_visible(&self, element: ElementId, viewport: Viewport, layout: &dyn LayoutSource) -> bool {
        layout
            .bounds(element)
            .map(|bounds| {
                let ratio = visible_ratio(bounds, viewport, self.options.root_margin);
                ratio > 0.0 && ratio >= self.options.threshold
            })
            .unwrap_or(false)
    }

    /// Whether any part of `element` intersects the pre-trigger viewport.
    pub fn intersects(&self, element: ElementId, viewport: Viewport, layout: &dyn LayoutSource) -> bool {
        layout
            .bounds(element)
            .map(|bounds| visible_ratio(bounds, viewport, self.options.root_margin) > 0.0)
            .unwrap_or(false)
    }

    /// Returns every observed element that crossed the threshold and stops observing it.
    /// Each element is reported at most once over the watcher's lifetime.
    pub fn evaluate(&mut self, viewport: Viewport, layout: &dyn LayoutSource) -> Vec<ElementId> {
        let crossed: Vec<ElementId> = self
            .observed
            .iter()
            .copied()
            .filter(|element| self.is_visible(*element, viewport, layout))
            .collect();

        for element in &crossed {
            self.observed.remove(element);
            debug!(%element, "element entered viewport");
        }

        crossed
    }
}

#[cfg(test)]
#[path = "tests/viewport_tests.rs"]
mod tests;
