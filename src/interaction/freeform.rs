//! Freeform editor: pixel placements, min/max size clamping and undo history

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::{EditablePlacement, InteractionKind, InteractionState, Phase, PointerEvent, gate};
use crate::error::Rejection;
use crate::interaction::history::LayoutHistory;
use crate::snapping::GridMetrics;
use crate::tracking::{ChangeCause, Coordinates, Space, TrackingEvent, TrackingSink};
use crate::types::{CapabilityRecord, FreeformPlacement, GridPlacement, Widget};

impl EditablePlacement for FreeformPlacement {
    type Space = ();

    fn widget_id(&self) -> &str {
        &self.id
    }

    fn dragged(&self, dx: i32, dy: i32, _space: &()) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self.clone()
        }
    }

    fn resized(&self, _last: &Self, dw: i32, dh: i32, _space: &()) -> Self {
        let grow = |size: u32, delta: i32| (i64::from(size) + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32;
        Self {
            width: self.clamp_width(grow(self.width, dw)),
            height: self.clamp_height(grow(self.height, dh)),
            ..self.clone()
        }
    }
}

/// Ordered set of freeform placements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeformLayout {
    pub placements: Vec<FreeformPlacement>,
}

impl FreeformLayout {
    pub fn new(placements: Vec<FreeformPlacement>) -> Self {
        Self { placements }
    }

    /// Seed pixel placements from the grid, using each widget's size limits
    pub fn from_grid(placements: &[GridPlacement], widgets: &[Widget], metrics: &GridMetrics) -> Self {
        let placements = placements
            .iter()
            .filter_map(|placement| {
                let widget = widgets.iter().find(|w| w.id() == placement.id)?;
                let px = metrics.to_pixels(placement.rect());
                Some(FreeformPlacement::new(
                    placement.id.clone(),
                    px.x,
                    px.y,
                    px.width,
                    px.height,
                    widget.descriptor.size_limits,
                ))
            })
            .collect();
        Self { placements }
    }

    pub fn get(&self, id: &str) -> Option<&FreeformPlacement> {
        self.placements.iter().find(|p| p.id == id)
    }

    fn replace(&mut self, placement: FreeformPlacement) {
        if let Some(slot) = self.placements.iter_mut().find(|p| p.id == placement.id) {
            *slot = placement;
        }
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// A finished freeform interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeformCommit {
    pub id: String,
    pub placement: FreeformPlacement,
    pub cause: ChangeCause,
}

pub struct FreeformInteractionController {
    editing: bool,
    capabilities: HashMap<String, CapabilityRecord>,
    layout: FreeformLayout,
    history: LayoutHistory<FreeformLayout>,
    state: InteractionState<FreeformPlacement>,
    sink: Arc<dyn TrackingSink>,
}

impl FreeformInteractionController {
    /// Editor over `layout`; the history starts with `layout` as its only entry
    pub fn new(layout: FreeformLayout, widgets: &[Widget], sink: Arc<dyn TrackingSink>) -> Self {
        let capabilities = widgets
            .iter()
            .map(|w| (w.id().to_string(), w.capability))
            .collect();
        Self {
            editing: false,
            capabilities,
            history: LayoutHistory::new(layout.clone()),
            layout,
            state: InteractionState::Idle,
            sink,
        }
    }

    pub fn layout(&self) -> &FreeformLayout {
        &self.layout
    }

    pub fn history(&self) -> &LayoutHistory<FreeformLayout> {
        &self.history
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
        if !editing {
            self.cancel();
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_tracking(&self) -> bool {
        !self.state.is_idle()
    }

    /// Pointer-down on widget `id`
    pub fn begin(&mut self, id: &str, event: &PointerEvent) -> Result<InteractionKind, Rejection> {
        let placement = self
            .layout
            .get(id)
            .ok_or_else(|| Rejection::UnknownWidget(id.to_string()))?
            .clone();
        if self.is_tracking() {
            return Err(Rejection::Busy);
        }
        let capability = self.capabilities.get(id).copied().unwrap_or_default();
        let kind = gate(self.editing, event.target, id, &capability)?;
        self.state.begin(kind, placement, event, ())?;
        debug!(widget = %id, ?kind, "Freeform interaction started");
        Ok(kind)
    }

    /// Pointer-move; the candidate is applied to the layout immediately
    pub fn update(&mut self, event: &PointerEvent) -> Option<&FreeformPlacement> {
        let candidate = self.state.update(event)?.clone();
        let id = candidate.id.clone();
        self.layout.replace(candidate);
        self.layout.get(&id)
    }

    /// Pointer-up; records a history entry and emits a tracking event
    pub fn end(&mut self) -> Option<FreeformCommit> {
        let (kind, active) = self.state.finish()?;
        let placement = active.current;
        self.layout.replace(placement.clone());
        self.history.push(self.layout.clone());

        let commit = FreeformCommit {
            id: placement.id.clone(),
            placement,
            cause: kind.cause(),
        };
        info!(
            widget = %commit.id,
            cause = %commit.cause,
            history_len = self.history.len(),
            "Freeform interaction committed"
        );
        self.sink.emit(&commit_event(kind, &commit));
        Some(commit)
    }

    /// Abandon the interaction and restore the placement it started from
    pub fn cancel(&mut self) -> bool {
        match self.state.finish() {
            Some((_, active)) => {
                self.layout.replace(active.origin);
                true
            }
            None => false,
        }
    }

    /// Restore the previous history entry
    pub fn undo(&mut self) -> bool {
        self.cancel();
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.layout = snapshot;
        self.emit_replaced(ChangeCause::LayoutChange);
        true
    }

    /// Re-apply the next history entry
    pub fn redo(&mut self) -> bool {
        self.cancel();
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.layout = snapshot;
        self.emit_replaced(ChangeCause::LayoutChange);
        true
    }

    /// Go back to the initial layout as a new, undoable history entry
    pub fn reset(&mut self) {
        self.cancel();
        self.layout = self.history.reset().clone();
        self.emit_replaced(ChangeCause::Initial);
    }

    fn emit_replaced(&self, cause: ChangeCause) {
        debug!(cause = %cause, index = self.history.index(), "Freeform layout replaced");
        self.sink.emit(&TrackingEvent::LayoutReplaced {
            cause,
            widgets: self.layout.len(),
        });
    }
}

fn commit_event(kind: InteractionKind, commit: &FreeformCommit) -> TrackingEvent {
    let coordinates = Coordinates {
        space: Space::Pixel,
        x: i64::from(commit.placement.x),
        y: i64::from(commit.placement.y),
        w: commit.placement.width,
        h: commit.placement.height,
    };
    let id = commit.id.clone();
    match kind {
        InteractionKind::Drag => TrackingEvent::WidgetMoved {
            id,
            coordinates,
            cause: commit.cause,
        },
        InteractionKind::Resize => TrackingEvent::WidgetResized {
            id,
            coordinates,
            cause: commit.cause,
        },
    }
}
