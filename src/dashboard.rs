//! Editing session: routes pointer input and lifecycle operations to the engine
//!
//! The dashboard owns the capability-augmented catalog, the full saved layout
//! (hidden widgets included) and the resolved grid placements. Every change to
//! the placement list goes through a resolver pass.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::capability::{CapabilityMap, resolve_capabilities};
use crate::catalog::{DefaultPositionTable, WidgetCatalog};
use crate::error::Rejection;
use crate::interaction::{
    FreeformInteractionController, FreeformLayout, GridCommit, GridInteractionController, InteractionKind, Phase,
    PointerEvent,
};
use crate::layout;
use crate::persistence::LayoutWriter;
use crate::snapping::GridMetrics;
use crate::tracking::{ChangeCause, Coordinates, Space, TrackingEvent, TrackingSink};
use crate::types::{GridPlacement, GridRect, SavedLayout, Widget};

pub struct Dashboard {
    catalog: WidgetCatalog,
    capabilities: CapabilityMap,
    widgets: Vec<Widget>,
    defaults: DefaultPositionTable,
    saved: SavedLayout,
    placements: Vec<GridPlacement>,
    grid: GridInteractionController,
    writer: Box<dyn LayoutWriter>,
    sink: Arc<dyn TrackingSink>,
}

impl Dashboard {
    /// Build a session from loaded state; emits an `initial` layout event
    pub fn new(
        catalog: WidgetCatalog,
        capabilities: CapabilityMap,
        defaults: DefaultPositionTable,
        saved: Option<SavedLayout>,
        metrics: GridMetrics,
        writer: Box<dyn LayoutWriter>,
        sink: Arc<dyn TrackingSink>,
    ) -> Self {
        let widgets = resolve_capabilities(&catalog, &capabilities);
        let saved = layout::snapshot(&widgets, saved.as_ref(), &defaults);
        let mut dashboard = Self {
            catalog,
            capabilities,
            widgets,
            defaults,
            saved,
            placements: Vec::new(),
            grid: GridInteractionController::new(metrics),
            writer,
            sink,
        };
        dashboard.refresh();
        dashboard.emit_replaced(ChangeCause::Initial);
        dashboard
    }

    pub fn placements(&self) -> &[GridPlacement] {
        &self.placements
    }

    pub fn placement(&self, id: &str) -> Option<&GridPlacement> {
        self.placements.iter().find(|p| p.id == id)
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id() == id)
    }

    pub fn catalog(&self) -> &WidgetCatalog {
        &self.catalog
    }

    /// Tuples for every widget, hidden ones included
    pub fn saved_layout(&self) -> &SavedLayout {
        &self.saved
    }

    pub fn metrics(&self) -> &GridMetrics {
        self.grid.metrics()
    }

    pub fn is_editing(&self) -> bool {
        self.grid.is_editing()
    }

    pub fn set_editing(&mut self, editing: bool) {
        let tracked = self.grid.tracked_id().map(str::to_string);
        if let Some(origin) = self.grid.set_editing(editing)
            && let Some(id) = tracked
        {
            self.restore(&id, origin);
        }
    }

    /// Container resized or breakpoint changed
    pub fn set_metrics(&mut self, metrics: GridMetrics) {
        debug!(columns = metrics.columns, "Grid metrics changed");
        self.grid.set_metrics(metrics);
    }

    pub fn phase(&self) -> Phase {
        self.grid.phase()
    }

    /// Pointer-down on widget `id`
    pub fn pointer_down(&mut self, id: &str, event: &PointerEvent) -> Result<InteractionKind, Rejection> {
        let widget = self
            .widget(id)
            .ok_or_else(|| Rejection::UnknownWidget(id.to_string()))?;
        // Hidden widgets have no placement and cannot be edited
        let placement = self
            .placement(id)
            .ok_or_else(|| Rejection::UnknownWidget(id.to_string()))?;
        let (widget, placement) = (widget.clone(), placement.clone());

        self.grid.begin(&widget, &placement, event).inspect_err(|rejection| {
            debug!(widget = %id, %rejection, "Pointer-down rejected");
        })
    }

    /// Pointer-move; the snapped candidate is applied to the placement list live
    pub fn pointer_move(&mut self, event: &PointerEvent) -> Option<GridRect> {
        let id = self.grid.tracked_id()?.to_string();
        let rect = self.grid.update(event)?;
        if self.saved.get(&id).map(|t| t.grid_rect()) != Some(rect) {
            self.saved.upsert(&id, rect);
            self.refresh();
        }
        Some(rect)
    }

    /// Pointer-up (or pointer leaving the viewport): commit, persist and track
    pub fn pointer_up(&mut self) -> Option<GridCommit> {
        let commit = self.grid.end()?;
        self.saved.upsert(&commit.id, commit.rect);
        self.refresh();
        self.writer.submit(&self.saved);

        let coordinates = Coordinates {
            space: Space::Grid,
            x: i64::from(commit.rect.x),
            y: i64::from(commit.rect.y),
            w: commit.rect.w,
            h: commit.rect.h,
        };
        let id = commit.id.clone();
        let event = match commit.cause {
            ChangeCause::Resize => TrackingEvent::WidgetResized {
                id,
                coordinates,
                cause: commit.cause,
            },
            _ => TrackingEvent::WidgetMoved {
                id,
                coordinates,
                cause: commit.cause,
            },
        };
        self.sink.emit(&event);
        Some(commit)
    }

    /// Abandon the interaction in flight without saving
    pub fn pointer_cancel(&mut self) -> bool {
        let Some(id) = self.grid.tracked_id().map(str::to_string) else {
            return false;
        };
        match self.grid.cancel() {
            Some(origin) => {
                self.restore(&id, origin);
                true
            }
            None => false,
        }
    }

    /// Show or hide a widget; its saved tuple is kept so it reappears in place
    ///
    /// Applies to mandatory widgets too. The flag is session-local and never
    /// persisted, so a mandatory widget is visible again on the next load.
    pub fn toggle_visibility(&mut self, id: &str) -> Result<bool, Rejection> {
        self.cancel_if_tracking(id);
        let descriptor = self
            .catalog
            .get_mut(id)
            .ok_or_else(|| Rejection::UnknownWidget(id.to_string()))?;
        descriptor.is_visible = !descriptor.is_visible;
        let visible = descriptor.is_visible;

        self.rebuild_widgets();
        self.refresh();
        info!(widget = %id, visible, "Widget visibility toggled");
        self.sink.emit(&TrackingEvent::VisibilityChanged {
            id: id.to_string(),
            visible,
        });
        Ok(visible)
    }

    /// Remove a widget and its placement, then persist
    ///
    /// Refused for mandatory, locked, or delete-forbidden widgets, leaving every
    /// list untouched.
    pub fn delete_widget(&mut self, id: &str) -> Result<(), Rejection> {
        let widget = self
            .widget(id)
            .ok_or_else(|| Rejection::UnknownWidget(id.to_string()))?;
        if !widget.can_delete() {
            warn!(
                widget = %id,
                mandatory = widget.descriptor.is_mandatory,
                locked = widget.capability.is_locked,
                allow_delete = widget.capability.allow_delete,
                "Refusing to delete widget"
            );
            return Err(Rejection::NotDeletable(id.to_string()));
        }

        self.cancel_if_tracking(id);
        self.catalog.remove(id);
        self.saved.remove(id);
        self.rebuild_widgets();
        self.refresh();
        self.writer.submit(&self.saved);

        info!(widget = %id, remaining = self.widgets.len(), "Widget deleted");
        self.sink.emit(&TrackingEvent::WidgetRemoved { id: id.to_string() });
        Ok(())
    }

    /// Drop every saved override and re-derive placements from defaults, then persist
    pub fn reset_layout(&mut self) {
        self.cancel_any();
        self.saved = layout::snapshot(&self.widgets, None, &self.defaults);
        self.refresh();
        self.writer.submit(&self.saved);
        info!(widgets = self.placements.len(), "Layout reset to defaults");
        self.emit_replaced(ChangeCause::Initial);
    }

    /// Swap in an externally loaded layout without persisting it
    pub fn replace_layout(&mut self, saved: Option<SavedLayout>) {
        self.cancel_any();
        self.saved = layout::snapshot(&self.widgets, saved.as_ref(), &self.defaults);
        self.refresh();
        self.emit_replaced(ChangeCause::LayoutChange);
    }

    /// Apply a new capability table; interaction flags are re-derived
    pub fn apply_capabilities(&mut self, capabilities: CapabilityMap) {
        self.cancel_any();
        self.capabilities = capabilities;
        self.rebuild_widgets();
        self.refresh();
        debug!(records = self.capabilities.len(), "Capabilities applied");
    }

    /// Freeform editor seeded from the current grid placements
    pub fn freeform_editor(&self) -> FreeformInteractionController {
        let layout = FreeformLayout::from_grid(&self.placements, &self.widgets, self.grid.metrics());
        FreeformInteractionController::new(layout, &self.widgets, Arc::clone(&self.sink))
    }

    fn rebuild_widgets(&mut self) {
        self.widgets = resolve_capabilities(&self.catalog, &self.capabilities);
    }

    fn refresh(&mut self) {
        self.placements = layout::resolve(&self.widgets, Some(&self.saved), &self.defaults);
    }

    fn restore(&mut self, id: &str, origin: GridRect) {
        self.saved.upsert(id, origin);
        self.refresh();
    }

    fn cancel_if_tracking(&mut self, id: &str) {
        if self.grid.tracked_id() == Some(id) {
            self.pointer_cancel();
        }
    }

    fn cancel_any(&mut self) {
        self.pointer_cancel();
    }

    fn emit_replaced(&self, cause: ChangeCause) {
        self.sink.emit(&TrackingEvent::LayoutReplaced {
            cause,
            widgets: self.placements.len(),
        });
    }
}
