//! Snapped drag and resize on the cell grid

use tracing::{debug, info};

use super::{EditablePlacement, InteractionKind, InteractionState, Phase, PointerEvent, gate};
use crate::error::Rejection;
use crate::snapping::{GridMetrics, snap_move, snap_resize};
use crate::tracking::ChangeCause;
use crate::types::{GridPlacement, GridRect, Widget};

/// Grid geometry plus the minimum span of the widget being edited
#[derive(Debug, Clone, Copy)]
pub struct GridSpace {
    pub metrics: GridMetrics,
    pub min_span: (u32, u32),
}

impl EditablePlacement for GridPlacement {
    type Space = GridSpace;

    fn widget_id(&self) -> &str {
        &self.id
    }

    fn dragged(&self, dx: i32, dy: i32, space: &GridSpace) -> Self {
        let rect = snap_move(
            self.rect(),
            space.metrics.columns_for(dx),
            space.metrics.rows_for(dy),
            space.metrics.columns,
        );
        with_rect(self, rect)
    }

    fn resized(&self, last: &Self, dw: i32, dh: i32, space: &GridSpace) -> Self {
        let rect = snap_resize(
            self.rect(),
            last.rect(),
            space.metrics.columns_for(dw),
            space.metrics.rows_for(dh),
            space.min_span,
            space.metrics.columns,
        );
        with_rect(self, rect)
    }
}

fn with_rect(placement: &GridPlacement, rect: GridRect) -> GridPlacement {
    GridPlacement {
        x: rect.x,
        y: rect.y,
        w: rect.w,
        h: rect.h,
        ..placement.clone()
    }
}

/// A finished grid interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCommit {
    pub id: String,
    pub origin: GridRect,
    pub rect: GridRect,
    pub cause: ChangeCause,
}

impl GridCommit {
    pub fn changed(&self) -> bool {
        self.origin != self.rect
    }
}

pub struct GridInteractionController {
    editing: bool,
    metrics: GridMetrics,
    state: InteractionState<GridPlacement>,
}

impl GridInteractionController {
    pub fn new(metrics: GridMetrics) -> Self {
        Self {
            editing: false,
            metrics,
            state: InteractionState::Idle,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Leaving edit mode drops any interaction in flight
    pub fn set_editing(&mut self, editing: bool) -> Option<GridRect> {
        self.editing = editing;
        if editing { None } else { self.cancel() }
    }

    pub fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    /// New container width or breakpoint; applies from the next interaction
    pub fn set_metrics(&mut self, metrics: GridMetrics) {
        self.metrics = metrics;
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_tracking(&self) -> bool {
        !self.state.is_idle()
    }

    /// Id of the widget under interaction
    pub fn tracked_id(&self) -> Option<&str> {
        self.state.active().map(|active| active.origin.id.as_str())
    }

    /// Pointer-down on `placement`
    pub fn begin(
        &mut self,
        widget: &Widget,
        placement: &GridPlacement,
        event: &PointerEvent,
    ) -> Result<InteractionKind, Rejection> {
        if widget.id() != placement.id {
            return Err(Rejection::UnknownWidget(placement.id.clone()));
        }
        if self.is_tracking() {
            return Err(Rejection::Busy);
        }
        let kind = gate(self.editing, event.target, widget.id(), &widget.capability)?;
        let space = GridSpace {
            metrics: self.metrics,
            min_span: (widget.descriptor.min_w, widget.descriptor.min_h),
        };
        self.state.begin(kind, placement.clone(), event, space)?;
        debug!(widget = %placement.id, ?kind, "Grid interaction started");
        Ok(kind)
    }

    /// Pointer-move; returns the snapped candidate rectangle
    pub fn update(&mut self, event: &PointerEvent) -> Option<GridRect> {
        self.state.update(event).map(GridPlacement::rect)
    }

    /// Pointer-up; returns the final rectangle to commit
    pub fn end(&mut self) -> Option<GridCommit> {
        let (kind, active) = self.state.finish()?;
        let commit = GridCommit {
            id: active.origin.id.clone(),
            origin: active.origin.rect(),
            rect: active.current.rect(),
            cause: kind.cause(),
        };
        info!(
            widget = %commit.id,
            cause = %commit.cause,
            x = commit.rect.x,
            y = commit.rect.y,
            w = commit.rect.w,
            h = commit.rect.h,
            "Grid interaction committed"
        );
        Some(commit)
    }

    /// Abandon the interaction, returning the rectangle to restore
    pub fn cancel(&mut self) -> Option<GridRect> {
        let (_, active) = self.state.finish()?;
        debug!(widget = %active.origin.id, "Grid interaction cancelled");
        Some(active.origin.rect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CapabilityRecord, WidgetDescriptor};

    fn metrics() -> GridMetrics {
        GridMetrics::new(1210, 12, 30, [10, 10], [10, 10])
    }

    fn widget(id: &str, capability: CapabilityRecord) -> Widget {
        Widget {
            descriptor: WidgetDescriptor::new(id, id, "test").with_min_span(2, 2),
            capability,
        }
    }

    fn placement(widget: &Widget, rect: GridRect) -> GridPlacement {
        GridPlacement::new(widget.id(), rect, &widget.capability)
    }

    fn editing() -> GridInteractionController {
        let mut controller = GridInteractionController::new(metrics());
        controller.set_editing(true);
        controller
    }

    #[test]
    fn test_drag_snaps_to_cells() {
        let w = widget("radio", CapabilityRecord::default());
        let p = placement(&w, GridRect::new(9, 5, 3, 6));
        let mut controller = editing();

        let kind = controller.begin(&w, &p, &PointerEvent::on_drag_handle(950, 300)).unwrap();
        assert_eq!(kind, InteractionKind::Drag);
        assert_eq!(controller.phase(), Phase::Dragging("radio".to_string()));

        // 6 columns left, 1 row down
        let candidate = controller.update(&PointerEvent::at(350, 340)).unwrap();
        assert_eq!(candidate, GridRect::new(3, 6, 3, 6));

        let commit = controller.end().unwrap();
        assert_eq!(commit.rect, GridRect::new(3, 6, 3, 6));
        assert_eq!(commit.origin, GridRect::new(9, 5, 3, 6));
        assert_eq!(commit.cause, ChangeCause::Drag);
        assert!(commit.changed());
        assert!(!controller.is_tracking());
    }

    #[test]
    fn test_resize_respects_min_span() {
        let w = widget("weather", CapabilityRecord::default());
        let p = placement(&w, GridRect::new(0, 5, 3, 6));
        let mut controller = editing();

        controller.begin(&w, &p, &PointerEvent::on_resize_handle(300, 500)).unwrap();
        assert_eq!(controller.update(&PointerEvent::at(400, 540)), Some(GridRect::new(0, 5, 4, 7)));
        // Would shrink to 1 column: width stays at the last candidate
        assert_eq!(controller.update(&PointerEvent::at(100, 540)), Some(GridRect::new(0, 5, 4, 7)));

        let commit = controller.end().unwrap();
        assert_eq!(commit.cause, ChangeCause::Resize);
        assert_eq!(commit.rect, GridRect::new(0, 5, 4, 7));
    }

    #[test]
    fn test_locked_widget_rejected_without_state_change() {
        let w = widget("deals", CapabilityRecord::locked());
        let p = placement(&w, GridRect::new(0, 0, 3, 3));
        let mut controller = editing();

        assert_eq!(
            controller.begin(&w, &p, &PointerEvent::on_drag_handle(0, 0)),
            Err(Rejection::NotDraggable("deals".to_string()))
        );
        assert_eq!(
            controller.begin(&w, &p, &PointerEvent::on_resize_handle(0, 0)),
            Err(Rejection::NotResizable("deals".to_string()))
        );
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn test_not_editing_rejected() {
        let w = widget("radio", CapabilityRecord::default());
        let p = placement(&w, GridRect::new(0, 0, 3, 3));
        let mut controller = GridInteractionController::new(metrics());

        assert_eq!(
            controller.begin(&w, &p, &PointerEvent::on_drag_handle(0, 0)),
            Err(Rejection::NotEditing)
        );
    }

    #[test]
    fn test_one_interaction_at_a_time() {
        let a = widget("a", CapabilityRecord::default());
        let b = widget("b", CapabilityRecord::default());
        let pa = placement(&a, GridRect::new(0, 0, 3, 3));
        let pb = placement(&b, GridRect::new(3, 0, 3, 3));
        let mut controller = editing();

        controller.begin(&a, &pa, &PointerEvent::on_drag_handle(0, 0)).unwrap();
        assert_eq!(
            controller.begin(&b, &pb, &PointerEvent::on_drag_handle(300, 0)),
            Err(Rejection::Busy)
        );
        assert_eq!(controller.tracked_id(), Some("a"));
    }

    #[test]
    fn test_leaving_edit_mode_cancels() {
        let w = widget("radio", CapabilityRecord::default());
        let p = placement(&w, GridRect::new(2, 2, 3, 3));
        let mut controller = editing();

        controller.begin(&w, &p, &PointerEvent::on_drag_handle(0, 0)).unwrap();
        controller.update(&PointerEvent::at(400, 0));
        assert_eq!(controller.set_editing(false), Some(GridRect::new(2, 2, 3, 3)));
        assert!(controller.end().is_none());
    }

    #[test]
    fn test_click_without_movement_commits_origin() {
        let w = widget("radio", CapabilityRecord::default());
        let p = placement(&w, GridRect::new(2, 2, 3, 3));
        let mut controller = editing();

        controller.begin(&w, &p, &PointerEvent::on_drag_handle(10, 10)).unwrap();
        let commit = controller.end().unwrap();
        assert!(!commit.changed());
        assert_eq!(commit.rect, GridRect::new(2, 2, 3, 3));
    }
}
