//! Pointer-driven editing
//!
//! - **grid**: snapped drag and resize on the cell grid
//! - **freeform**: pixel drag and resize with undo history
//! - **history**: linear snapshot history used by the freeform editor
//!
//! Both editors run the same state machine: `Idle` until a pointer-down on a
//! permitted handle, then `Dragging` or `Resizing` until pointer-up. The host is
//! expected to forward a pointer leaving the viewport as a pointer-up so an
//! interaction never stays attached.

pub mod freeform;
pub mod grid;
pub mod history;

use crate::error::Rejection;
use crate::tracking::ChangeCause;
use crate::types::CapabilityRecord;

pub use freeform::{FreeformCommit, FreeformInteractionController, FreeformLayout};
pub use grid::{GridCommit, GridInteractionController};
pub use history::LayoutHistory;

/// Which part of a widget the pointer went down on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    DragHandle,
    ResizeHandle,
    Body,
}

/// Pointer position in container pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    pub target: PointerTarget,
}

impl PointerEvent {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            target: PointerTarget::Body,
        }
    }

    pub fn on_drag_handle(x: i32, y: i32) -> Self {
        Self {
            target: PointerTarget::DragHandle,
            ..Self::at(x, y)
        }
    }

    pub fn on_resize_handle(x: i32, y: i32) -> Self {
        Self {
            target: PointerTarget::ResizeHandle,
            ..Self::at(x, y)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Drag,
    Resize,
}

impl InteractionKind {
    pub fn cause(&self) -> ChangeCause {
        match self {
            InteractionKind::Drag => ChangeCause::Drag,
            InteractionKind::Resize => ChangeCause::Resize,
        }
    }
}

/// Observable controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dragging(String),
    Resizing(String),
}

/// Decide whether a pointer-down may start an interaction
pub fn gate(
    editing: bool,
    target: PointerTarget,
    id: &str,
    capability: &CapabilityRecord,
) -> Result<InteractionKind, Rejection> {
    if !editing {
        return Err(Rejection::NotEditing);
    }
    match target {
        PointerTarget::DragHandle if capability.is_draggable() => Ok(InteractionKind::Drag),
        PointerTarget::DragHandle => Err(Rejection::NotDraggable(id.to_string())),
        PointerTarget::ResizeHandle if capability.is_resizable() => Ok(InteractionKind::Resize),
        PointerTarget::ResizeHandle => Err(Rejection::NotResizable(id.to_string())),
        PointerTarget::Body => Err(Rejection::NotAHandle),
    }
}

/// Geometry a controller can drag and resize
pub trait EditablePlacement: Clone {
    /// Whatever the geometry needs besides the pointer delta
    type Space: Clone + std::fmt::Debug;

    fn widget_id(&self) -> &str;

    /// `self` moved by a pixel delta
    fn dragged(&self, dx: i32, dy: i32, space: &Self::Space) -> Self;

    /// `self` resized by a pixel delta; `last` is the previous accepted candidate
    fn resized(&self, last: &Self, dw: i32, dh: i32, space: &Self::Space) -> Self;
}

/// An interaction in flight
#[derive(Debug, Clone)]
pub struct Active<P: EditablePlacement> {
    pub origin: P,
    pub current: P,
    start: (i32, i32),
    space: P::Space,
}

impl<P: EditablePlacement> Active<P> {
    fn new(origin: P, event: &PointerEvent, space: P::Space) -> Self {
        Self {
            current: origin.clone(),
            origin,
            start: (event.x, event.y),
            space,
        }
    }

    /// Pointer delta since pointer-down
    fn delta(&self, event: &PointerEvent) -> (i32, i32) {
        (event.x.saturating_sub(self.start.0), event.y.saturating_sub(self.start.1))
    }
}

/// Shared Idle / Dragging / Resizing state machine
#[derive(Debug, Clone)]
pub enum InteractionState<P: EditablePlacement> {
    Idle,
    Dragging(Active<P>),
    Resizing(Active<P>),
}

impl<P: EditablePlacement> Default for InteractionState<P> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<P: EditablePlacement> InteractionState<P> {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Dragging(active) => Phase::Dragging(active.origin.widget_id().to_string()),
            Self::Resizing(active) => Phase::Resizing(active.origin.widget_id().to_string()),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn active(&self) -> Option<&Active<P>> {
        match self {
            Self::Idle => None,
            Self::Dragging(active) | Self::Resizing(active) => Some(active),
        }
    }

    /// Attach to `origin`; only one interaction at a time
    pub fn begin(
        &mut self,
        kind: InteractionKind,
        origin: P,
        event: &PointerEvent,
        space: P::Space,
    ) -> Result<(), Rejection> {
        if !self.is_idle() {
            return Err(Rejection::Busy);
        }
        let active = Active::new(origin, event, space);
        *self = match kind {
            InteractionKind::Drag => Self::Dragging(active),
            InteractionKind::Resize => Self::Resizing(active),
        };
        Ok(())
    }

    /// Recompute the candidate from the total pointer delta since pointer-down
    pub fn update(&mut self, event: &PointerEvent) -> Option<&P> {
        match self {
            Self::Idle => None,
            Self::Dragging(active) => {
                let (dx, dy) = active.delta(event);
                active.current = active.origin.dragged(dx, dy, &active.space);
                Some(&active.current)
            }
            Self::Resizing(active) => {
                let (dw, dh) = active.delta(event);
                active.current = active.origin.resized(&active.current, dw, dh, &active.space);
                Some(&active.current)
            }
        }
    }

    /// Detach, handing back what was tracked
    pub fn finish(&mut self) -> Option<(InteractionKind, Active<P>)> {
        match std::mem::replace(self, Self::Idle) {
            Self::Idle => None,
            Self::Dragging(active) => Some((InteractionKind::Drag, active)),
            Self::Resizing(active) => Some((InteractionKind::Resize, active)),
        }
    }
}
