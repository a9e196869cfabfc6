//! Change tracking sinks
//!
//! The engine emits structured events fire-and-forget; a sink never feeds back
//! into engine state.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::info;

use crate::constants::cause;

/// Why a placement or layout changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeCause {
    Drag,
    Resize,
    Initial,
    LayoutChange,
}

impl ChangeCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCause::Drag => cause::DRAG,
            ChangeCause::Resize => cause::RESIZE,
            ChangeCause::Initial => cause::INITIAL,
            ChangeCause::LayoutChange => cause::LAYOUT_CHANGE,
        }
    }
}

impl fmt::Display for ChangeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate space of reported coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    Grid,
    Pixel,
}

/// Final coordinates of a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coordinates {
    pub space: Space,
    pub x: i64,
    pub y: i64,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum TrackingEvent {
    WidgetMoved {
        id: String,
        coordinates: Coordinates,
        cause: ChangeCause,
    },
    WidgetResized {
        id: String,
        coordinates: Coordinates,
        cause: ChangeCause,
    },
    LayoutReplaced {
        cause: ChangeCause,
        widgets: usize,
    },
    WidgetRemoved {
        id: String,
    },
    VisibilityChanged {
        id: String,
        visible: bool,
    },
}

impl TrackingEvent {
    pub fn cause(&self) -> Option<ChangeCause> {
        match self {
            TrackingEvent::WidgetMoved { cause, .. }
            | TrackingEvent::WidgetResized { cause, .. }
            | TrackingEvent::LayoutReplaced { cause, .. } => Some(*cause),
            TrackingEvent::WidgetRemoved { .. } | TrackingEvent::VisibilityChanged { .. } => None,
        }
    }
}

/// Receives tracking events; injected at construction
pub trait TrackingSink: Send + Sync {
    fn emit(&self, event: &TrackingEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TrackingSink for NoopSink {
    fn emit(&self, _event: &TrackingEvent) {}
}

/// Writes each event as a structured log record
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TrackingSink for TracingSink {
    fn emit(&self, event: &TrackingEvent) {
        match serde_json::to_string(event) {
            Ok(json) => info!(target: "dashgrid::tracking", event = %json, "tracking"),
            Err(_) => info!(target: "dashgrid::tracking", event = ?event, "tracking"),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TrackingEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrackingEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn take(&self) -> Vec<TrackingEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl TrackingSink for RecordingSink {
    fn emit(&self, event: &TrackingEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
