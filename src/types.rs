//! Data model shared by the resolver, the interaction controllers and persistence
//!
//! Only [`SavedLayout`] crosses the persistence boundary. Interaction flags on
//! [`GridPlacement`] are always re-derived from the current [`CapabilityRecord`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{freeform, grid};

/// Stable widget identity, unique within a catalog
pub type WidgetId = String;

/// Catalog entry describing one widget type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDescriptor {
    pub id: WidgetId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,

    /// Mandatory widgets can never be deleted
    #[serde(default)]
    pub is_mandatory: bool,

    /// User toggle, independent of deletion
    #[serde(default = "default_visible")]
    pub is_visible: bool,

    /// Widget-type specific settings, opaque to the engine
    #[serde(default)]
    pub settings: Value,

    /// Smallest column span a resize may produce
    #[serde(default = "default_min_span")]
    pub min_w: u32,

    /// Smallest row span a resize may produce
    #[serde(default = "default_min_span")]
    pub min_h: u32,

    /// Pixel clamps used by the freeform editor
    #[serde(default)]
    pub size_limits: SizeLimits,
}

fn default_visible() -> bool {
    true
}

fn default_min_span() -> u32 {
    grid::MIN_SPAN
}

impl WidgetDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            description: String::new(),
            is_mandatory: false,
            is_visible: true,
            settings: Value::Null,
            min_w: grid::MIN_SPAN,
            min_h: grid::MIN_SPAN,
            size_limits: SizeLimits::default(),
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.is_mandatory = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_min_span(mut self, min_w: u32, min_h: u32) -> Self {
        self.min_w = min_w.max(grid::MIN_SPAN);
        self.min_h = min_h.max(grid::MIN_SPAN);
        self
    }
}

/// Pixel size clamps for the freeform editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizeLimits {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min_width: freeform::DEFAULT_MIN_WIDTH,
            min_height: freeform::DEFAULT_MIN_HEIGHT,
            max_width: freeform::DEFAULT_MAX_WIDTH,
            max_height: freeform::DEFAULT_MAX_HEIGHT,
        }
    }
}

/// Administrator-controlled permission set for one widget
///
/// Missing fields in an administrator payload fall back to the permissive default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilityRecord {
    pub allow_resize: bool,
    pub allow_drag: bool,
    pub allow_delete: bool,
    pub is_locked: bool,
}

impl Default for CapabilityRecord {
    fn default() -> Self {
        Self {
            allow_resize: true,
            allow_drag: true,
            allow_delete: true,
            is_locked: false,
        }
    }
}

impl CapabilityRecord {
    pub fn locked() -> Self {
        Self {
            is_locked: true,
            ..Self::default()
        }
    }

    pub fn is_draggable(&self) -> bool {
        self.allow_drag && !self.is_locked
    }

    pub fn is_resizable(&self) -> bool {
        self.allow_resize && !self.is_locked
    }

    /// A locked widget is always static
    pub fn is_static(&self) -> bool {
        !self.is_draggable() || self.is_locked
    }
}

/// A catalog widget paired with its effective capability record
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub descriptor: WidgetDescriptor,
    pub capability: CapabilityRecord,
}

impl Widget {
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// Deletion requires the admin permission and an unlocked, non-mandatory widget
    pub fn can_delete(&self) -> bool {
        self.capability.allow_delete && !self.descriptor.is_mandatory && !self.capability.is_locked
    }
}

/// Cell-space rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Resolved grid position of one visible widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPlacement {
    #[serde(rename = "i")]
    pub id: WidgetId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub is_draggable: bool,
    pub is_resizable: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
}

impl GridPlacement {
    pub fn new(id: impl Into<String>, rect: GridRect, capability: &CapabilityRecord) -> Self {
        Self {
            id: id.into(),
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            is_draggable: capability.is_draggable(),
            is_resizable: capability.is_resizable(),
            is_static: capability.is_static(),
        }
    }

    pub fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }
}

/// Pixel-space placement used by the freeform editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeformPlacement {
    pub id: WidgetId,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl FreeformPlacement {
    pub fn new(id: impl Into<String>, x: i32, y: i32, width: u32, height: u32, limits: SizeLimits) -> Self {
        let mut placement = Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            min_width: limits.min_width,
            min_height: limits.min_height,
            max_width: limits.max_width.max(limits.min_width),
            max_height: limits.max_height.max(limits.min_height),
        };
        placement.width = placement.clamp_width(width);
        placement.height = placement.clamp_height(height);
        placement
    }

    pub fn clamp_width(&self, width: u32) -> u32 {
        width.clamp(self.min_width, self.max_width)
    }

    pub fn clamp_height(&self, height: u32) -> u32 {
        height.clamp(self.min_height, self.max_height)
    }
}

/// One persisted `{i, x, y, w, h}` tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPlacement {
    #[serde(rename = "i", alias = "id")]
    pub id: WidgetId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl SavedPlacement {
    pub fn new(id: impl Into<String>, rect: GridRect) -> Self {
        Self {
            id: id.into(),
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
        }
    }

    pub fn grid_rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }
}

/// Ordered list of persisted tuples, the only layout data that is ever stored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedLayout(pub Vec<SavedPlacement>);

impl SavedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&SavedPlacement> {
        self.0.iter().find(|p| p.id == id)
    }

    /// Replace the tuple for `id` in place, or append it
    pub fn upsert(&mut self, id: &str, rect: GridRect) {
        match self.0.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = SavedPlacement::new(id, rect),
            None => self.0.push(SavedPlacement::new(id, rect)),
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|p| p.id != id);
        self.0.len() != before
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedPlacement> {
        self.0.iter()
    }
}

impl FromIterator<SavedPlacement> for SavedLayout {
    fn from_iter<T: IntoIterator<Item = SavedPlacement>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&[GridPlacement]> for SavedLayout {
    fn from(placements: &[GridPlacement]) -> Self {
        placements
            .iter()
            .map(|p| SavedPlacement::new(p.id.clone(), p.rect()))
            .collect()
    }
}
