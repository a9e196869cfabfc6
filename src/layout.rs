//! Layout resolution
//!
//! Produces the authoritative grid placement list from the capability-augmented
//! catalog, the user's saved layout and the default position table.
//! Priority per widget: saved tuple > default table entry > synthesized from
//! catalog index. Interaction flags always come from the current capability record.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::catalog::DefaultPositionTable;
use crate::constants::grid::{SYNTH_PER_ROW, SYNTH_ROW_STRIDE, SYNTH_SPAN};
use crate::types::{GridPlacement, GridRect, SavedLayout, Widget};

/// Where a resolved rectangle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSource {
    Saved,
    Default,
    Synthesized,
}

/// Placement for a widget with neither a saved nor a default entry
pub fn synthesize(index: usize) -> GridRect {
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    GridRect::new(
        (index % SYNTH_PER_ROW) * SYNTH_SPAN,
        (index / SYNTH_PER_ROW).saturating_mul(SYNTH_ROW_STRIDE),
        SYNTH_SPAN,
        SYNTH_SPAN,
    )
}

/// Resolve one widget's rectangle
pub fn resolve_rect(
    index: usize,
    id: &str,
    saved: Option<&SavedLayout>,
    defaults: &DefaultPositionTable,
) -> (GridRect, PositionSource) {
    if let Some(tuple) = saved.and_then(|layout| layout.get(id)) {
        if tuple.w > 0 && tuple.h > 0 {
            return (tuple.grid_rect(), PositionSource::Saved);
        }
        warn!(widget = %id, w = tuple.w, h = tuple.h, "Ignoring saved placement with empty span");
    }

    if let Some(rect) = defaults.get(id) {
        return (rect, PositionSource::Default);
    }

    (synthesize(index), PositionSource::Synthesized)
}

/// Merge defaults, saved overrides and capabilities into grid placements
///
/// Pure and deterministic: the same inputs always produce the same output.
/// Exactly one placement is produced per visible widget, in catalog order.
pub fn resolve(widgets: &[Widget], saved: Option<&SavedLayout>, defaults: &DefaultPositionTable) -> Vec<GridPlacement> {
    let mut seen = HashSet::with_capacity(widgets.len());
    let mut placements = Vec::with_capacity(widgets.len());

    for (index, widget) in widgets.iter().enumerate() {
        if !seen.insert(widget.id()) {
            continue;
        }
        if !widget.descriptor.is_visible {
            continue;
        }

        let (rect, source) = resolve_rect(index, widget.id(), saved, defaults);
        debug!(widget = %widget.id(), ?source, x = rect.x, y = rect.y, w = rect.w, h = rect.h, "Resolved placement");
        placements.push(GridPlacement::new(widget.id(), rect, &widget.capability));
    }

    placements
}

/// Saved layout covering every widget, hidden ones included
///
/// Hidden widgets keep their tuple so re-showing them restores the last position.
pub fn snapshot(widgets: &[Widget], saved: Option<&SavedLayout>, defaults: &DefaultPositionTable) -> SavedLayout {
    let mut layout = SavedLayout::new();
    for (index, widget) in widgets.iter().enumerate() {
        if layout.get(widget.id()).is_some() {
            continue;
        }
        let (rect, _) = resolve_rect(index, widget.id(), saved, defaults);
        layout.upsert(widget.id(), rect);
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityMap, resolve_capabilities};
    use crate::catalog::WidgetCatalog;
    use crate::types::{CapabilityRecord, SavedPlacement, WidgetDescriptor};
    use proptest::prelude::*;

    fn triad_catalog() -> WidgetCatalog {
        WidgetCatalog::new(vec![
            WidgetDescriptor::new("weather", "Weather", "information"),
            WidgetDescriptor::new("breaking-news", "Breaking News", "news"),
            WidgetDescriptor::new("radio", "Radio", "entertainment"),
        ])
    }

    fn triad_defaults() -> DefaultPositionTable {
        DefaultPositionTable::from_entries([
            ("weather", GridRect::new(0, 5, 3, 6)),
            ("breaking-news", GridRect::new(3, 5, 6, 6)),
            ("radio", GridRect::new(9, 5, 3, 6)),
        ])
    }

    #[test]
    fn test_default_layout_scenario() {
        let widgets = resolve_capabilities(&triad_catalog(), &CapabilityMap::new());
        let placements = resolve(&widgets, None, &triad_defaults());

        let rects: Vec<_> = placements.iter().map(|p| (p.id.as_str(), p.rect())).collect();
        assert_eq!(
            rects,
            vec![
                ("weather", GridRect::new(0, 5, 3, 6)),
                ("breaking-news", GridRect::new(3, 5, 6, 6)),
                ("radio", GridRect::new(9, 5, 3, 6)),
            ]
        );
        for p in &placements {
            assert!(p.is_draggable);
            assert!(p.is_resizable);
            assert!(!p.is_static);
        }
    }

    #[test]
    fn test_saved_override_wins() {
        let widgets = resolve_capabilities(&triad_catalog(), &CapabilityMap::new());
        let saved = SavedLayout(vec![SavedPlacement::new("weather", GridRect::new(1, 1, 4, 4))]);
        let placements = resolve(&widgets, Some(&saved), &triad_defaults());

        assert_eq!(placements[0].rect(), GridRect::new(1, 1, 4, 4));
        assert_eq!(placements[1].rect(), GridRect::new(3, 5, 6, 6));
        assert_eq!(placements[2].rect(), GridRect::new(9, 5, 3, 6));
    }

    #[test]
    fn test_locked_widget_scenario() {
        let records = CapabilityMap::from([(
            "radio".to_string(),
            CapabilityRecord {
                allow_drag: true,
                allow_resize: true,
                allow_delete: true,
                is_locked: true,
            },
        )]);
        let widgets = resolve_capabilities(&triad_catalog(), &records);
        let placements = resolve(&widgets, None, &triad_defaults());
        let radio = placements.iter().find(|p| p.id == "radio").unwrap();

        assert!(!radio.is_draggable);
        assert!(!radio.is_resizable);
        assert!(radio.is_static);
    }

    #[test]
    fn test_synthesized_positions_follow_index() {
        assert_eq!(synthesize(0), GridRect::new(0, 0, 3, 3));
        assert_eq!(synthesize(3), GridRect::new(9, 0, 3, 3));
        assert_eq!(synthesize(4), GridRect::new(0, 4, 3, 3));
        assert_eq!(synthesize(9), GridRect::new(3, 8, 3, 3));
    }

    #[test]
    fn test_widget_without_default_is_synthesized() {
        let mut catalog = triad_catalog();
        catalog.widgets.push(WidgetDescriptor::new("clock", "Clock", "tools"));
        let widgets = resolve_capabilities(&catalog, &CapabilityMap::new());
        let placements = resolve(&widgets, None, &triad_defaults());

        let clock = placements.iter().find(|p| p.id == "clock").unwrap();
        assert_eq!(clock.rect(), GridRect::new(9, 0, 3, 3));
    }

    #[test]
    fn test_hidden_widget_has_no_placement() {
        let mut catalog = triad_catalog();
        catalog.get_mut("radio").unwrap().is_visible = false;
        let widgets = resolve_capabilities(&catalog, &CapabilityMap::new());
        let placements = resolve(&widgets, None, &triad_defaults());

        assert_eq!(placements.len(), 2);
        assert!(placements.iter().all(|p| p.id != "radio"));
    }

    #[test]
    fn test_saved_tuples_for_unknown_widgets_are_dropped() {
        let widgets = resolve_capabilities(&triad_catalog(), &CapabilityMap::new());
        let saved = SavedLayout(vec![SavedPlacement::new("ghost", GridRect::new(0, 0, 2, 2))]);
        let placements = resolve(&widgets, Some(&saved), &triad_defaults());
        assert_eq!(placements.len(), 3);
        assert!(placements.iter().all(|p| p.id != "ghost"));
    }

    #[test]
    fn test_empty_span_saved_tuple_falls_back_to_default() {
        let widgets = resolve_capabilities(&triad_catalog(), &CapabilityMap::new());
        let saved = SavedLayout(vec![SavedPlacement::new("weather", GridRect::new(4, 4, 0, 3))]);
        let placements = resolve(&widgets, Some(&saved), &triad_defaults());
        assert_eq!(placements[0].rect(), GridRect::new(0, 5, 3, 6));
    }

    #[test]
    fn test_snapshot_keeps_hidden_widgets() {
        let mut catalog = triad_catalog();
        catalog.get_mut("radio").unwrap().is_visible = false;
        let widgets = resolve_capabilities(&catalog, &CapabilityMap::new());
        let snapshot = snapshot(&widgets, None, &triad_defaults());

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get("radio").unwrap().grid_rect(), GridRect::new(9, 5, 3, 6));
    }

    fn arb_widgets() -> impl Strategy<Value = Vec<Widget>> {
        prop::collection::vec(("[a-e]{1,2}", any::<bool>(), any::<bool>(), any::<bool>()), 0..12).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(id, visible, locked, allow_drag)| {
                    let mut descriptor = WidgetDescriptor::new(id.clone(), id, "test");
                    descriptor.is_visible = visible;
                    Widget {
                        descriptor,
                        capability: CapabilityRecord {
                            allow_drag,
                            is_locked: locked,
                            ..CapabilityRecord::default()
                        },
                    }
                })
                .collect()
        })
    }

    fn arb_saved() -> impl Strategy<Value = Option<SavedLayout>> {
        prop::option::of(
            prop::collection::vec(("[a-e]{1,2}", 0u32..12, 0u32..20, 0u32..6, 0u32..6), 0..8).prop_map(|tuples| {
                tuples
                    .into_iter()
                    .map(|(id, x, y, w, h)| SavedPlacement::new(id, GridRect::new(x, y, w, h)))
                    .collect()
            }),
        )
    }

    proptest! {
        #[test]
        fn prop_resolve_is_idempotent(widgets in arb_widgets(), saved in arb_saved()) {
            let defaults = DefaultPositionTable::from_entries([("a", GridRect::new(0, 0, 2, 2))]);
            let first = resolve(&widgets, saved.as_ref(), &defaults);
            let second = resolve(&widgets, saved.as_ref(), &defaults);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_one_placement_per_visible_widget(widgets in arb_widgets(), saved in arb_saved()) {
            let defaults = DefaultPositionTable::default();
            let placements = resolve(&widgets, saved.as_ref(), &defaults);

            let mut seen = HashSet::new();
            let mut expected: Vec<&str> = Vec::new();
            for widget in &widgets {
                if seen.insert(widget.id()) && widget.descriptor.is_visible {
                    expected.push(widget.id());
                }
            }
            let ids: Vec<&str> = placements.iter().map(|p| p.id.as_str()).collect();
            prop_assert_eq!(ids, expected);
        }

        #[test]
        fn prop_locked_implies_static(widgets in arb_widgets()) {
            let placements = resolve(&widgets, None, &DefaultPositionTable::default());
            for placement in &placements {
                let widget = widgets.iter().find(|w| w.id() == placement.id).unwrap();
                if widget.capability.is_locked {
                    prop_assert!(placement.is_static);
                }
            }
        }
    }
}
