//! Capability resolution: administrator records merged over permissive defaults

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::catalog::WidgetCatalog;
use crate::error::StoreError;
use crate::types::{CapabilityRecord, Widget};

/// Administrator-supplied capability records keyed by widget id
pub type CapabilityMap = HashMap<String, CapabilityRecord>;

/// Source of administrator capability records
pub trait CapabilitySource {
    fn fetch(&self) -> Result<CapabilityMap, StoreError>;
}

/// Fixed records, used for tests and for running without an admin service
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities(pub CapabilityMap);

impl CapabilitySource for StaticCapabilities {
    fn fetch(&self) -> Result<CapabilityMap, StoreError> {
        Ok(self.0.clone())
    }
}

/// Pair every catalog widget with a capability record
///
/// Absent records fall back to the permissive default; absence is not failure.
pub fn resolve_capabilities(catalog: &WidgetCatalog, records: &CapabilityMap) -> Vec<Widget> {
    catalog
        .iter()
        .map(|descriptor| Widget {
            descriptor: descriptor.clone(),
            capability: records.get(&descriptor.id).copied().unwrap_or_default(),
        })
        .collect()
}

/// Built-in table used when the capability source is unreachable
///
/// Every widget gets full permissions, except that mandatory widgets are not deletable.
pub fn fallback_capabilities(catalog: &WidgetCatalog) -> CapabilityMap {
    catalog
        .iter()
        .map(|descriptor| {
            let record = CapabilityRecord {
                allow_delete: !descriptor.is_mandatory,
                ..CapabilityRecord::default()
            };
            (descriptor.id.clone(), record)
        })
        .collect()
}

/// Fetch records from `source`, substituting the built-in table on failure
pub fn fetch_or_fallback(source: &dyn CapabilitySource, catalog: &WidgetCatalog) -> CapabilityMap {
    match source.fetch() {
        Ok(records) => {
            debug!(records = records.len(), "Fetched capability records");
            records
        }
        Err(e) => {
            warn!(error = %e, "Capability source unavailable, using built-in permissions");
            fallback_capabilities(catalog)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WidgetDescriptor;

    struct FailingSource;

    impl CapabilitySource for FailingSource {
        fn fetch(&self) -> Result<CapabilityMap, StoreError> {
            Err(StoreError::Status { status: 503 })
        }
    }

    fn catalog() -> WidgetCatalog {
        WidgetCatalog::new(vec![
            WidgetDescriptor::new("search", "Search", "tools").mandatory(),
            WidgetDescriptor::new("radio", "Radio", "entertainment"),
        ])
    }

    #[test]
    fn test_missing_record_uses_default() {
        let widgets = resolve_capabilities(&catalog(), &CapabilityMap::new());
        assert_eq!(widgets.len(), 2);
        for widget in &widgets {
            assert_eq!(widget.capability, CapabilityRecord::default());
        }
    }

    #[test]
    fn test_record_overrides_default() {
        let records = CapabilityMap::from([("radio".to_string(), CapabilityRecord::locked())]);
        let widgets = resolve_capabilities(&catalog(), &records);
        let radio = widgets.iter().find(|w| w.id() == "radio").unwrap();
        assert!(radio.capability.is_locked);
    }

    #[test]
    fn test_records_for_unknown_widgets_are_ignored() {
        let records = CapabilityMap::from([("ghost".to_string(), CapabilityRecord::locked())]);
        let widgets = resolve_capabilities(&catalog(), &records);
        assert!(widgets.iter().all(|w| w.id() != "ghost"));
    }

    #[test]
    fn test_failure_substitutes_fallback_table() {
        let records = fetch_or_fallback(&FailingSource, &catalog());
        assert!(!records["search"].allow_delete);
        assert!(records["radio"].allow_delete);
        assert!(records.values().all(|r| r.allow_drag && r.allow_resize && !r.is_locked));
    }

    #[test]
    fn test_static_source_passthrough() {
        let source = StaticCapabilities(CapabilityMap::from([("radio".to_string(), CapabilityRecord::locked())]));
        let records = fetch_or_fallback(&source, &catalog());
        assert_eq!(records.len(), 1);
        assert!(records["radio"].is_locked);
    }
}
