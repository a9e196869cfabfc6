//! Widget catalog and the designer-authored default position table
//!
//! Both ship with a built-in version and can be replaced by JSON files
//! (`catalog_path` / `defaults_path` in the config).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::types::{GridRect, WidgetDescriptor};

/// Ordered list of every widget type known to the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetCatalog {
    pub widgets: Vec<WidgetDescriptor>,
}

impl WidgetCatalog {
    /// Build a catalog, dropping duplicate ids (first occurrence wins)
    pub fn new(widgets: Vec<WidgetDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let widgets = widgets
            .into_iter()
            .filter(|w| {
                let fresh = seen.insert(w.id.clone());
                if !fresh {
                    warn!(widget = %w.id, "Duplicate widget id in catalog, ignoring later entry");
                }
                fresh
            })
            .collect();
        Self { widgets }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            WidgetDescriptor::new("search", "Search", "tools")
                .with_description("Web search bar")
                .mandatory(),
            WidgetDescriptor::new("weather", "Weather", "information")
                .with_description("Local forecast")
                .with_min_span(2, 3),
            WidgetDescriptor::new("breaking-news", "Breaking News", "news")
                .with_description("Latest headlines")
                .with_min_span(3, 3),
            WidgetDescriptor::new("radio", "Radio", "entertainment")
                .with_description("Live radio streams")
                .with_min_span(2, 2),
            WidgetDescriptor::new("deals", "Deals", "shopping")
                .with_description("Today's offers"),
            WidgetDescriptor::new("currency", "Currency", "finance")
                .with_description("Exchange rates"),
        ])
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let parsed: WidgetCatalog = serde_json::from_str(contents).context("Failed to parse widget catalog")?;
        Ok(Self::new(parsed.widgets))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read widget catalog from {}", path.display()))?;
        let catalog = Self::from_json(&contents)?;
        info!(path = %path.display(), widgets = catalog.len(), "Loaded widget catalog");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&WidgetDescriptor> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut WidgetDescriptor> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<WidgetDescriptor> {
        let index = self.widgets.iter().position(|w| w.id == id)?;
        Some(self.widgets.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WidgetDescriptor> {
        self.widgets.iter()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

/// Versioned map of widget id to its designed grid rectangle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultPositionTable {
    #[serde(default = "default_table_version")]
    pub version: u32,
    pub positions: BTreeMap<String, GridRect>,
}

fn default_table_version() -> u32 {
    1
}

impl Default for DefaultPositionTable {
    fn default() -> Self {
        Self {
            version: default_table_version(),
            positions: BTreeMap::new(),
        }
    }
}

impl DefaultPositionTable {
    /// Search across the top, a 3:6:3 weather/news/radio triad, deals and currency beneath
    pub fn builtin() -> Self {
        let positions = [
            ("search", GridRect::new(0, 0, 12, 5)),
            ("weather", GridRect::new(0, 5, 3, 6)),
            ("breaking-news", GridRect::new(3, 5, 6, 6)),
            ("radio", GridRect::new(9, 5, 3, 6)),
            ("deals", GridRect::new(0, 11, 6, 4)),
            ("currency", GridRect::new(6, 11, 6, 4)),
        ];
        Self {
            version: default_table_version(),
            positions: positions.into_iter().map(|(id, rect)| (id.to_string(), rect)).collect(),
        }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, GridRect)>,
        S: Into<String>,
    {
        Self {
            version: default_table_version(),
            positions: entries.into_iter().map(|(id, rect)| (id.into(), rect)).collect(),
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse default position table")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read default positions from {}", path.display()))?;
        let table = Self::from_json(&contents)?;
        info!(path = %path.display(), version = table.version, entries = table.positions.len(), "Loaded default position table");
        Ok(table)
    }

    pub fn get(&self, id: &str) -> Option<GridRect> {
        self.positions.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_defaults_for_every_widget() {
        let catalog = WidgetCatalog::builtin();
        let table = DefaultPositionTable::builtin();
        for widget in catalog.iter() {
            assert!(table.get(&widget.id).is_some(), "missing default for {}", widget.id);
        }
    }

    #[test]
    fn test_builtin_triad_is_3_6_3() {
        let table = DefaultPositionTable::builtin();
        let spans: Vec<u32> = ["weather", "breaking-news", "radio"]
            .iter()
            .map(|id| table.get(id).unwrap().w)
            .collect();
        assert_eq!(spans, vec![3, 6, 3]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = WidgetCatalog::new(vec![
            WidgetDescriptor::new("radio", "Radio", "a"),
            WidgetDescriptor::new("radio", "Other Radio", "b"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("radio").unwrap().name, "Radio");
    }

    #[test]
    fn test_catalog_from_json_defaults() {
        let catalog = WidgetCatalog::from_json(r#"{"widgets":[{"id":"clock","name":"Clock"}]}"#).unwrap();
        let clock = catalog.get("clock").unwrap();
        assert!(clock.is_visible);
        assert!(!clock.is_mandatory);
        assert_eq!(clock.min_w, 1);
    }

    #[test]
    fn test_position_table_from_json() {
        let table = DefaultPositionTable::from_json(
            r#"{"version":3,"positions":{"weather":{"x":0,"y":5,"w":3,"h":6}}}"#,
        )
        .unwrap();
        assert_eq!(table.version, 3);
        assert_eq!(table.get("weather"), Some(GridRect::new(0, 5, 3, 6)));
        assert_eq!(table.get("radio"), None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"{"widgets":[{"id":"a","name":"A"},{"id":"b","name":"B"}]}"#).unwrap();

        let catalog = WidgetCatalog::load(&path).unwrap();
        let ids: Vec<_> = catalog.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_remove_widget() {
        let mut catalog = WidgetCatalog::builtin();
        assert!(catalog.remove("radio").is_some());
        assert!(catalog.get("radio").is_none());
        assert!(catalog.remove("radio").is_none());
    }
}
