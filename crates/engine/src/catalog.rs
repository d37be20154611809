//! Static `(block id, metadata) → name` table.
//!
//! Loaded once from a JSON resource (an array of `{item_id, metadata, name}`
//! records) and passed by reference to every classification call. Lookups
//! never fail: unknown pairs fall back to metadata 0, then to a synthesized
//! placeholder name.

use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::XrayError;
use crate::world::block::BlockId;

/// One row of the catalog resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCatalogEntry {
    pub item_id: u16,
    pub metadata: u16,
    pub name: String,
}

impl BlockCatalogEntry {
    pub fn new(item_id: u16, metadata: u16, name: impl Into<String>) -> Self {
        Self {
            item_id,
            metadata,
            name: name.into(),
        }
    }

    fn key(&self) -> (u16, u16) {
        (self.item_id, self.metadata)
    }
}

/// Immutable id/metadata naming table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<BlockCatalogEntry>,
    index: HashMap<(u16, u16), usize>,
}

impl Catalog {
    /// Build a catalog from in-memory entries. Duplicate keys are rejected.
    pub fn from_entries(
        entries: impl IntoIterator<Item = BlockCatalogEntry>,
        source_name: &str,
    ) -> Result<Self, XrayError> {
        let mut catalog = Self::default();
        for entry in entries {
            match catalog.index.entry(entry.key()) {
                Entry::Occupied(existing) => {
                    let first = &catalog.entries[*existing.get()];
                    return Err(XrayError::Configuration {
                        source_name: source_name.to_string(),
                        reason: format!(
                            "duplicate entry {}:{} ({:?} and {:?})",
                            entry.item_id, entry.metadata, first.name, entry.name
                        ),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(catalog.entries.len());
                    catalog.entries.push(entry);
                }
            }
        }
        Ok(catalog)
    }

    /// Parse the JSON resource format.
    pub fn from_json_str(text: &str, source_name: &str) -> Result<Self, XrayError> {
        let entries: Vec<BlockCatalogEntry> =
            serde_json::from_str(text).map_err(|e| XrayError::Configuration {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_entries(entries, source_name)
    }

    /// Read and parse the catalog resource at `path`.
    pub fn load(path: &Path) -> Result<Self, XrayError> {
        let source_name = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| XrayError::Configuration {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_json_str(&text, &source_name)?;
        tracing::debug!("Loaded {} catalog entries from {}", catalog.len(), source_name);
        Ok(catalog)
    }

    /// Build a catalog from the item mappings the NationsGUI mod prints into
    /// the Forge client log. Lines that are not mappings are ignored; for a
    /// key seen twice the first name wins.
    pub fn from_forge_log<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        for line in lines {
            let Some(entry) = parse_hdv_mapping(line.as_ref()) else {
                continue;
            };
            if let Entry::Vacant(slot) = catalog.index.entry(entry.key()) {
                slot.insert(catalog.entries.len());
                catalog.entries.push(entry);
            }
        }
        catalog
    }

    /// Serialize back into the resource format.
    pub fn to_json_string(&self) -> Result<String, XrayError> {
        serde_json::to_string_pretty(&self.entries).map_err(|e| XrayError::Configuration {
            source_name: "in-memory catalog".to_string(),
            reason: e.to_string(),
        })
    }

    /// Strict lookup, no fallback.
    pub fn name_of(&self, id: BlockId, metadata: u16) -> Option<&str> {
        self.index
            .get(&(id.0, metadata))
            .map(|&i| self.entries[i].name.as_str())
    }

    /// Name for `(id, metadata)`: exact match, then metadata 0, then a
    /// placeholder embedding both values.
    pub fn resolve_name(&self, id: BlockId, metadata: u16) -> Cow<'_, str> {
        self.name_of(id, metadata)
            .or_else(|| self.name_of(id, 0))
            .map(Cow::Borrowed)
            .unwrap_or_else(|| Cow::Owned(unknown_block_name(id, metadata)))
    }

    /// Entries in resource order.
    pub fn entries(&self) -> impl Iterator<Item = &BlockCatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Placeholder used for ids the catalog does not know.
pub fn unknown_block_name(id: BlockId, metadata: u16) -> String {
    format!("Unknown Block (ID: {}, Data: {})", id, metadata)
}

static HDV_MAPPING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[NationsGUI\] HDV Mappings: Item: (\d+):(\d+) - Category: ([a-f0-9-]+) - Name: (.+)",
    )
    .unwrap()
});

fn parse_hdv_mapping(line: &str) -> Option<BlockCatalogEntry> {
    let caps = HDV_MAPPING.captures(line)?;
    let item_id = caps[1].parse().ok()?;
    let metadata = caps[2].parse().ok()?;
    let name = caps[4].trim();
    if name.is_empty() {
        return None;
    }
    Some(BlockCatalogEntry::new(item_id, metadata, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone_catalog() -> Catalog {
        Catalog::from_json_str(
            r#"[
                {"item_id": 1, "metadata": 0, "name": "Stone"},
                {"item_id": 35, "metadata": 14, "name": "Red Wool"},
                {"item_id": 35, "metadata": 0, "name": "White Wool"}
            ]"#,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_exact_match() {
        let catalog = stone_catalog();
        assert_eq!(catalog.resolve_name(BlockId(35), 14), "Red Wool");
        assert_eq!(catalog.resolve_name(BlockId(1), 0), "Stone");
    }

    #[test]
    fn test_metadata_zero_fallback() {
        let catalog = stone_catalog();
        assert_eq!(catalog.resolve_name(BlockId(35), 3), "White Wool");
        assert_eq!(catalog.name_of(BlockId(35), 3), None);
    }

    #[test]
    fn test_unknown_placeholder() {
        let catalog = stone_catalog();
        let name = catalog.resolve_name(BlockId(4000), 7);
        assert_eq!(name, "Unknown Block (ID: 4000, Data: 7)");
        assert!(name.contains("4000") && name.contains('7'));
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        let err = Catalog::from_json_str("{not json", "broken.json").unwrap_err();
        assert!(matches!(err, XrayError::Configuration { ref source_name, .. } if source_name == "broken.json"));
    }

    #[test]
    fn test_missing_field_is_configuration_error() {
        let err = Catalog::from_json_str(r#"[{"item_id": 1, "name": "Stone"}]"#, "t").unwrap_err();
        assert!(matches!(err, XrayError::Configuration { .. }));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = Catalog::from_json_str(
            r#"[{"item_id": 1, "metadata": 0, "name": "Stone"},
                {"item_id": 1, "metadata": 0, "name": "Rock"}]"#,
            "t",
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate entry 1:0"));
    }

    #[test]
    fn test_shared_names_allowed() {
        let catalog = Catalog::from_entries(
            [
                BlockCatalogEntry::new(17, 0, "Wood"),
                BlockCatalogEntry::new(17, 1, "Wood"),
            ],
            "t",
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load(Path::new("/definitely/not/here/ids.json")).unwrap_err();
        assert!(matches!(err, XrayError::Configuration { .. }));
    }

    #[test]
    fn test_forge_log_import() {
        let lines = [
            "[12:00:01] [Client thread/INFO] [NationsGUI] HDV Mappings: Item: 4097:2 - Category: 0f3a-bc12 - Name: Uranium Ore  ",
            "[12:00:01] [Client thread/INFO] unrelated line",
            "[12:00:02] [NationsGUI] HDV Mappings: Item: 4097:2 - Category: 0f3a-bc12 - Name: Uranium Ore",
            "[12:00:02] [NationsGUI] HDV Mappings: Item: 49:0 - Category: ffff - Name: Obsidian",
        ];
        let catalog = Catalog::from_forge_log(lines);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name_of(BlockId(4097), 2), Some("Uranium Ore"));
        assert_eq!(catalog.name_of(BlockId(49), 0), Some("Obsidian"));

        let json = catalog.to_json_string().unwrap();
        let reloaded = Catalog::from_json_str(&json, "roundtrip").unwrap();
        assert_eq!(reloaded.entries().collect::<Vec<_>>(), catalog.entries().collect::<Vec<_>>());
    }
}
