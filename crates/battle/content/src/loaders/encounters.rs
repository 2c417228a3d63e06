//! Encounter table loader.

use std::path::Path;

use crate::encounters::EncounterTable;
use crate::loaders::{LoadResult, read_file};

/// Loader for encounter tables from RON files.
pub struct EncounterLoader;

impl EncounterLoader {
    /// Load an encounter table from a RON file.
    ///
    /// Every biome tier must reference monster types that exist in the
    /// table's `monsters` section.
    pub fn load(path: &Path) -> LoadResult<EncounterTable> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EncounterTable> {
        let table: EncounterTable = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse encounter table RON: {}", e))?;
        table.validate()?;
        Ok(table)
    }
}
