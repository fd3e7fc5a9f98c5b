pub mod fs;
pub mod in_memory;

use crate::constants::canonical_province;
use crate::error::{AlertError, Result};
use crate::pipeline::ingestion::ThresholdTable;

pub use fs::FsThresholdStore;
pub use in_memory::InMemoryThresholdStore;

/// Where each province's seasonal threshold table lives.
///
/// Each province holds at most one table; importing replaces whatever was
/// there before.
pub trait ThresholdStore {
    /// Load the stored table for a province
    fn load(&self, province: &str) -> Result<ThresholdTable>;

    /// Store a table for a province, replacing any previous one. Returns a
    /// human-readable location of the stored table.
    fn import(&self, province: &str, table: &ThresholdTable) -> Result<String>;

    /// Whether a table is stored for the province
    fn contains(&self, province: &str) -> bool;
}

/// Canonical spelling of a known province, or `UnknownProvince`
pub fn resolve_province(name: &str) -> Result<&'static str> {
    canonical_province(name).ok_or_else(|| AlertError::UnknownProvince(name.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_province() {
        assert_eq!(resolve_province(" islamabad ").unwrap(), "Islamabad");
        assert!(matches!(resolve_province("Atlantis"), Err(AlertError::UnknownProvince(_))));
    }
}
