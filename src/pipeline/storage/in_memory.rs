use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{resolve_province, ThresholdStore};
use crate::error::{AlertError, Result};
use crate::pipeline::ingestion::ThresholdTable;

/// In-memory threshold store for development/testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryThresholdStore {
    tables: Arc<Mutex<HashMap<&'static str, ThresholdTable>>>,
}

impl InMemoryThresholdStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<&'static str, ThresholdTable>>> {
        self.tables
            .lock()
            .map_err(|_| AlertError::Config("threshold store lock poisoned".to_string()))
    }
}

impl ThresholdStore for InMemoryThresholdStore {
    fn load(&self, province: &str) -> Result<ThresholdTable> {
        let province = resolve_province(province)?;
        self.lock()?
            .get(province)
            .cloned()
            .ok_or_else(|| AlertError::ThresholdsNotFound {
                province: province.to_string(),
                path: format!("memory://{}", province).into(),
            })
    }

    fn import(&self, province: &str, table: &ThresholdTable) -> Result<String> {
        let province = resolve_province(province)?;
        self.lock()?.insert(province, table.clone());
        Ok(format!("memory://{}", province))
    }

    fn contains(&self, province: &str) -> bool {
        match (resolve_province(province), self.lock()) {
            (Ok(province), Ok(tables)) => tables.contains_key(province),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_replace() {
        let store = InMemoryThresholdStore::new();
        assert!(!store.contains("Sindh"));

        store.import("sindh", &ThresholdTable::default()).unwrap();
        assert!(store.contains("Sindh"));
        assert!(store.load("SINDH").unwrap().is_empty());
        assert!(matches!(store.load("AJK"), Err(AlertError::ThresholdsNotFound { .. })));
    }
}
