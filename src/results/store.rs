//! Latest completed result per test type

use std::collections::HashMap;

use crate::core::test_type::TestType;
use crate::results::collector::CombinedResult;

/// One slot per test type; a completed run replaces its slot wholesale
#[derive(Debug, Default, Clone)]
pub struct ResultStore {
    latest: HashMap<TestType, CombinedResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot of `test_type`, returning the previous result
    pub fn replace(&mut self, test_type: TestType, result: CombinedResult) -> Option<CombinedResult> {
        self.latest.insert(test_type, result)
    }

    pub fn latest(&self, test_type: TestType) -> Option<&CombinedResult> {
        self.latest.get(&test_type)
    }

    pub fn clear(&mut self, test_type: TestType) -> Option<CombinedResult> {
        self.latest.remove(&test_type)
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(yy: f64) -> CombinedResult {
        CombinedResult {
            yy_strain: vec![yy],
            ..Default::default()
        }
    }

    #[test]
    fn test_replace_does_not_merge() {
        let mut store = ResultStore::new();
        assert!(store.replace(TestType::Triaxial, result(1.0)).is_none());
        let previous = store.replace(TestType::Triaxial, result(2.0));
        assert_eq!(previous, Some(result(1.0)));
        assert_eq!(store.latest(TestType::Triaxial), Some(&result(2.0)));
    }

    #[test]
    fn test_slots_are_per_test_type() {
        let mut store = ResultStore::new();
        store.replace(TestType::Crs, result(3.0));
        assert!(store.latest(TestType::Triaxial).is_none());
        assert_eq!(store.latest(TestType::Crs).unwrap().yy_strain, vec![3.0]);
        store.clear(TestType::Crs);
        assert!(store.is_empty());
    }
}
