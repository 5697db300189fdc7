use std::collections::HashSet;

use yelp_core::RecordKind;

use crate::types::{IngestError, Result};

/// Accumulates accepted business ids while the business pass runs.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    ids: HashSet<String>,
    duplicates: u64,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the id was already present.
    pub fn insert(&mut self, id: String) -> bool {
        let inserted = self.ids.insert(id);
        if !inserted {
            self.duplicates += 1;
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn freeze(self) -> BusinessIndex {
        BusinessIndex { ids: self.ids }
    }
}

/// Frozen set of accepted business ids consulted by the dependent passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessIndex {
    ids: HashSet<String>,
}

impl BusinessIndex {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for BusinessIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// The index a dependent pass needs, or `PrecedesDependency` when the
/// business pass has not completed yet.
pub fn require_index(index: Option<&BusinessIndex>, kind: RecordKind) -> Result<&BusinessIndex> {
    index.ok_or(IngestError::PrecedesDependency { kind })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_deduplicates_ids() {
        let mut builder = IndexBuilder::new();
        assert!(builder.insert("b1".to_string()));
        assert!(builder.insert("b2".to_string()));
        assert!(!builder.insert("b1".to_string()));
        assert_eq!(builder.len(), 2);
        assert_eq!(builder.duplicates(), 1);
        let index = builder.freeze();
        assert!(index.contains("b1"));
        assert!(!index.contains("b3"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn dependent_pass_without_index_fails() {
        let err = require_index(None, RecordKind::Review).expect_err("missing index");
        assert!(matches!(
            err,
            IngestError::PrecedesDependency {
                kind: RecordKind::Review
            }
        ));
        let index: BusinessIndex = ["b1"].into_iter().collect();
        assert!(require_index(Some(&index), RecordKind::Tip).is_ok());
    }
}
