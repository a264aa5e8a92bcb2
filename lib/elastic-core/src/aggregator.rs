//! Canonicalization and de-duplication of accepted prefixes

use crate::diagnostics::Diagnostics;
use crate::{CoreError, Prefix, Result};
use std::collections::BTreeMap;

/// Eligible prefixes keyed by their canonical `address/length` string.
///
/// Every stored prefix has its host bits cleared. Iteration follows the
/// key order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EligibleSet {
    prefixes: BTreeMap<String, Prefix>,
}

impl EligibleSet {
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Look up by canonical string
    pub fn get(&self, key: &str) -> Option<&Prefix> {
        self.prefixes.get(key)
    }

    pub fn contains(&self, prefix: &Prefix) -> bool {
        self.prefixes.contains_key(&prefix.network().to_string())
    }

    pub fn keys(&self) -> Vec<String> {
        self.prefixes.keys().cloned().collect()
    }

    pub fn prefixes(&self) -> Vec<Prefix> {
        self.prefixes.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Prefix)> {
        self.prefixes.iter()
    }
}

/// Builds an [`EligibleSet`] one accepted prefix at a time
pub struct Aggregator<D> {
    set: EligibleSet,
    diagnostics: D,
}

impl<D: Diagnostics> Aggregator<D> {
    pub fn new(diagnostics: D) -> Self {
        Self {
            set: EligibleSet::default(),
            diagnostics,
        }
    }

    /// Canonicalize `prefix` and add it unless an equal network is present
    pub fn insert(&mut self, prefix: Prefix) {
        let canonical = prefix.network();
        let key = canonical.to_string();

        if self.set.prefixes.contains_key(&key) {
            self.diagnostics.collapsed(&prefix, &canonical);
            return;
        }

        self.diagnostics.accepted(&canonical);
        self.set.prefixes.insert(key, canonical);
    }

    /// Hand out the collected set; empty is an error
    pub fn finish(self) -> Result<EligibleSet> {
        if self.set.is_empty() {
            return Err(CoreError::NoEligibleAddresses);
        }
        Ok(self.set)
    }
}
