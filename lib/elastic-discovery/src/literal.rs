//! Operator-supplied prefixes, used instead of interface enumeration

use crate::{AddressSource, DiscoveryError, Result};
use elastic_core::{Candidate, Prefix};

/// A fixed list of prefixes given in configuration.
///
/// Every literal is parsed up front; a bad one fails construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiteralSource {
    prefixes: Vec<Prefix>,
}

impl LiteralSource {
    pub fn new<I, S>(literals: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = literals
            .into_iter()
            .map(|literal| Prefix::parse(literal.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if prefixes.is_empty() {
            return Err(DiscoveryError::NoLiterals);
        }
        Ok(Self { prefixes })
    }

    pub fn prefixes(&self) -> &[Prefix] {
        &self.prefixes
    }
}

impl AddressSource for LiteralSource {
    fn candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.prefixes.iter().map(|&prefix| Candidate::from(prefix)).collect())
    }
}
