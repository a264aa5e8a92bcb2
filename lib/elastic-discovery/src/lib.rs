//! Host address sources for elastic address discovery
pub mod error;
pub mod interfaces;
pub mod literal;

pub use error::{DiscoveryError, Result};
pub use interfaces::{InterfaceAddresses, InterfaceScanner, InterfaceScope};
pub use literal::LiteralSource;

use elastic_core::Candidate;

/// Something that can list the addresses to classify
pub trait AddressSource {
    /// One bounded, non-blocking query of the current addresses
    fn candidates(&self) -> Result<Vec<Candidate>>;
}
