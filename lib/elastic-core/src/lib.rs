//! Elastic address discovery and prefix arithmetic
//!
//! This library provides:
//! - `Prefix`, an address + prefix length value with explicit family
//! - Subnet placement (`Prefix::subnet`, `Prefix::subnet_raw`)
//! - Classification of host addresses into announceable prefixes
//! - Aggregation of accepted prefixes into a canonical set
//! - Community tagging of the final set
//! - Route-server neighbor address derivation

pub mod aggregator;
pub mod classifier;
pub mod community;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod neighbor;
pub mod prefix;
pub mod subnet;

pub use aggregator::{Aggregator, EligibleSet};
pub use classifier::{
    classify, AggregationWidth, Candidate, Classifier, ClassifierConfig, RejectReason, Verdict,
};
pub use community::{
    assign_communities, with_default_community, Announcement, Community, CommunityMap,
    EligibleAddress,
};
pub use diagnostics::{Diagnostics, NoopDiagnostics, RecordingDiagnostics, TracingDiagnostics};
pub use error::{CoreError, PrefixError, Result, SubnetError};
pub use metrics::MetricsDiagnostics;
pub use neighbor::{neighbor_address, neighbor_addresses, DEFAULT_NEIGHBOR_BASE};
pub use prefix::{Family, Prefix};
pub use subnet::human_hex_lift;
