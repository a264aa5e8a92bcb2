//! Boundary to the external BGP engine
//!
//! This library provides:
//! - `Path`, the announcement shape handed to the engine
//! - `RouteServerPeer` and `GlobalConfig`, the peering settings
//! - The `BgpSpeaker` capability and a logging `DryRunSpeaker`

pub mod error;
pub mod path;
pub mod peer;
pub mod speaker;

pub use error::{BgpError, Result};
pub use path::{AddressFamily, Origin, Path};
pub use peer::{GlobalConfig, RouteServerPeer, Timers};
pub use speaker::{announce_all, establish_peerings, BgpSpeaker, DryRunSpeaker, SpeakerCall};
