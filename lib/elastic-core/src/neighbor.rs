//! Route-server neighbor addresses derived from a base prefix

use crate::{CoreError, Prefix, Result};

/// Base the production route servers are numbered from
pub const DEFAULT_NEIGHBOR_BASE: &str = "2600:3c0f::/32";

/// Fixed /64 group holding the route servers of every datacenter
pub const NEIGHBOR_GROUP: u32 = 34;

/// Route servers per datacenter
pub const ROUTE_SERVERS_PER_DC: u32 = 4;

/// Address of route server `sequence` in datacenter `datacenter_id`.
///
/// With the default base, datacenter 14 sequence 1 is `2600:3c0f:14:34::1/128`.
pub fn neighbor_address(base: &Prefix, datacenter_id: u32, sequence: u32) -> Result<Prefix> {
    let neighbor = base
        .subnet(48, datacenter_id)?
        .subnet(64, NEIGHBOR_GROUP)?
        .subnet(128, sequence)?;
    Ok(neighbor)
}

/// All route-server addresses of a datacenter, sequence 1 through 4
pub fn neighbor_addresses(base: &Prefix, datacenter_id: u32) -> Result<Vec<Prefix>> {
    if datacenter_id <= 1 {
        return Err(CoreError::InvalidDatacenter(datacenter_id));
    }

    (1..=ROUTE_SERVERS_PER_DC)
        .map(|sequence| neighbor_address(base, datacenter_id, sequence))
        .collect()
}
