//! Peering configuration for the route servers

use crate::path::AddressFamily;
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Local autonomous system
pub const LOCAL_ASN: u32 = 65001;

/// Route-server autonomous system
pub const ROUTE_SERVER_ASN: u32 = 65000;

/// Router id; only needs to be unique towards the route servers
pub const ROUTER_ID: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

/// Speaker-wide settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GlobalConfig {
    pub asn: u32,
    pub router_id: Ipv4Addr,
    /// `None` disables the BGP listener; sessions are outbound only
    pub listen_port: Option<u16>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            asn: LOCAL_ASN,
            router_id: ROUTER_ID,
            listen_port: None,
        }
    }
}

/// Session timers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Timers {
    pub connect_retry: Duration,
    pub hold_time: Duration,
    pub keepalive_interval: Duration,
}

impl Default for Timers {
    fn default() -> Self {
        Self {
            connect_retry: Duration::from_secs(5),
            hold_time: Duration::from_secs(9),
            keepalive_interval: Duration::from_secs(3),
        }
    }
}

/// An eBGP multihop peering with one route server.
///
/// Everything is exported, nothing is imported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteServerPeer {
    pub neighbor_address: IpAddr,
    pub peer_asn: u32,
    pub description: String,
    pub multihop_ttl: u8,
    pub timers: Timers,
    pub families: Vec<AddressFamily>,
    pub export_accept: bool,
    pub import_accept: bool,
}

impl RouteServerPeer {
    pub fn new(neighbor_address: IpAddr) -> Self {
        Self {
            neighbor_address,
            peer_asn: ROUTE_SERVER_ASN,
            description: "route server".to_string(),
            multihop_ttl: 10,
            timers: Timers::default(),
            families: AddressFamily::all().to_vec(),
            export_accept: true,
            import_accept: false,
        }
    }
}
