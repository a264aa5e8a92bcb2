//! Paths handed to the BGP engine

use crate::{BgpError, Result};
use elastic_core::{Announcement, Community, Family, Prefix};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

/// AFI/SAFI pair of a path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AddressFamily {
    Ipv4Unicast,
    Ipv6Unicast,
}

impl AddressFamily {
    pub fn of(prefix: &Prefix) -> Self {
        match prefix.family() {
            Family::Ipv4 => AddressFamily::Ipv4Unicast,
            Family::Ipv6 => AddressFamily::Ipv6Unicast,
        }
    }

    /// Both families a route-server peering carries
    pub fn all() -> [AddressFamily; 2] {
        [AddressFamily::Ipv4Unicast, AddressFamily::Ipv6Unicast]
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4Unicast => f.write_str("ipv4-unicast"),
            AddressFamily::Ipv6Unicast => f.write_str("ipv6-unicast"),
        }
    }
}

/// ORIGIN path attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Origin {
    Igp = 0,
    Egp = 1,
    /// Used for redistributed static routes
    Incomplete = 2,
}

/// A single path to announce
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Path {
    pub family: AddressFamily,
    pub prefix: Prefix,
    /// Empty lets the engine choose its own next hop
    pub next_hops: Vec<IpAddr>,
    pub origin: Origin,
    pub communities: Vec<Community>,
}

impl Path {
    /// Build the path for an announcement
    pub fn from_announcement(announcement: &Announcement) -> Result<Self> {
        let family = AddressFamily::of(&announcement.prefix);

        if let Some(next_hop) = announcement.next_hop {
            if next_hop.is_ipv4() != announcement.prefix.is_ipv4() {
                return Err(BgpError::NextHopFamily {
                    prefix: announcement.prefix.to_string(),
                    next_hop: next_hop.to_string(),
                });
            }
        }

        Ok(Self {
            family,
            prefix: announcement.prefix,
            next_hops: announcement.next_hop.into_iter().collect(),
            origin: Origin::Incomplete,
            communities: vec![announcement.community],
        })
    }
}
