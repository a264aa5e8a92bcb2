//! Address + prefix length value type

use crate::PrefixError;
use ipnetwork::IpNetwork;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Address family of a [`Prefix`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    /// Bit width of an address in this family
    pub fn max_len(self) -> u8 {
        match self {
            Family::Ipv4 => 32,
            Family::Ipv6 => 128,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Octets {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl Octets {
    fn as_slice(&self) -> &[u8] {
        match self {
            Octets::V4(b) => b,
            Octets::V6(b) => b,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Octets::V4(b) => b,
            Octets::V6(b) => b,
        }
    }
}

/// An address together with a prefix length.
///
/// The stored address keeps whatever host bits it was built with. Equality
/// compares the raw address bytes and the length, so `10.0.0.1/8` and
/// `10.0.0.0/8` are different values; use [`Prefix::network`] to compare
/// networks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix {
    pub(crate) octets: Octets,
    pub(crate) len: u8,
}

impl Prefix {
    /// Build a prefix from an address and a length
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, PrefixError> {
        let octets = match addr {
            IpAddr::V4(a) => Octets::V4(a.octets()),
            IpAddr::V6(a) => Octets::V6(a.octets()),
        };
        let prefix = Self { octets, len };
        if len > prefix.max_len() {
            return Err(PrefixError::LengthOutOfRange {
                len,
                max: prefix.max_len(),
            });
        }
        Ok(prefix)
    }

    /// Parse `address/length` text. A bare address is rejected.
    pub fn parse(text: &str) -> Result<Self, PrefixError> {
        let text = text.trim();
        if !text.contains('/') {
            return Err(PrefixError::MissingLength(text.to_string()));
        }

        let network = IpNetwork::from_str(text).map_err(|e| PrefixError::Invalid {
            input: text.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self::from(network))
    }

    pub fn family(&self) -> Family {
        match self.octets {
            Octets::V4(_) => Family::Ipv4,
            Octets::V6(_) => Family::Ipv6,
        }
    }

    pub fn is_ipv4(&self) -> bool {
        self.family() == Family::Ipv4
    }

    pub fn is_ipv6(&self) -> bool {
        self.family() == Family::Ipv6
    }

    pub fn prefix_len(&self) -> u8 {
        self.len
    }

    pub fn max_len(&self) -> u8 {
        self.family().max_len()
    }

    /// The stored address, host bits included
    pub fn addr(&self) -> IpAddr {
        match self.octets {
            Octets::V4(b) => IpAddr::V4(Ipv4Addr::from(b)),
            Octets::V6(b) => IpAddr::V6(Ipv6Addr::from(b)),
        }
    }

    /// Raw address bytes: 4 for IPv4, 16 for IPv6
    pub fn octets(&self) -> &[u8] {
        self.octets.as_slice()
    }

    pub(crate) fn octets_mut(&mut self) -> &mut [u8] {
        self.octets.as_mut_slice()
    }

    /// Same length with all host bits cleared
    pub fn network(&self) -> Self {
        let mut network = *self;
        clear_host_bits(network.octets_mut(), self.len);
        network
    }

    /// Re-mask the address to `len` bits, clearing everything past the new boundary
    pub fn with_len(&self, len: u8) -> Result<Self, PrefixError> {
        if len > self.max_len() {
            return Err(PrefixError::LengthOutOfRange {
                len,
                max: self.max_len(),
            });
        }
        let mut remasked = *self;
        remasked.len = len;
        Ok(remasked.network())
    }

    /// Read bits `[from, to)` of the address as an unsigned integer,
    /// most significant bit first. `None` if the range is empty, reversed,
    /// wider than 128 bits or past the end of the address.
    pub fn bits(&self, from: u8, to: u8) -> Option<u128> {
        if from >= to || to > self.max_len() {
            return None;
        }
        let value = self
            .octets()
            .iter()
            .fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
        let width = u32::from(to - from);
        let shifted = value >> u32::from(self.max_len() - to);
        if width >= 128 {
            Some(shifted)
        } else {
            Some(shifted & ((1u128 << width) - 1))
        }
    }
}

fn clear_host_bits(bytes: &mut [u8], len: u8) {
    let len = usize::from(len);
    for (i, byte) in bytes.iter_mut().enumerate() {
        let first_bit = i * 8;
        if first_bit >= len {
            *byte = 0;
        } else if first_bit + 8 > len {
            let keep = len - first_bit;
            *byte &= 0xffu8 << (8 - keep);
        }
    }
}

impl From<IpNetwork> for Prefix {
    fn from(network: IpNetwork) -> Self {
        let octets = match network {
            IpNetwork::V4(n) => Octets::V4(n.ip().octets()),
            IpNetwork::V6(n) => Octets::V6(n.ip().octets()),
        };
        Self {
            octets,
            len: network.prefix(),
        }
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.len)
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prefix({})", self)
    }
}

impl Serialize for Prefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Prefix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Prefix::parse(&text).map_err(de::Error::custom)
    }
}
