//! BGP community tags and their assignment to eligible prefixes

use crate::aggregator::EligibleSet;
use crate::{CoreError, Prefix, Result};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A standard 32-bit BGP community, written `high:low`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Community(u32);

impl Community {
    /// Tag for the primary announcer of an address
    pub const PRIMARY: Community = Community::new(65000, 1);
    /// Tag for the standby announcer of an address
    pub const SECONDARY: Community = Community::new(65000, 2);

    pub const fn new(high: u16, low: u16) -> Self {
        Self(((high as u32) << 16) | low as u32)
    }

    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn high(self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub fn low(self) -> u16 {
        (self.0 & 0xffff) as u16
    }
}

impl FromStr for Community {
    type Err = CoreError;

    /// `65000:1` becomes `65000 * 65536 + 1`. The names `primary` and
    /// `secondary` stand for [`Community::PRIMARY`] and [`Community::SECONDARY`].
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => return Ok(Community::PRIMARY),
            "secondary" => return Ok(Community::SECONDARY),
            _ => {}
        }

        let invalid = |reason: &str| CoreError::InvalidCommunity {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (high, low) = s.trim().split_once(':').ok_or_else(|| invalid("expected high:low"))?;
        let high: u16 = high.parse().map_err(|_| invalid("high part is not a 16-bit number"))?;
        let low: u16 = low.parse().map_err(|_| invalid("low part is not a 16-bit number"))?;

        Ok(Community::new(high, low))
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.high(), self.low())
    }
}

impl Serialize for Community {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Community {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// A prefix that survived discovery, optionally tagged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EligibleAddress {
    pub prefix: Prefix,
    pub community: Option<Community>,
}

impl EligibleAddress {
    /// Turn into an announcement, falling back to `default` when untagged
    pub fn into_announcement(self, default: Community) -> Announcement {
        Announcement {
            prefix: self.prefix,
            next_hop: None,
            community: self.community.unwrap_or(default),
        }
    }
}

/// What the BGP engine is asked to announce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub prefix: Prefix,
    /// `None` lets the engine pick its own next hop
    pub next_hop: Option<IpAddr>,
    pub community: Community,
}

/// Operator-requested prefixes and their tags, keyed by canonical prefix
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommunityMap {
    entries: BTreeMap<String, Community>,
}

impl CommunityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse operator literals. Any bad prefix or community fails the whole map.
    pub fn parse<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut map = Self::new();
        for (prefix, community) in entries {
            map.insert(Prefix::parse(prefix)?, community.parse()?);
        }
        Ok(map)
    }

    pub fn insert(&mut self, prefix: Prefix, community: Community) {
        self.entries.insert(prefix.network().to_string(), community);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, prefix: &Prefix) -> Option<Community> {
        self.entries.get(&prefix.network().to_string()).copied()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Attach communities to the eligible set.
///
/// With an empty map every prefix passes untagged. Otherwise only mapped
/// prefixes pass, and every mapped prefix must have been observed.
pub fn assign_communities(set: &EligibleSet, map: &CommunityMap) -> Result<Vec<EligibleAddress>> {
    if map.is_empty() {
        return Ok(set
            .prefixes()
            .into_iter()
            .map(|prefix| EligibleAddress { prefix, community: None })
            .collect());
    }

    let tagged: Vec<EligibleAddress> = set
        .prefixes()
        .into_iter()
        .filter_map(|prefix| {
            map.get(&prefix).map(|community| EligibleAddress {
                prefix,
                community: Some(community),
            })
        })
        .collect();

    if tagged.len() < map.len() {
        return Err(CoreError::CommunityMismatch {
            requested: map.keys(),
            observed: set.keys(),
        });
    }

    Ok(tagged)
}

/// Resolve every address to an announcement, untagged ones get `default`
pub fn with_default_community(addresses: Vec<EligibleAddress>, default: Community) -> Vec<Announcement> {
    addresses
        .into_iter()
        .map(|address| address.into_announcement(default))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::diagnostics::NoopDiagnostics;

    fn p(s: &str) -> Prefix {
        Prefix::parse(s).expect("valid prefix")
    }

    fn observed(prefixes: &[&str]) -> EligibleSet {
        let mut aggregator = Aggregator::new(NoopDiagnostics);
        for prefix in prefixes {
            aggregator.insert(p(prefix));
        }
        aggregator.finish().unwrap()
    }

    fn map(entries: &[(&str, &str)]) -> CommunityMap {
        let owned: BTreeMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CommunityMap::parse(&owned).unwrap()
    }

    #[test]
    fn test_community_parse() {
        let community: Community = "65000:1".parse().unwrap();
        assert_eq!(community.as_u32(), 4_259_840_001);
        assert_eq!(community, Community::new(65000, 1));
        assert_eq!(community.to_string(), "65000:1");
    }

    #[test]
    fn test_community_role_names() {
        assert_eq!("primary".parse::<Community>().unwrap(), Community::PRIMARY);
        assert_eq!("Secondary".parse::<Community>().unwrap(), Community::SECONDARY);
        assert_eq!(Community::SECONDARY.to_string(), "65000:2");
    }

    #[test]
    fn test_community_parse_errors() {
        assert!("65000".parse::<Community>().is_err());
        assert!("a:1".parse::<Community>().is_err());
        assert!("65000:x".parse::<Community>().is_err());
        assert!("65536:0".parse::<Community>().is_err());
        assert!("1:70000".parse::<Community>().is_err());
    }

    #[test]
    fn test_community_text_round_trips() {
        for text in ["0:0", "1:65535", "65535:65535", "65000:7"] {
            let community: Community = text.parse().unwrap();
            assert_eq!(community.to_string(), text);
        }
    }

    #[test]
    fn test_empty_map_passes_everything_untagged() {
        let set = observed(&["203.0.113.5/32", "198.51.100.1/32"]);
        let addresses = assign_communities(&set, &CommunityMap::new()).unwrap();

        assert_eq!(addresses.len(), 2);
        assert!(addresses.iter().all(|a| a.community.is_none()));

        let announcements = with_default_community(addresses, Community::new(65000, 2));
        assert!(announcements
            .iter()
            .all(|a| a.community == Community::new(65000, 2) && a.next_hop.is_none()));
    }

    #[test]
    fn test_map_filters_to_requested() {
        let set = observed(&["203.0.113.5/32", "198.51.100.1/32"]);
        let addresses = assign_communities(&set, &map(&[("203.0.113.5/32", "primary")])).unwrap();

        assert_eq!(
            addresses,
            vec![EligibleAddress {
                prefix: p("203.0.113.5/32"),
                community: Some(Community::PRIMARY),
            }]
        );
    }

    #[test]
    fn test_map_keys_are_canonicalized() {
        let set = observed(&["2001:db8:abcd:1234::/64"]);
        let addresses =
            assign_communities(&set, &map(&[("2001:db8:abcd:1234::1/64", "65000:2")])).unwrap();
        assert_eq!(addresses.len(), 1);
    }

    #[test]
    fn test_missing_requested_prefix_is_mismatch() {
        let set = observed(&["203.0.113.5/32"]);
        let err = assign_communities(
            &set,
            &map(&[("203.0.113.5/32", "65000:1"), ("192.0.2.1/32", "65000:1")]),
        )
        .unwrap_err();

        match err {
            CoreError::CommunityMismatch { requested, observed } => {
                assert_eq!(requested, vec!["192.0.2.1/32", "203.0.113.5/32"]);
                assert_eq!(observed, vec!["203.0.113.5/32"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_bad_literal_fails_map() {
        let mut entries = BTreeMap::new();
        entries.insert("203.0.113.5".to_string(), "65000:1".to_string());
        assert!(matches!(CommunityMap::parse(&entries), Err(CoreError::Prefix(_))));

        let mut entries = BTreeMap::new();
        entries.insert("203.0.113.5/32".to_string(), "gold".to_string());
        assert!(matches!(
            CommunityMap::parse(&entries),
            Err(CoreError::InvalidCommunity { .. })
        ));
    }
}
