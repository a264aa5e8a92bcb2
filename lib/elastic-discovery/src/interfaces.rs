//! Address enumeration from the host's network interfaces

use crate::{AddressSource, DiscoveryError, Result};
use elastic_core::Candidate;
use std::net::IpAddr;
use sysinfo::Networks;
use tracing::debug;

/// Which interfaces to read addresses from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InterfaceScope {
    /// Only the loopback interface, where elastic IPs are usually bound
    #[default]
    LoopbackOnly,
    /// Every interface on the host
    All,
}

impl InterfaceScope {
    pub fn from_scan_all(scan_all_interfaces: bool) -> Self {
        if scan_all_interfaces {
            InterfaceScope::All
        } else {
            InterfaceScope::LoopbackOnly
        }
    }
}

/// Addresses configured on one interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceAddresses {
    pub name: String,
    pub addresses: Vec<(IpAddr, u8)>,
}

impl InterfaceAddresses {
    /// `lo`-style name, or carrying a loopback address
    pub fn is_loopback(&self) -> bool {
        self.name == "lo"
            || self.name == "lo0"
            || self.addresses.iter().any(|(addr, _)| addr.is_loopback())
    }
}

/// Reads interface addresses through `sysinfo`
#[derive(Clone, Copy, Debug, Default)]
pub struct InterfaceScanner {
    scope: InterfaceScope,
}

impl InterfaceScanner {
    pub fn new(scope: InterfaceScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> InterfaceScope {
        self.scope
    }

    /// Snapshot every interface and its addresses
    pub fn interfaces(&self) -> Vec<InterfaceAddresses> {
        let networks = Networks::new_with_refreshed_list();

        let mut interfaces: Vec<InterfaceAddresses> = networks
            .iter()
            .map(|(name, data)| InterfaceAddresses {
                name: name.clone(),
                addresses: data
                    .ip_networks()
                    .iter()
                    .map(|network| (network.addr, network.prefix))
                    .collect(),
            })
            .collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("Discovered {} network interfaces", interfaces.len());
        interfaces
    }

    /// Pick the candidates from a snapshot according to `scope`
    pub fn select(interfaces: &[InterfaceAddresses], scope: InterfaceScope) -> Result<Vec<Candidate>> {
        let selected: Vec<&InterfaceAddresses> = match scope {
            InterfaceScope::All => interfaces.iter().collect(),
            InterfaceScope::LoopbackOnly => {
                let loopback: Vec<&InterfaceAddresses> =
                    interfaces.iter().filter(|i| i.is_loopback()).collect();
                if loopback.is_empty() {
                    return Err(DiscoveryError::NoLoopbackInterface);
                }
                loopback
            }
        };

        let candidates: Vec<Candidate> = selected
            .into_iter()
            .flat_map(|interface| {
                debug!(
                    "Interface {} has {} addresses",
                    interface.name,
                    interface.addresses.len()
                );
                interface.addresses.iter().map(|&pair| Candidate::from(pair))
            })
            .collect();

        Ok(candidates)
    }
}

impl AddressSource for InterfaceScanner {
    fn candidates(&self) -> Result<Vec<Candidate>> {
        Self::select(&self.interfaces(), self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str, addresses: &[(&str, u8)]) -> InterfaceAddresses {
        InterfaceAddresses {
            name: name.to_string(),
            addresses: addresses
                .iter()
                .map(|(addr, len)| (addr.parse().unwrap(), *len))
                .collect(),
        }
    }

    fn snapshot() -> Vec<InterfaceAddresses> {
        vec![
            iface("eth0", &[("192.0.2.10", 24), ("fe80::1", 64)]),
            iface("lo", &[("127.0.0.1", 8), ("203.0.113.5", 32), ("::1", 128)]),
        ]
    }

    #[test]
    fn test_scope_from_flag() {
        assert_eq!(InterfaceScope::from_scan_all(true), InterfaceScope::All);
        assert_eq!(InterfaceScope::from_scan_all(false), InterfaceScope::LoopbackOnly);
    }

    #[test]
    fn test_loopback_detection() {
        assert!(iface("lo", &[]).is_loopback());
        assert!(iface("loopback0", &[("::1", 128)]).is_loopback());
        assert!(!iface("eth0", &[("192.0.2.10", 24)]).is_loopback());
    }

    #[test]
    fn test_select_loopback_only() {
        let candidates = InterfaceScanner::select(&snapshot(), InterfaceScope::LoopbackOnly).unwrap();
        let rendered: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
        assert_eq!(rendered, vec!["127.0.0.1/8", "203.0.113.5/32", "::1/128"]);
    }

    #[test]
    fn test_select_all() {
        let candidates = InterfaceScanner::select(&snapshot(), InterfaceScope::All).unwrap();
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].to_string(), "192.0.2.10/24");
    }

    #[test]
    fn test_select_without_loopback() {
        let interfaces = vec![iface("eth0", &[("192.0.2.10", 24)])];
        assert!(matches!(
            InterfaceScanner::select(&interfaces, InterfaceScope::LoopbackOnly),
            Err(DiscoveryError::NoLoopbackInterface)
        ));
    }
}
