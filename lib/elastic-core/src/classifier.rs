//! Elastic address classification
//!
//! Decides, for every address reported by the host, whether it may be
//! announced and at which prefix length.

use crate::aggregator::{Aggregator, EligibleSet};
use crate::diagnostics::Diagnostics;
use crate::{CoreError, Prefix, PrefixError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Target prefix length for IPv6 announcements
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AggregationWidth {
    Slash56,
    #[default]
    Slash64,
}

impl AggregationWidth {
    pub fn prefix_len(self) -> u8 {
        match self {
            AggregationWidth::Slash56 => 56,
            AggregationWidth::Slash64 => 64,
        }
    }
}

impl TryFrom<u8> for AggregationWidth {
    type Error = CoreError;

    fn try_from(len: u8) -> Result<Self> {
        match len {
            56 => Ok(AggregationWidth::Slash56),
            64 => Ok(AggregationWidth::Slash64),
            other => Err(CoreError::InvalidWidth(other)),
        }
    }
}

impl From<AggregationWidth> for u8 {
    fn from(width: AggregationWidth) -> u8 {
        width.prefix_len()
    }
}

/// Classifier settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub width: AggregationWidth,
    /// Also drop RFC 1918 and unique-local addresses
    pub reject_private: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            width: AggregationWidth::Slash64,
            reject_private: true,
        }
    }
}

/// Why an address was not announced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Unparseable,
    Loopback,
    LinkLocal,
    NotGlobalUnicast,
    Private,
    PrefixLength,
}

impl RejectReason {
    /// Stable label, also used for metrics
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::Unparseable => "unparseable",
            RejectReason::Loopback => "loopback",
            RejectReason::LinkLocal => "link_local",
            RejectReason::NotGlobalUnicast => "not_global_unicast",
            RejectReason::Private => "private",
            RejectReason::PrefixLength => "prefix_length",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept(Prefix),
    Reject(RejectReason),
}

/// A raw address as reported by an address source
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// `address/length` text
    Text(String),
    /// Address and prefix length as enumerated from an interface
    Pair(IpAddr, u8),
}

impl Candidate {
    pub fn to_prefix(&self) -> std::result::Result<Prefix, PrefixError> {
        match self {
            Candidate::Text(text) => Prefix::parse(text),
            Candidate::Pair(addr, len) => Prefix::new(*addr, *len),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Text(text) => f.write_str(text),
            Candidate::Pair(addr, len) => write!(f, "{}/{}", addr, len),
        }
    }
}

impl From<&str> for Candidate {
    fn from(text: &str) -> Self {
        Candidate::Text(text.to_string())
    }
}

impl From<String> for Candidate {
    fn from(text: String) -> Self {
        Candidate::Text(text)
    }
}

impl From<(IpAddr, u8)> for Candidate {
    fn from((addr, len): (IpAddr, u8)) -> Self {
        Candidate::Pair(addr, len)
    }
}

impl From<Prefix> for Candidate {
    fn from(prefix: Prefix) -> Self {
        Candidate::Pair(prefix.addr(), prefix.prefix_len())
    }
}

/// Classify one parsed address. The first matching rule wins.
pub fn classify(prefix: &Prefix, config: &ClassifierConfig) -> Verdict {
    let addr = prefix.addr();

    if addr.is_loopback() {
        return Verdict::Reject(RejectReason::Loopback);
    }
    if is_link_local(&addr) {
        return Verdict::Reject(RejectReason::LinkLocal);
    }
    if !is_global_unicast(&addr) {
        return Verdict::Reject(RejectReason::NotGlobalUnicast);
    }
    if config.reject_private && is_private(&addr) {
        return Verdict::Reject(RejectReason::Private);
    }

    match addr {
        // only host routes are announced for IPv4
        IpAddr::V4(_) if prefix.prefix_len() != 32 => Verdict::Reject(RejectReason::PrefixLength),
        IpAddr::V4(_) => Verdict::Accept(*prefix),
        IpAddr::V6(_) if matches!(prefix.prefix_len(), 56 | 64) => Verdict::Accept(*prefix),
        IpAddr::V6(_) => match prefix.with_len(config.width.prefix_len()) {
            Ok(widened) => Verdict::Accept(widened),
            Err(_) => Verdict::Reject(RejectReason::PrefixLength),
        },
    }
}

fn is_link_local(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(a) => a.is_link_local(),
        IpAddr::V6(a) => is_unicast_link_local_v6(a),
    }
}

fn is_unicast_link_local_v6(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

fn is_global_unicast(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(a) => !(a.is_unspecified() || a.is_multicast() || a.is_broadcast()),
        // IPv4-mapped addresses are never announced as IPv6
        IpAddr::V6(a) => {
            !(a.is_unspecified() || a.is_multicast() || a.to_ipv4_mapped().is_some())
        }
    }
}

fn is_private(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(a) => Ipv4Addr::is_private(a),
        IpAddr::V6(a) => (a.segments()[0] & 0xfe00) == 0xfc00,
    }
}

/// Runs classification over a whole address source
pub struct Classifier<D> {
    config: ClassifierConfig,
    diagnostics: D,
}

impl<D: Diagnostics> Classifier<D> {
    pub fn new(config: ClassifierConfig, diagnostics: D) -> Self {
        Self { config, diagnostics }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify every candidate and collect the eligible prefixes.
    ///
    /// Unparseable candidates are reported and skipped. An empty result is
    /// an error.
    pub fn discover<I, C>(&self, candidates: I) -> Result<EligibleSet>
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        let mut aggregator = Aggregator::new(&self.diagnostics);

        for candidate in candidates {
            let candidate = candidate.into();
            self.diagnostics.observed(&candidate);

            let prefix = match candidate.to_prefix() {
                Ok(prefix) => prefix,
                Err(e) => {
                    self.diagnostics.unparseable(&candidate, &e);
                    continue;
                }
            };

            match classify(&prefix, &self.config) {
                Verdict::Accept(accepted) => aggregator.insert(accepted),
                Verdict::Reject(reason) => self.diagnostics.rejected(&prefix, reason),
            }
        }

        aggregator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticEvent, NoopDiagnostics, RecordingDiagnostics};

    fn p(s: &str) -> Prefix {
        Prefix::parse(s).expect("valid prefix")
    }

    fn verdict(s: &str) -> Verdict {
        classify(&p(s), &ClassifierConfig::default())
    }

    #[test]
    fn test_rejects_loopback() {
        assert_eq!(verdict("127.0.0.1/8"), Verdict::Reject(RejectReason::Loopback));
        assert_eq!(verdict("::1/128"), Verdict::Reject(RejectReason::Loopback));
    }

    #[test]
    fn test_rejects_link_local() {
        assert_eq!(verdict("fe80::1/64"), Verdict::Reject(RejectReason::LinkLocal));
        assert_eq!(verdict("169.254.10.1/32"), Verdict::Reject(RejectReason::LinkLocal));
    }

    #[test]
    fn test_rejects_non_unicast() {
        assert_eq!(verdict("0.0.0.0/32"), Verdict::Reject(RejectReason::NotGlobalUnicast));
        assert_eq!(verdict("224.0.0.5/32"), Verdict::Reject(RejectReason::NotGlobalUnicast));
        assert_eq!(verdict("ff02::1/128"), Verdict::Reject(RejectReason::NotGlobalUnicast));
        assert_eq!(
            verdict("255.255.255.255/32"),
            Verdict::Reject(RejectReason::NotGlobalUnicast)
        );
    }

    #[test]
    fn test_rejects_ipv4_mapped() {
        assert_eq!(
            verdict("::ffff:203.0.113.5/128"),
            Verdict::Reject(RejectReason::NotGlobalUnicast)
        );
        assert_eq!(
            verdict("::ffff:203.0.113.5/96"),
            Verdict::Reject(RejectReason::NotGlobalUnicast)
        );

        let classifier = Classifier::new(ClassifierConfig::default(), NoopDiagnostics);
        assert!(matches!(
            classifier.discover(["::ffff:203.0.113.5/128", "::ffff:203.0.113.5/96"]),
            Err(CoreError::NoEligibleAddresses)
        ));
    }

    #[test]
    fn test_private_ranges() {
        assert_eq!(verdict("10.1.2.3/32"), Verdict::Reject(RejectReason::Private));
        assert_eq!(verdict("192.168.1.1/32"), Verdict::Reject(RejectReason::Private));
        assert_eq!(verdict("fd00::1/64"), Verdict::Reject(RejectReason::Private));

        let permissive = ClassifierConfig {
            reject_private: false,
            ..Default::default()
        };
        assert_eq!(
            classify(&p("10.1.2.3/32"), &permissive),
            Verdict::Accept(p("10.1.2.3/32"))
        );
    }

    #[test]
    fn test_ipv4_host_routes_only() {
        assert_eq!(verdict("203.0.113.5/24"), Verdict::Reject(RejectReason::PrefixLength));
        assert_eq!(verdict("203.0.113.5/32"), Verdict::Accept(p("203.0.113.5/32")));
    }

    #[test]
    fn test_ipv6_natural_lengths_unchanged() {
        assert_eq!(
            verdict("2001:db8:abcd:1234::5/64"),
            Verdict::Accept(p("2001:db8:abcd:1234::5/64"))
        );
        assert_eq!(
            verdict("2001:db8:abcd:1200::/56"),
            Verdict::Accept(p("2001:db8:abcd:1200::/56"))
        );
    }

    #[test]
    fn test_ipv6_widened_to_target() {
        assert_eq!(
            verdict("2001:db8:abcd:1234::5/128"),
            Verdict::Accept(p("2001:db8:abcd:1234::/64"))
        );

        let send56 = ClassifierConfig {
            width: AggregationWidth::Slash56,
            ..Default::default()
        };
        assert_eq!(
            classify(&p("2001:db8:abcd:1234::5/128"), &send56),
            Verdict::Accept(p("2001:db8:abcd:1200::/56"))
        );
    }

    #[test]
    fn test_aggregation_width_conversion() {
        assert_eq!(AggregationWidth::try_from(56).unwrap(), AggregationWidth::Slash56);
        assert_eq!(AggregationWidth::try_from(64).unwrap(), AggregationWidth::Slash64);
        assert!(matches!(
            AggregationWidth::try_from(48),
            Err(CoreError::InvalidWidth(48))
        ));
    }

    #[test]
    fn test_discover_skips_unparseable() {
        let recorder = RecordingDiagnostics::new();
        let classifier = Classifier::new(ClassifierConfig::default(), &recorder);

        let set = classifier
            .discover(["garbage", "203.0.113.5/32", "127.0.0.1/8"])
            .unwrap();

        assert_eq!(set.keys(), vec!["203.0.113.5/32".to_string()]);
        assert!(recorder
            .events()
            .contains(&DiagnosticEvent::Unparseable("garbage".to_string())));
        assert_eq!(
            recorder.rejections(),
            vec![(p("127.0.0.1/8"), RejectReason::Loopback)]
        );
    }

    #[test]
    fn test_discover_collapses_to_supernet() {
        let classifier = Classifier::new(ClassifierConfig::default(), NoopDiagnostics);
        let set = classifier
            .discover([
                "2001:db8:abcd:1234::5/128",
                "2001:db8:abcd:1234::6/128",
                "2001:db8:abcd:1234::7/64",
            ])
            .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.prefixes(), vec![p("2001:db8:abcd:1234::/64")]);
    }

    #[test]
    fn test_discover_accepts_pairs() {
        let classifier = Classifier::new(ClassifierConfig::default(), NoopDiagnostics);
        let addr: IpAddr = "198.51.100.1".parse().unwrap();
        let set = classifier.discover([(addr, 32u8), (addr, 40u8)]).unwrap();
        assert_eq!(set.keys(), vec!["198.51.100.1/32".to_string()]);
    }

    #[test]
    fn test_discover_nothing_eligible() {
        let classifier = Classifier::new(ClassifierConfig::default(), NoopDiagnostics);
        let result = classifier.discover(["127.0.0.1/8", "fe80::1/64", "203.0.113.5/24"]);
        assert!(matches!(result, Err(CoreError::NoEligibleAddresses)));

        let empty: Vec<Candidate> = Vec::new();
        assert!(matches!(
            classifier.discover(empty),
            Err(CoreError::NoEligibleAddresses)
        ));
    }
}
