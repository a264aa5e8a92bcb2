//! Announcer configuration
//!
//! Read from an optional YAML file (`ELASTIC_CONFIG`), then overridden by
//! `ELASTIC_*` environment variables.

use anyhow::{anyhow, bail, Context, Result};
use elastic_core::{
    AggregationWidth, ClassifierConfig, Community, CommunityMap, Prefix, DEFAULT_NEIGHBOR_BASE,
};
use elastic_discovery::{InterfaceScanner, InterfaceScope, LiteralSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Which announcer of a pair this host is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Secondary,
}

impl Role {
    /// Default community for everything this host announces
    pub fn community(self) -> Community {
        match self {
            Role::Primary => Community::PRIMARY,
            Role::Secondary => Community::SECONDARY,
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Role::Primary),
            "secondary" => Ok(Role::Secondary),
            other => bail!("unknown role {:?}, use either primary or secondary", other),
        }
    }
}

/// Raw configuration as written by the operator
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnnouncerConfig {
    pub role: Option<Role>,
    pub datacenter_id: Option<u32>,
    pub aggregation_width: AggregationWidth,
    pub scan_all_interfaces: bool,
    pub reject_private: bool,
    /// Announce these instead of scanning interfaces
    pub explicit_prefixes: Vec<String>,
    /// Only announce these prefixes, each with its own community
    pub communities: BTreeMap<String, String>,
    pub neighbor_base: String,
    pub log_level: String,
    pub log_json: bool,
    pub metrics_textfile: Option<PathBuf>,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            role: None,
            datacenter_id: None,
            aggregation_width: AggregationWidth::Slash64,
            scan_all_interfaces: false,
            reject_private: true,
            explicit_prefixes: Vec::new(),
            communities: BTreeMap::new(),
            neighbor_base: DEFAULT_NEIGHBOR_BASE.to_string(),
            log_level: "info".to_string(),
            log_json: false,
            metrics_textfile: None,
        }
    }
}

impl AnnouncerConfig {
    /// Load from `ELASTIC_CONFIG` (if set) and the process environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("ELASTIC_CONFIG") {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path))?;
                Self::from_yaml(&text).with_context(|| format!("failed to parse config file {}", path))?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Override fields from environment variables looked up through `var`
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(role) = var("ELASTIC_ROLE") {
            self.role = Some(role.parse()?);
        }
        if let Some(dcid) = var("ELASTIC_DCID") {
            self.datacenter_id = Some(
                dcid.trim()
                    .parse()
                    .with_context(|| format!("invalid ELASTIC_DCID {:?}", dcid))?,
            );
        }
        if let Some(send56) = var("ELASTIC_SEND56") {
            self.aggregation_width = if parse_bool("ELASTIC_SEND56", &send56)? {
                AggregationWidth::Slash56
            } else {
                AggregationWidth::Slash64
            };
        }
        if let Some(all) = var("ELASTIC_ALL_IFS") {
            self.scan_all_interfaces = parse_bool("ELASTIC_ALL_IFS", &all)?;
        }
        if let Some(prefixes) = var("ELASTIC_PREFIXES") {
            self.explicit_prefixes = prefixes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(base) = var("ELASTIC_NEIGHBOR_BASE") {
            self.neighbor_base = base;
        }
        if let Some(level) = var("ELASTIC_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(json) = var("ELASTIC_LOG_JSON") {
            self.log_json = parse_bool("ELASTIC_LOG_JSON", &json)?;
        }
        if let Some(path) = var("ELASTIC_METRICS_TEXTFILE") {
            self.metrics_textfile = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Check everything and parse every operator literal
    pub fn validate(&self) -> Result<Settings> {
        let role = self
            .role
            .ok_or_else(|| anyhow!("use either primary or secondary role"))?;

        let datacenter_id = match self.datacenter_id {
            Some(dcid) if dcid > 1 => dcid,
            _ => bail!("datacenter id must be specified and greater than 1"),
        };

        let source = if self.explicit_prefixes.is_empty() {
            Source::Interfaces(InterfaceScanner::new(InterfaceScope::from_scan_all(
                self.scan_all_interfaces,
            )))
        } else {
            Source::Literal(
                LiteralSource::new(&self.explicit_prefixes).context("invalid explicit prefix")?,
            )
        };

        let communities =
            CommunityMap::parse(&self.communities).context("invalid community map")?;

        let neighbor_base = Prefix::parse(&self.neighbor_base)
            .with_context(|| format!("invalid neighbor base {:?}", self.neighbor_base))?;

        Ok(Settings {
            role,
            datacenter_id,
            classifier: ClassifierConfig {
                width: self.aggregation_width,
                reject_private: self.reject_private,
            },
            source,
            communities,
            neighbor_base,
            metrics_textfile: self.metrics_textfile.clone(),
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => bail!("invalid boolean {:?} for {}", value, key),
    }
}

/// Where addresses come from
#[derive(Clone, Debug)]
pub enum Source {
    Interfaces(InterfaceScanner),
    Literal(LiteralSource),
}

/// Validated configuration, ready to run
#[derive(Clone, Debug)]
pub struct Settings {
    pub role: Role,
    pub datacenter_id: u32,
    pub classifier: ClassifierConfig,
    pub source: Source,
    pub communities: CommunityMap,
    pub neighbor_base: Prefix,
    pub metrics_textfile: Option<PathBuf>,
}
