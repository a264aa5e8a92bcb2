use anyhow::{Context, Result};
use elastic_bgp::{
    announce_all, establish_peerings, BgpSpeaker, DryRunSpeaker, GlobalConfig, RouteServerPeer,
};
use elastic_core::{
    assign_communities, neighbor_addresses, with_default_community, Announcement, Classifier,
    Diagnostics, MetricsDiagnostics, TracingDiagnostics,
};
use elastic_discovery::AddressSource;
use serde::Serialize;
use tracing::{debug, info};

mod config;
mod logging;

use config::{AnnouncerConfig, Settings, Source};

/// What this host is about to announce
#[derive(Serialize)]
struct Summary<'a> {
    role: config::Role,
    datacenter_id: u32,
    default_community: String,
    routes: Vec<String>,
    neighbors: &'a [RouteServerPeer],
}

/// Discover, classify and tag everything this host should announce
fn plan_announcements<D: Diagnostics>(settings: &Settings, diagnostics: D) -> Result<Vec<Announcement>> {
    let candidates = match &settings.source {
        Source::Interfaces(scanner) => scanner.candidates(),
        Source::Literal(literals) => literals.candidates(),
    }
    .context("failed to collect addresses")?;

    let eligible = Classifier::new(settings.classifier, diagnostics).discover(candidates)?;
    let addresses = assign_communities(&eligible, &settings.communities)?;
    Ok(with_default_community(addresses, settings.role.community()))
}

/// One peering per route server of the datacenter
fn route_server_peers(settings: &Settings) -> Result<Vec<RouteServerPeer>> {
    Ok(neighbor_addresses(&settings.neighbor_base, settings.datacenter_id)?
        .iter()
        .map(|neighbor| RouteServerPeer::new(neighbor.addr()))
        .collect())
}

fn write_metrics(settings: &Settings, metrics: &MetricsDiagnostics) -> Result<()> {
    if let Some(path) = &settings.metrics_textfile {
        std::fs::write(path, metrics.gather()?)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        debug!(path = %path.display(), "metrics written");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AnnouncerConfig::load().context("failed to load configuration")?;
    logging::init(&config.log_level, config.log_json);

    info!("Starting elastic-announcer...");

    let settings = config.validate()?;
    info!(
        role = ?settings.role,
        datacenter_id = settings.datacenter_id,
        width = settings.classifier.width.prefix_len(),
        "Configuration loaded"
    );

    let metrics = MetricsDiagnostics::new()?;
    let announcements = plan_announcements(&settings, (TracingDiagnostics, &metrics))?;
    write_metrics(&settings, &metrics)?;

    let peers = route_server_peers(&settings)?;

    let summary = Summary {
        role: settings.role,
        datacenter_id: settings.datacenter_id,
        default_community: settings.role.community().to_string(),
        routes: announcements.iter().map(|a| a.prefix.to_string()).collect(),
        neighbors: &peers,
    };
    debug!(summary = %serde_json::to_string(&summary)?, "announcement plan");

    let speaker = DryRunSpeaker::new();
    info!("Using {} BGP speaker", speaker.name());

    speaker.start(&GlobalConfig::default()).await?;
    establish_peerings(&speaker, &peers).await?;
    let count = announce_all(&speaker, &announcements).await?;
    info!("Announced {} routes to {} route servers", count, peers.len());

    info!("Running....");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting...");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastic_core::{Community, NoopDiagnostics};

    fn settings(prefixes: &[&str], communities: &[(&str, &str)]) -> Settings {
        let mut config = AnnouncerConfig {
            role: Some(config::Role::Secondary),
            datacenter_id: Some(14),
            explicit_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        };
        for (prefix, community) in communities {
            config
                .communities
                .insert(prefix.to_string(), community.to_string());
        }
        config.validate().unwrap()
    }

    #[test]
    fn test_plan_default_community() {
        let settings = settings(&["203.0.113.5/32", "2001:db8:abcd:1234::1/64", "10.0.0.1/32"], &[]);
        let announcements = plan_announcements(&settings, NoopDiagnostics).unwrap();

        let routes: Vec<String> = announcements.iter().map(|a| a.prefix.to_string()).collect();
        assert_eq!(routes, vec!["2001:db8:abcd:1234::/64", "203.0.113.5/32"]);
        assert!(announcements
            .iter()
            .all(|a| a.community == Community::SECONDARY && a.next_hop.is_none()));
    }

    #[test]
    fn test_plan_with_community_map() {
        let settings = settings(
            &["203.0.113.5/32", "198.51.100.1/32"],
            &[("203.0.113.5/32", "65000:7")],
        );
        let announcements = plan_announcements(&settings, NoopDiagnostics).unwrap();
        assert_eq!(announcements.len(), 1);
        assert_eq!(announcements[0].community, Community::new(65000, 7));
    }

    #[test]
    fn test_plan_nothing_eligible() {
        let settings = settings(&["127.0.0.1/8"], &[]);
        assert!(plan_announcements(&settings, NoopDiagnostics).is_err());
    }

    #[test]
    fn test_route_server_peers() {
        let settings = settings(&["203.0.113.5/32"], &[]);
        let peers = route_server_peers(&settings).unwrap();
        assert_eq!(peers.len(), 4);
        assert_eq!(peers[0].neighbor_address.to_string(), "2600:3c0f:14:34::1");
        assert_eq!(peers[3].neighbor_address.to_string(), "2600:3c0f:14:34::4");
    }

    #[tokio::test]
    async fn test_dry_run_announces_plan() {
        let settings = settings(&["203.0.113.5/32", "2001:db8::/64"], &[]);
        let announcements = plan_announcements(&settings, NoopDiagnostics).unwrap();

        let speaker = DryRunSpeaker::new();
        speaker.start(&GlobalConfig::default()).await.unwrap();
        establish_peerings(&speaker, &route_server_peers(&settings).unwrap())
            .await
            .unwrap();
        assert_eq!(announce_all(&speaker, &announcements).await.unwrap(), 2);
        assert_eq!(speaker.paths().await.len(), 2);
    }
}
