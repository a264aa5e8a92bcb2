//! The capability the announcer needs from a BGP engine

use crate::{BgpError, GlobalConfig, Path, Result, RouteServerPeer};
use elastic_core::Announcement;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A BGP engine that can start, peer and announce paths.
///
/// Session handling and wire encoding stay inside the implementation.
#[async_trait::async_trait]
pub trait BgpSpeaker: Send + Sync {
    fn name(&self) -> &'static str {
        "UnnamedSpeaker"
    }

    /// Start the speaker with global settings
    async fn start(&self, global: &GlobalConfig) -> Result<()>;

    /// Add a route-server peering
    async fn add_peer(&self, peer: &RouteServerPeer) -> Result<()>;

    /// Announce one path
    async fn add_path(&self, path: &Path) -> Result<()>;
}

/// Add one peering per neighbor, stopping at the first failure
pub async fn establish_peerings<S: BgpSpeaker + ?Sized>(
    speaker: &S,
    peers: &[RouteServerPeer],
) -> Result<()> {
    for peer in peers {
        speaker.add_peer(peer).await?;
        debug!(topic = "Neighbor", neighbor = %peer.neighbor_address, "added neighbor");
    }
    Ok(())
}

/// Announce every path, stopping at the first failure
pub async fn announce_all<S: BgpSpeaker + ?Sized>(
    speaker: &S,
    announcements: &[Announcement],
) -> Result<usize> {
    for announcement in announcements {
        let path = Path::from_announcement(announcement)?;
        speaker.add_path(&path).await?;
        info!(
            topic = "Route",
            route = %announcement.prefix,
            community = %announcement.community,
            "added route"
        );
    }
    Ok(announcements.len())
}

/// A recorded speaker call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeakerCall {
    Start(GlobalConfig),
    AddPeer(RouteServerPeer),
    AddPath(Path),
}

/// Logs and records every call instead of talking BGP
#[derive(Clone, Default)]
pub struct DryRunSpeaker {
    calls: Arc<RwLock<Vec<SpeakerCall>>>,
}

impl DryRunSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far
    pub async fn calls(&self) -> Vec<SpeakerCall> {
        self.calls.read().await.clone()
    }

    /// Paths announced so far
    pub async fn paths(&self) -> Vec<Path> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                SpeakerCall::AddPath(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    async fn started(&self) -> bool {
        self.calls
            .read()
            .await
            .iter()
            .any(|call| matches!(call, SpeakerCall::Start(_)))
    }
}

#[async_trait::async_trait]
impl BgpSpeaker for DryRunSpeaker {
    fn name(&self) -> &'static str {
        "DryRunSpeaker"
    }

    async fn start(&self, global: &GlobalConfig) -> Result<()> {
        let mut calls = self.calls.write().await;
        if calls.iter().any(|call| matches!(call, SpeakerCall::Start(_))) {
            return Err(BgpError::AlreadyStarted);
        }
        info!(asn = global.asn, router_id = %global.router_id, "dry-run: start BGP");
        calls.push(SpeakerCall::Start(global.clone()));
        Ok(())
    }

    async fn add_peer(&self, peer: &RouteServerPeer) -> Result<()> {
        if !self.started().await {
            return Err(BgpError::NotStarted);
        }
        let mut calls = self.calls.write().await;
        let duplicate = calls.iter().any(|call| {
            matches!(call, SpeakerCall::AddPeer(p) if p.neighbor_address == peer.neighbor_address)
        });
        if duplicate {
            return Err(BgpError::DuplicatePeer(peer.neighbor_address.to_string()));
        }
        info!(neighbor = %peer.neighbor_address, peer_asn = peer.peer_asn, "dry-run: add neighbor");
        calls.push(SpeakerCall::AddPeer(peer.clone()));
        Ok(())
    }

    async fn add_path(&self, path: &Path) -> Result<()> {
        if !self.started().await {
            return Err(BgpError::NotStarted);
        }
        info!(
            family = %path.family,
            route = %path.prefix,
            communities = ?path.communities,
            "dry-run: add path"
        );
        self.calls.write().await.push(SpeakerCall::AddPath(path.clone()));
        Ok(())
    }
}
