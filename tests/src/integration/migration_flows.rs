//! # Migration Flows
//!
//! Two live nodes on `127.0.0.1` and `127.0.0.2` exchange organisms over
//! HTTP.
//!
//! ## Flows Tested
//!
//! 1. **First contact**: the package travels before the organism
//! 2. **Version mismatch**: the organism stays home, the peer is demoted
//! 3. **Unreachable peer**: same outcome as a mismatch
//! 4. **Throttle**: a second delivery inside the window is declined
//! 5. **Untrusted sender**: neither package nor organism is accepted
//! 6. **Crafted payload**: a disallowed type never reaches the population
//! 7. **Uniform selection**: every known-good peer is picked equally often

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use bincode::Options;
    use serde::Serialize;
    use shared_types::{Channel, ProtocolVersion};
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use vv_01_peer_registry::test_utils::ControllableTimeSource;
    use vv_01_peer_registry::{PeerLease, PeerRegistry, RegistryConfig, TimeSource};
    use vv_03_migration_wire::codec::MAGIC;
    use vv_03_migration_wire::{TypeTag, SCHEMA_VERSION};
    use vv_04_teleport::{
        Delivery, Dispatch, HttpPeerTransport, Migrant, MigrationFailure, MigrationReport,
        PackageCache, PeerTransport, PEER_CHANNEL_HEADER,
    };

    async fn pair(a: NodeOptions, b: NodeOptions) -> (TestNode, TestNode) {
        let port = free_port();
        let node_a = TestNode::start(NODE_A, port, a).await;
        let node_b = TestNode::start(NODE_B, port, b).await;
        node_a.trust(&[NODE_B]);
        node_b.trust(&[NODE_A]);
        (node_a, node_b)
    }

    async fn send(node: &TestNode, migrant: Migrant) -> MigrationReport {
        match node.coordinator.migrate(migrant) {
            Dispatch::Remote(handle) => handle.await.unwrap(),
            Dispatch::Local => panic!("expected a remote dispatch"),
        }
    }

    // =========================================================================
    // DELIVERY
    // =========================================================================

    #[tokio::test]
    async fn test_first_contact_sends_package_before_organism() {
        let (a, b) = pair(NodeOptions::default(), NodeOptions::default()).await;
        a.install_fern();
        assert!(!b.cache.exists(&fern_package()));

        let migrant = fern();
        let id = migrant.snapshot.id();
        let report = send(&a, migrant).await;

        // The package was already present when the state arrived.
        assert_eq!(report.destination, NODE_B);
        assert_eq!(
            report.result,
            Ok(Delivery {
                package_uploaded: true,
                assembly_received: true,
            })
        );
        assert_eq!(b.cache.load(&fern_package()).unwrap(), FERN_CODE);

        let residents = b.engine.residents();
        assert_eq!(residents.len(), 1);
        assert_eq!(residents[0].snapshot.id(), id);
        assert!(b.engine.awaiting_package().is_empty());
        assert!(a.engine.residents().is_empty());

        // A repeat check now finds the package.
        let transport =
            HttpPeerTransport::bound_to(a.port, Duration::from_secs(5), NODE_A).unwrap();
        assert!(transport.check_package(NODE_B, &fern_package()).await.unwrap());

        let sent = a.metrics.snapshot();
        assert_eq!((sent.total, sent.remote, sent.failed_sends), (1, 1, 0));
        assert_eq!(sent.in_flight, 0);

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_known_package_is_not_resent() {
        let (a, b) = pair(NodeOptions::default(), NodeOptions::default()).await;
        a.install_fern();
        b.install_fern();

        let report = send(&a, fern()).await;
        assert_eq!(
            report.result,
            Ok(Delivery {
                package_uploaded: false,
                assembly_received: true,
            })
        );
        assert_eq!(b.engine.residents().len(), 1);

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_delivery_shows_in_receiver_stats() {
        let (a, b) = pair(NodeOptions::default(), NodeOptions::default()).await;
        a.install_fern();
        send(&a, fern()).await.result.unwrap();

        let stats: serde_json::Value = reqwest::get(b.url("/organisms/stats"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["population"]["Fern"], 1);
        assert_eq!(stats["peers"]["knownGood"], 1);
        assert_eq!(stats["migrations"]["failedReceives"], 0);

        a.stop().await;
        b.stop().await;
    }

    // =========================================================================
    // FAILURES SEND THE ORGANISM HOME
    // =========================================================================

    #[tokio::test]
    async fn test_version_mismatch_keeps_organism_and_demotes_peer() {
        let current = ProtocolVersion::current();
        let newer = NodeOptions {
            version: ProtocolVersion::new(current.major, current.minor, current.build + 1),
            ..NodeOptions::default()
        };
        let (a, b) = pair(NodeOptions::default(), newer).await;
        a.install_fern();

        let migrant = fern();
        let id = migrant.snapshot.id();
        let report = send(&a, migrant).await;

        assert!(matches!(
            report.result,
            Err(MigrationFailure::VersionMismatch { .. })
        ));
        let home = a.engine.residents();
        assert_eq!(home.len(), 1);
        assert_eq!(home[0].snapshot.id(), id);
        assert!(b.engine.residents().is_empty());
        assert!(!b.cache.exists(&fern_package()));

        assert!(!a.registry.is_known_good(&NODE_B));
        assert!(a.registry.is_blacklisted(&NODE_B));
        let sent = a.metrics.snapshot();
        assert_eq!((sent.local, sent.remote, sent.failed_sends), (1, 0, 1));
        assert!(sent.last_error.is_some());

        // With the only peer demoted, the next organism stays local at once.
        assert!(matches!(a.coordinator.migrate(fern()), Dispatch::Local));

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_channel_mismatch_keeps_organism() {
        let sandbox = NodeOptions {
            channel: Channel::new("Sandbox"),
            ..NodeOptions::default()
        };
        let (a, b) = pair(NodeOptions::default(), sandbox).await;

        let report = send(&a, fern()).await;
        assert!(matches!(
            report.result,
            Err(MigrationFailure::ChannelMismatch { .. })
        ));
        assert_eq!(a.engine.residents().len(), 1);
        assert!(a.registry.is_blacklisted(&NODE_B));

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_unreachable_peer_keeps_organism_and_demotes_peer() {
        let port = free_port();
        let a = TestNode::start(NODE_A, port, NodeOptions::default()).await;
        a.trust(&[NODE_DOWN]);

        let report = send(&a, fern()).await;
        assert_eq!(report.destination, NODE_DOWN);
        assert!(report.result.is_err());
        assert_eq!(a.engine.residents().len(), 1);
        assert!(a.registry.is_blacklisted(&NODE_DOWN));
        assert_eq!(a.metrics.snapshot().failed_sends, 1);

        a.stop().await;
    }

    #[tokio::test]
    async fn test_second_delivery_inside_throttle_window_declined() {
        let (a, b) = pair(NodeOptions::default(), NodeOptions::default()).await;
        a.install_fern();

        send(&a, fern()).await.result.unwrap();

        b.clock.advance(5);
        let report = send(&a, fern()).await;
        match report.result {
            Err(MigrationFailure::ProtocolAbort { reason }) => {
                assert_eq!(reason, "Sender is delivering too often");
            }
            other => panic!("expected a decline, got {other:?}"),
        }
        assert_eq!(a.engine.residents().len(), 1);
        assert_eq!(b.engine.residents().len(), 1);
        assert_eq!(b.metrics.snapshot().failed_receives, 1);

        // A decline does not cost the peer its standing.
        assert!(a.registry.is_known_good(&NODE_B));

        b.clock.advance(30);
        send(&a, fern()).await.result.unwrap();
        assert_eq!(b.engine.residents().len(), 2);

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_untrusted_sender_delivers_nothing() {
        let port = free_port();
        let a = TestNode::start(NODE_A, port, NodeOptions::default()).await;
        let b = TestNode::start(NODE_B, port, NodeOptions::default()).await;
        a.trust(&[NODE_B]);
        a.install_fern();

        let report = send(&a, fern()).await;
        match report.result {
            Err(MigrationFailure::ProtocolAbort { reason }) => {
                assert_eq!(reason, "Sender did not pass the blacklist check");
            }
            other => panic!("expected a decline, got {other:?}"),
        }
        assert_eq!(a.engine.residents().len(), 1);
        assert!(!b.cache.exists(&fern_package()));
        assert!(b.engine.awaiting_package().is_empty());
        assert_eq!(b.metrics.snapshot().failed_receives, 2);

        a.stop().await;
        b.stop().await;
    }

    // =========================================================================
    // HOSTILE INPUT
    // =========================================================================

    #[derive(Serialize)]
    struct ForgedFrame {
        magic: [u8; 4],
        schema: u16,
        tag: TypeTag,
        body: Vec<u8>,
    }

    #[tokio::test]
    async fn test_crafted_payload_never_reaches_population() {
        let (a, b) = pair(NodeOptions::default(), NodeOptions::default()).await;

        let frame = bincode::DefaultOptions::new()
            .serialize(&ForgedFrame {
                magic: MAGIC,
                schema: SCHEMA_VERSION,
                tag: TypeTag::new("std::fs", "File"),
                body: b"/etc/passwd".to_vec(),
            })
            .unwrap();

        let client = reqwest::Client::builder()
            .local_address(Some(NODE_A))
            .build()
            .unwrap();
        let reply: serde_json::Value = client
            .post(b.url("/organisms/state"))
            .header(PEER_CHANNEL_HEADER, a.identity.channel.as_str())
            .body(frame)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(reply["arrived"], false);
        assert_eq!(reply["reason"], "Organism state could not be decoded");
        assert!(b.engine.residents().is_empty());
        assert!(b.engine.awaiting_package().is_empty());
        assert_eq!(b.metrics.snapshot().failed_receives, 1);

        a.stop().await;
        b.stop().await;
    }

    // =========================================================================
    // PEER SELECTION
    // =========================================================================

    #[test]
    fn test_peer_selection_is_uniform() {
        let clock = ControllableTimeSource::new(1_700_000_000);
        let registry = PeerRegistry::new(RegistryConfig::default(), Box::new(clock.clone()));
        let peers: Vec<IpAddr> = (10..15)
            .map(|last| IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)))
            .collect();
        let lease = clock.now() + chrono::Duration::days(5);
        registry.replace_known_good(peers.iter().map(|&peer| PeerLease::new(peer, lease)));

        let trials = 50_000;
        let mut counts: HashMap<IpAddr, u32> = HashMap::new();
        for _ in 0..trials {
            *counts.entry(registry.pick_random().unwrap()).or_insert(0) += 1;
        }

        let expected = f64::from(trials) / peers.len() as f64;
        for peer in &peers {
            let observed = f64::from(counts.get(peer).copied().unwrap_or(0));
            assert!(
                (observed - expected).abs() < expected * 0.05,
                "{peer} picked {observed} times, expected about {expected}"
            );
        }
    }

    #[tokio::test]
    async fn test_no_peers_means_local() {
        let a = TestNode::start(NODE_A, free_port(), NodeOptions::default()).await;
        assert!(!a.registry.has_known_peers());

        assert!(matches!(a.coordinator.migrate(fern()), Dispatch::Local));
        assert_eq!(a.engine.residents().len(), 1);
        assert_eq!(a.metrics.snapshot().local, 1);

        a.stop().await;
    }
}
