//! # Node Runtime Flows
//!
//! Two complete runtimes sharing one static peer list. Each skips itself
//! in the list, trusts the other, and an organism seeded on the first ends
//! up on the second.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use node_runtime::{NodeConfig, NodeRuntime};
    use std::time::Duration;
    use tempfile::TempDir;
    use vv_02_peer_discovery::DiscoveryConfig;
    use vv_04_teleport::{Dispatch, PackageCache, TeleportConfig};

    fn node_config(address: std::net::IpAddr, port: u16, packages: &TempDir) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.discovery = DiscoveryConfig {
            use_static_list: true,
            static_peers: format!("all,{NODE_A},all,{NODE_B}"),
            local_address: Some(address),
            ..DiscoveryConfig::for_testing()
        };
        config.teleport = TeleportConfig {
            peer_port: port,
            package_dir: packages.path().to_path_buf(),
            ..TeleportConfig::for_testing()
        };
        config
    }

    #[tokio::test]
    async fn test_two_runtimes_exchange_an_organism() {
        let port = free_port();
        let (dir_a, dir_b) = (TempDir::new().unwrap(), TempDir::new().unwrap());

        let mut config_a = node_config(NODE_A, port, &dir_a);
        config_a.emigration.seed_organisms = 1;
        let mut node_a = NodeRuntime::new(config_a).unwrap();
        let mut node_b = NodeRuntime::new(node_config(NODE_B, port, &dir_b)).unwrap();

        assert_eq!(node_a.start().await.unwrap().ip(), NODE_A);
        assert_eq!(node_b.start().await.unwrap().ip(), NODE_B);

        let a = node_a.container();
        let b = node_b.container();
        assert!(
            eventually(Duration::from_secs(5), || {
                a.registry.is_known_good(&NODE_B) && b.registry.is_known_good(&NODE_A)
            })
            .await,
            "static peers never became known-good"
        );
        assert!(!a.registry.is_known_good(&NODE_A));

        let mut source = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut source, FERN_CODE).unwrap();
        a.cache.install(source.path(), &fern_package()).unwrap();

        let migrant = a.engine.take_resident().unwrap();
        let id = migrant.snapshot.id();
        let coordinator = node_a.coordinator().unwrap();
        let report = match coordinator.migrate(migrant) {
            Dispatch::Remote(handle) => handle.await.unwrap(),
            Dispatch::Local => panic!("expected a remote dispatch"),
        };

        assert!(report.result.is_ok(), "{report:?}");
        let arrived = b.engine.residents();
        assert_eq!(arrived.len(), 1);
        assert_eq!(arrived[0].snapshot.id(), id);
        assert!(b.cache.exists(&fern_package()));

        node_a.shutdown().await;
        node_b.shutdown().await;
    }

    #[tokio::test]
    async fn test_runtime_reports_stats_and_stops() {
        let port = free_port();
        let dir = TempDir::new().unwrap();
        let mut node = NodeRuntime::new(node_config(NODE_A, port, &dir)).unwrap();
        let address = node.start().await.unwrap();

        let stats: serde_json::Value = reqwest::get(format!("http://{address}/organisms/stats"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["channel"], "EcoSystem");
        assert_eq!(
            stats["worldId"],
            node.container().identity.world_id.to_string()
        );

        node.shutdown().await;
        assert!(reqwest::get(format!("http://{address}/version")).await.is_err());
    }
}
