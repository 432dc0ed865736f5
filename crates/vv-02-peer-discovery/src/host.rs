//! Choosing the address this instance advertises and compares peers against.

use std::net::{IpAddr, Ipv4Addr};
use tracing::{info, warn};

use crate::domain::{DiscoveryConfig, BEHIND_NAT_MESSAGE, SERVICE_UNREACHABLE_MESSAGE};
use crate::ports::{DiscoveryService, LocalInterfaces};

/// Resolved host address plus any warning for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAddress {
    pub address: IpAddr,
    pub warning: Option<&'static str>,
}

impl HostAddress {
    fn clean(address: IpAddr) -> Self {
        Self {
            address,
            warning: None,
        }
    }
}

/// True if peers can reach us at `observed`: it is bound locally, or the
/// operator says a forwarded port makes it reachable.
pub fn is_reachable(
    observed: IpAddr,
    config: &DiscoveryConfig,
    interfaces: &dyn LocalInterfaces,
) -> bool {
    config.assume_reachable || interfaces.addresses().contains(&observed)
}

/// First non-loopback interface address, else loopback.
pub fn first_local_address(interfaces: &dyn LocalInterfaces) -> IpAddr {
    interfaces
        .addresses()
        .into_iter()
        .find(|addr| !addr.is_loopback() && !addr.is_unspecified())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Resolve the host address.
///
/// Order: configured override; the address the discovery service sees, if
/// reachable; the first local interface; `127.0.0.1`.
pub async fn resolve_host_address(
    config: &DiscoveryConfig,
    service: Option<&dyn DiscoveryService>,
    interfaces: &dyn LocalInterfaces,
) -> HostAddress {
    if let Some(address) = config.local_address {
        info!(%address, "using configured host address");
        return HostAddress::clean(address);
    }

    let Some(service) = service else {
        return HostAddress::clean(first_local_address(interfaces));
    };

    let resolved = match service.validate_address().await {
        Ok(observed) if is_reachable(observed, config, interfaces) => HostAddress::clean(observed),
        Ok(observed) => {
            warn!(%observed, "discovery service sees a non-local address");
            HostAddress {
                address: first_local_address(interfaces),
                warning: Some(BEHIND_NAT_MESSAGE),
            }
        }
        Err(e) => {
            warn!(error = %e, "discovery service unreachable while resolving host address");
            HostAddress {
                address: IpAddr::V4(Ipv4Addr::LOCALHOST),
                warning: Some(SERVICE_UNREACHABLE_MESSAGE),
            }
        }
    };
    info!(address = %resolved.address, "host address resolved");
    resolved
}
