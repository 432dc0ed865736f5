//! Local interface lookup via `local-ip-address`.

use std::net::IpAddr;
use tracing::warn;

use crate::ports::LocalInterfaces;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl SystemInterfaces {
    pub fn new() -> Self {
        Self
    }
}

impl LocalInterfaces for SystemInterfaces {
    fn addresses(&self) -> Vec<IpAddr> {
        match local_ip_address::list_afinet_netifas() {
            Ok(interfaces) => interfaces.into_iter().map(|(_, addr)| addr).collect(),
            Err(e) => {
                warn!(error = %e, "could not enumerate network interfaces");
                Vec::new()
            }
        }
    }
}
