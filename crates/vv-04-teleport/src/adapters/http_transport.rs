//! Handshake requests over HTTP with `reqwest`.
//!
//! Every request shares one client whose timeout bounds each step; a timed
//! out step fails like any other transport error. Nothing is retried.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use shared_types::{Channel, PackageName};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::domain::{
    PackageCheck, PackageSaved, StateReply, TransportError, VersionInfo, PACKAGE_NAME_HEADER,
    PEER_CHANNEL_HEADER,
};
use crate::ports::PeerTransport;

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct HttpPeerTransport {
    client: Client,
    port: u16,
}

impl HttpPeerTransport {
    /// Contact peers on `port`, each request bounded by `timeout`.
    pub fn new(port: u16, timeout: Duration) -> Result<Self, TransportError> {
        Self::build(port, timeout, None)
    }

    /// As [`new`](Self::new), with outgoing connections bound to
    /// `local_address` so peers see the address we advertise.
    pub fn bound_to(
        port: u16,
        timeout: Duration,
        local_address: IpAddr,
    ) -> Result<Self, TransportError> {
        Self::build(port, timeout, Some(local_address))
    }

    fn build(
        port: u16,
        timeout: Duration,
        local_address: Option<IpAddr>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .local_address(local_address)
            .build()?;
        Ok(Self { client, port })
    }

    fn url(&self, peer: IpAddr, path: &str) -> String {
        format!("http://{}{}", SocketAddr::new(peer, self.port), path)
    }
}

#[async_trait]
impl PeerTransport for HttpPeerTransport {
    async fn query_version(&self, peer: IpAddr) -> Result<VersionInfo, TransportError> {
        let info = self
            .client
            .get(self.url(peer, "/version"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(info)
    }

    async fn check_package(
        &self,
        peer: IpAddr,
        package: &PackageName,
    ) -> Result<bool, TransportError> {
        let check: PackageCheck = self
            .client
            .post(self.url(peer, "/organisms/assemblycheck"))
            .header(CONTENT_TYPE, "text/plain")
            .body(package.full().to_string())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(check.exists)
    }

    async fn upload_package(
        &self,
        peer: IpAddr,
        package: &PackageName,
        bytes: Vec<u8>,
    ) -> Result<bool, TransportError> {
        let saved: PackageSaved = self
            .client
            .post(self.url(peer, "/organisms/assemblies"))
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(PACKAGE_NAME_HEADER, package.full())
            .body(bytes)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(saved.saved)
    }

    async fn upload_state(
        &self,
        peer: IpAddr,
        channel: &Channel,
        frame: Vec<u8>,
    ) -> Result<StateReply, TransportError> {
        let reply = self
            .client
            .post(self.url(peer, "/organisms/state"))
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(PEER_CHANNEL_HEADER, channel.as_str())
            .body(frame)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply)
    }
}
