//! HTTP client for the discovery backend.
//!
//! - `GET  {base}/peers/validate` returns `{"address": "203.0.113.7"}`
//! - `POST {base}/peers/register` with `{"version", "channel", "worldId"}`
//!   returns `{"peersOnChannel": 3, "peers": [{"address", "lease"}]}`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::DiscoveryError;
use crate::ports::{DiscoveryService, PeerListing, Registration};

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    version: String,
    channel: &'a str,
    world_id: Uuid,
}

/// Discovery service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDiscoveryClient {
    client: Client,
    base_url: String,
}

impl HttpDiscoveryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DiscoveryService for HttpDiscoveryClient {
    async fn validate_address(&self) -> Result<IpAddr, DiscoveryError> {
        let response: ValidateResponse = self
            .client
            .get(format!("{}/peers/validate", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.address.trim().parse().map_err(|_| {
            DiscoveryError::InvalidResponse(format!("bad address {:?}", response.address))
        })
    }

    async fn register_and_list(
        &self,
        registration: &Registration,
    ) -> Result<PeerListing, DiscoveryError> {
        let request = RegisterRequest {
            version: registration.version.to_string(),
            channel: registration.channel.as_str(),
            world_id: registration.world_id,
        };

        let listing = self
            .client
            .post(format!("{}/peers/register", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(listing)
    }
}
