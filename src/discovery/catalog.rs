//! Catalog client
//!
//! Registrations go out as UDP datagrams; queries fetch the catalog's JSON
//! listing over HTTP and pick the freshest matching entry.

use std::net::UdpSocket;

use serde::Deserialize;
use serde_json::Value;

use crate::config::CatalogConfig;
use crate::error::{Result, RingError};
use super::{Discovery, Registration, ServerAddress, SERVICE_TYPE};

/// One entry of the catalog listing
///
/// Only the fields RingKV needs; everything else the catalog reports is
/// ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub project: String,
    pub name: String,
    pub port: u16,
    pub lastheardfrom: f64,
}

/// Pick the most recently heard-from hashtable entry for `project`
///
/// Entries that lack a required field or have the wrong shape are skipped.
pub fn select_latest(entries: &[Value], project: &str) -> Option<ServerAddress> {
    entries
        .iter()
        .filter_map(|entry| CatalogEntry::deserialize(entry).ok())
        .filter(|entry| entry.kind == SERVICE_TYPE && entry.project == project)
        .fold(None::<CatalogEntry>, |best, entry| match best {
            Some(best) if best.lastheardfrom >= entry.lastheardfrom => Some(best),
            _ => Some(entry),
        })
        .map(|entry| ServerAddress::new(entry.name, entry.port))
}

/// Client for a networked catalog
pub struct CatalogClient {
    config: CatalogConfig,
    socket: UdpSocket,
    http: reqwest::blocking::Client,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| RingError::Discovery(e.to_string()))?;

        Ok(Self {
            config,
            socket,
            http,
        })
    }

    /// Fetch the raw catalog listing
    pub fn listing(&self) -> Result<Vec<Value>> {
        let url = self.config.query_url();
        self.http
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json::<Vec<Value>>())
            .map_err(|e| RingError::Discovery(format!("{url}: {e}")))
    }
}

impl Discovery for CatalogClient {
    fn register(&self, registration: &Registration) -> Result<()> {
        let datagram = serde_json::to_vec(registration)?;
        self.socket
            .send_to(&datagram, self.config.update_addr())
            .map_err(|e| RingError::Discovery(format!("{}: {}", self.config.update_addr(), e)))?;
        Ok(())
    }

    fn query(&self, project: &str) -> Result<Option<ServerAddress>> {
        Ok(select_latest(&self.listing()?, project))
    }
}
