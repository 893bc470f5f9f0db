//! Cluster Router
//!
//! Sends each operation to the replicas of its key and applies the retry
//! policy:
//!
//! | Operation        | Targets        | `Failure` / unreachable          |
//! |------------------|----------------|----------------------------------|
//! | insert, remove   | replica set    | wait, re-resolve, resend forever |
//! | lookup           | replica set    | wait, re-resolve all, new round  |
//! | scan             | every server   | wait, re-resolve, resend forever |
//!
//! `Invalid Request` from any server ends the operation with an error.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use serde_json::Value;

use crate::client::Client;
use crate::config::ClusterConfig;
use crate::discovery::{Discovery, ServerAddress};
use crate::error::{Result, RingError};
use crate::protocol::{Method, RequestBody, Response};
use super::Ring;

/// One server of the cluster and its cached connection
struct ServerSlot {
    /// Catalog name, `{project}-{index}`
    name: String,

    /// Last resolved address
    address: ServerAddress,

    /// Open connection, re-established on demand
    client: Option<Client>,
}

/// Routes operations across the cluster
///
/// Safe to share between threads; calls on different servers proceed in
/// parallel, calls on the same server take turns on its connection.
pub struct ClusterRouter {
    config: ClusterConfig,
    ring: Ring,
    discovery: Arc<dyn Discovery>,
    slots: Vec<Mutex<ServerSlot>>,
}

impl ClusterRouter {
    /// Resolve all `n` servers
    ///
    /// Fails if any server is missing from the catalog.
    pub fn connect(config: ClusterConfig, discovery: Arc<dyn Discovery>) -> Result<Self> {
        config.validate()?;
        let ring = Ring::new(config.servers, config.replication_factor);

        let mut slots = Vec::with_capacity(config.servers);
        for index in 0..config.servers {
            let name = config.server_name(index);
            let address = discovery
                .query(&name)?
                .ok_or_else(|| RingError::Unresolved(name.clone()))?;

            tracing::info!("Located {} at {}", name, address);
            slots.push(Mutex::new(ServerSlot {
                name,
                address,
                client: None,
            }));
        }

        Ok(Self {
            config,
            ring,
            discovery,
            slots,
        })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Store `value` under `key` on every replica
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let request = RequestBody::insert(key.clone(), value);

        for shard in self.ring.replicas(&key) {
            let Some(response) = self.settle(shard, &request, None) else {
                continue;
            };
            if response.is_invalid_request() {
                return Err(RingError::InvalidRequest(response.message().to_string()));
            }
        }
        Ok(())
    }

    /// Delete `key` from every replica
    ///
    /// Returns the first value any replica reported for the key. A replica
    /// whose connection broke after the request went out may already have
    /// applied it; its retry then reports not-found, so with `k = 1` the
    /// result can be `None` for a key that existed.
    pub fn remove(&self, key: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let request = RequestBody::remove(key.clone());
        let mut removed = None;

        for shard in self.ring.replicas(&key) {
            let Some(response) = self.settle(shard, &request, None) else {
                continue;
            };
            if response.is_invalid_request() {
                return Err(RingError::InvalidRequest(response.message().to_string()));
            }
            if removed.is_none() && !response.is_not_found() {
                removed = Some(response.result.unwrap_or(Value::Null));
            }
        }
        Ok(removed)
    }

    /// Fetch `key` from the first replica that has it
    ///
    /// `None` once every replica in a round answered not-found. A round with
    /// an unreachable or failing replica and no value is repeated after the
    /// backoff, with every replica re-resolved.
    pub fn lookup(&self, key: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let request = RequestBody::lookup(key.clone());
        let replicas = self.ring.replicas(&key);

        loop {
            let mut not_found = 0;

            for &shard in &replicas {
                match self.call(shard, &request) {
                    Ok(response) if response.is_invalid_request() => {
                        return Err(RingError::InvalidRequest(response.message().to_string()));
                    }
                    Ok(response) if response.is_not_found() => not_found += 1,
                    Ok(response) if response.is_success() => {
                        return Ok(Some(response.result.unwrap_or(Value::Null)));
                    }
                    Ok(response) => {
                        tracing::warn!("lookup on server {} failed: {}", shard, response.message())
                    }
                    Err(e) => tracing::warn!("lookup on server {} failed: {}", shard, e),
                }
            }

            if not_found == replicas.len() {
                return Ok(None);
            }

            tracing::warn!("lookup incomplete, retrying in {:?}", self.config.retry_backoff);
            thread::sleep(self.config.retry_backoff);
            for &shard in &replicas {
                self.reresolve(shard);
            }
        }
    }

    /// Every pair on any server whose key matches `pattern`
    ///
    /// All servers are queried concurrently and their answers merged by
    /// key, so a pair held by several replicas appears once.
    pub fn scan(&self, pattern: impl Into<Value>) -> Result<BTreeMap<String, Value>> {
        let request = RequestBody::scan(pattern);
        let abort = AtomicBool::new(false);

        let joined = crossbeam::thread::scope(|scope| {
            let workers: Vec<_> = (0..self.ring.servers())
                .map(|shard| {
                    let request = &request;
                    let abort = &abort;
                    scope.spawn(move |_| self.settle(shard, request, Some(abort)))
                })
                .collect();

            workers
                .into_iter()
                .map(|worker| worker.join())
                .collect::<Vec<_>>()
        })
        .map_err(|_| RingError::Worker("scan fan-out panicked".into()))?;

        let mut responses = Vec::with_capacity(joined.len());
        for result in joined {
            let response = result.map_err(|_| RingError::Worker("scan worker panicked".into()))?;
            responses.extend(response);
        }

        if let Some(rejected) = responses.iter().find(|r| r.is_invalid_request()) {
            return Err(RingError::InvalidRequest(rejected.message().to_string()));
        }

        let mut merged = BTreeMap::new();
        for response in responses {
            let pairs: Vec<(String, Value)> =
                serde_json::from_value(response.result.unwrap_or(Value::Array(Vec::new())))
                    .map_err(|e| RingError::Protocol(format!("malformed scan result: {e}")))?;
            merged.extend(pairs);
        }
        Ok(merged)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Current address of server `shard`
    pub fn address(&self, shard: usize) -> Option<ServerAddress> {
        self.slots.get(shard).map(|slot| slot.lock().address.clone())
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Resend to one server until it answers with anything but `Failure`
    ///
    /// Returns None only if `abort` was raised by another worker.
    fn settle(
        &self,
        shard: usize,
        request: &RequestBody,
        abort: Option<&AtomicBool>,
    ) -> Option<Response> {
        let aborted = || abort.is_some_and(|flag| flag.load(Ordering::SeqCst));

        loop {
            if aborted() {
                return None;
            }

            match self.call(shard, request) {
                Ok(response) if response.is_invalid_request() => {
                    if let Some(flag) = abort {
                        flag.store(true, Ordering::SeqCst);
                    }
                    return Some(response);
                }
                Ok(response) if !response.is_failure() => return Some(response),
                Ok(response) => tracing::warn!(
                    "{} on server {} failed: {}; retrying in {:?}",
                    request.method,
                    shard,
                    response.message(),
                    self.config.retry_backoff
                ),
                Err(e) => tracing::warn!(
                    "{} on server {} failed: {}; retrying in {:?}",
                    request.method,
                    shard,
                    e,
                    self.config.retry_backoff
                ),
            }

            thread::sleep(self.config.retry_backoff);
            self.reresolve(shard);
        }
    }

    /// One request/response exchange with server `shard`
    ///
    /// A cached connection that fails is replaced once straight away; a
    /// server restart should not cost a full backoff. Removes are not
    /// resent this way: the failed send may have been applied, and the
    /// caller's retry loop owns that decision.
    fn call(&self, shard: usize, request: &RequestBody) -> Result<Response> {
        let mut guard = self.slots[shard].lock();
        let slot = &mut *guard;

        if let Some(client) = slot.client.as_mut() {
            match client.send(request) {
                Ok(response) => return Ok(response),
                Err(e) => {
                    slot.client = None;
                    if request.method == Method::Remove {
                        return Err(e);
                    }
                    tracing::debug!("Connection to {} went stale ({}), reconnecting", slot.name, e);
                }
            }
        }

        let mut client = Client::connect(&slot.address, self.config.connect_timeout)?;
        let response = client.send(request)?;
        slot.client = Some(client);
        Ok(response)
    }

    /// Ask the catalog for a server's current address
    fn reresolve(&self, shard: usize) {
        let name = self.slots[shard].lock().name.clone();

        match self.discovery.query(&name) {
            Ok(Some(address)) => {
                let mut slot = self.slots[shard].lock();
                if slot.address != address {
                    tracing::info!("{} moved from {} to {}", name, slot.address, address);
                    slot.address = address;
                    slot.client = None;
                }
            }
            Ok(None) => tracing::warn!("{} is no longer listed in the catalog", name),
            Err(e) => tracing::warn!("Re-resolving {} failed: {}", name, e),
        }
    }
}
