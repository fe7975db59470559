//! Pool registry and pool state
//!
//! [`Pools`] lists, fetches and deletes pools. [`Pool`] is a snapshot of one
//! pool's configuration: every mutation validates against the snapshot,
//! stages the change on a copy and only commits it once the traffic manager
//! has accepted the write.
//!
//! A `Pool` is never cached; each [`Pools::get_pool`] returns a fresh
//! snapshot that may already be stale if someone else edits the pool.

pub mod validation;

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::client::{ApiResponse, Method, Transport};
use crate::cluster::{ClusterAggregator, NodeStatistics};
use crate::error::{Result, StingrayError};
use crate::resources::{
    decode, pool_path, BasicProperties, ChildList, ErrorDocument, PoolConfig, POOLS_BASE,
};

pub use validation::{apply_action, node_identity, stage_batch, validate_node, NodeAction};

/// Pool registry backed by one transport session
#[derive(Clone)]
pub struct Pools {
    transport: Arc<dyn Transport>,
}

impl Pools {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Names of all configured pools, in server order.
    pub async fn list_pools(&self) -> Result<Vec<String>> {
        let response = self.transport.execute(Method::Get, POOLS_BASE, None).await?;
        if let Some(err) = response.body.as_ref().and_then(ErrorDocument::from_body) {
            return Err(StingrayError::Http(format!(
                "listing pools failed: {}",
                err.error_text.unwrap_or(err.error_id)
            )));
        }
        let list: ChildList = decode(response.body)?;
        Ok(list.children.into_iter().map(|c| c.name).collect())
    }

    /// Fetch a fresh snapshot of one pool.
    pub async fn get_pool(&self, name: &str) -> Result<Pool> {
        let response = self
            .transport
            .execute(Method::Get, &pool_path(name), None)
            .await?;

        let not_found = || StingrayError::ResourceNotFound(format!("{} does not exist", name));

        let body = response.body.ok_or_else(not_found)?;
        if ErrorDocument::from_body(&body).is_some() {
            return Err(not_found());
        }
        let config: PoolConfig = decode(Some(body))?;

        Ok(Pool {
            transport: self.transport.clone(),
            name: name.to_string(),
            config,
        })
    }

    /// Delete a pool.
    ///
    /// Only a 204 counts as deleted; any other status is reported as
    /// `ResourceNotFound`, whatever the real cause.
    pub async fn delete_pool(&self, name: &str) -> Result<bool> {
        let response = self
            .transport
            .execute(Method::Delete, &pool_path(name), None)
            .await?;

        if response.status == 204 {
            info!("Deleted pool {}", name);
            return Ok(true);
        }

        warn!("Delete of pool {} returned HTTP {}", name, response.status);
        Err(StingrayError::ResourceNotFound(format!(
            "{} does not exist",
            name
        )))
    }
}

/// Snapshot of one pool's configuration.
///
/// Mutations take `&mut self`, so a snapshot has exactly one writer at a time.
pub struct Pool {
    transport: Arc<dyn Transport>,
    name: String,
    config: PoolConfig,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

impl Pool {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full configuration document
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[String] {
        &self.config.properties.basic.nodes
    }

    pub fn draining(&self) -> &[String] {
        &self.config.properties.basic.draining
    }

    /// Nodes receiving new traffic, in node order
    pub fn active_nodes(&self) -> Vec<&str> {
        let basic = &self.config.properties.basic;
        basic
            .nodes
            .iter()
            .filter(|n| !basic.is_draining(n))
            .map(|n| n.as_str())
            .collect()
    }

    /// Put nodes into draining state with a single write.
    pub async fn drain_nodes<S: AsRef<str>>(&mut self, nodes: &[S]) -> Result<PoolConfig> {
        self.submit_batch(nodes, NodeAction::Drain).await
    }

    /// Return draining nodes to active state with a single write.
    pub async fn undrain_nodes<S: AsRef<str>>(&mut self, nodes: &[S]) -> Result<PoolConfig> {
        self.submit_batch(nodes, NodeAction::Undrain).await
    }

    /// Add `address:port` to the pool. The node starts active.
    pub async fn add_node(&mut self, address: &str, port: u16) -> Result<PoolConfig> {
        let node = node_identity(address, port);
        self.submit_batch(&[node], NodeAction::Add).await
    }

    pub async fn remove_node(&mut self, address: &str, port: u16) -> Result<PoolConfig> {
        let node = node_identity(address, port);
        self.submit_batch(&[node], NodeAction::Remove).await
    }

    /// Statistics of this pool's nodes across every cluster member
    pub async fn node_details(&self) -> Result<NodeStatistics> {
        ClusterAggregator::new(self.transport.clone())
            .node_details_for_pool(&self.name)
            .await
    }

    async fn submit_batch<S: AsRef<str>>(
        &mut self,
        nodes: &[S],
        action: NodeAction,
    ) -> Result<PoolConfig> {
        let staged = stage_batch(nodes, action, &self.name, &self.config.properties.basic)?;
        let candidate = self.with_basic(staged);

        let document =
            serde_json::to_value(&candidate).map_err(|e| StingrayError::Parse(e.to_string()))?;
        let response = self
            .transport
            .execute(Method::Put, &pool_path(&self.name), Some(&document))
            .await?;

        if response.status != 200 {
            let message = write_error_message(&response, action);
            warn!("{} on pool {} rejected: {}", action, self.name, message);
            return Err(StingrayError::ValidationError(format!(
                "{}: {}",
                action.error_label(),
                message
            )));
        }

        let updated = match response.body {
            Some(body) => decode(Some(body))?,
            None => candidate,
        };
        self.config = updated;

        info!(
            "{} on pool {} applied to {} node(s)",
            action,
            self.name,
            nodes.len()
        );
        Ok(self.config.clone())
    }

    fn with_basic(&self, basic: BasicProperties) -> PoolConfig {
        let mut config = self.config.clone();
        config.properties.basic = basic;
        config
    }
}

/// Message for a rejected write.
///
/// Prefers the per-field error the API reports under `error_info.basic`,
/// then the document's own `error_text`, then the bare status.
fn write_error_message(response: &ApiResponse, action: NodeAction) -> String {
    let document = response.body.as_ref().and_then(ErrorDocument::from_body);
    match document {
        Some(err) => err
            .field_error("basic", action.field())
            .map(str::to_string)
            .or(err.error_text)
            .unwrap_or(err.error_id),
        None => response
            .body
            .as_ref()
            .and_then(|b| b.get("error_text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", response.status)),
    }
}
