//! Cluster-wide node statistics
//!
//! A traffic manager cluster reports statistics per member. To get a single
//! view of a pool's nodes the aggregator:
//! 1. lists cluster members from `/status`, dropping the local member
//! 2. fetches every member's per-pool-node listing
//! 3. unions the listings and keeps entries belonging to the pool
//! 4. fetches each retained entry's statistics document

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{Method, Transport};
use crate::error::{Result, StingrayError};
use crate::resources::{
    decode, ChildList, ChildRef, ErrorDocument, PER_POOL_NODE_SUFFIX, STATUS_BASE,
};

/// Name the API gives the member answering the request
pub const LOCAL_MEMBER: &str = "local_tm";

/// Per-node statistics keyed by node identity
pub type NodeStatistics = HashMap<String, Value>;

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Drop the local member, keeping server order.
pub fn exclude_local_member(members: Vec<ChildRef>) -> Vec<ChildRef> {
    members
        .into_iter()
        .filter(|m| m.name != LOCAL_MEMBER)
        .collect()
}

/// Listing path for a member's per-pool-node statistics
pub fn per_pool_node_path(member: &ChildRef) -> String {
    format!("{}{}", member.href, PER_POOL_NODE_SUFFIX)
}

/// Union member listings in member order, keeping only entries of `pool`.
///
/// Membership is a substring test on the entry's `href`, so `web` also
/// matches entries of `web-v2`.
pub fn entries_for_pool(listings: Vec<Vec<ChildRef>>, pool: &str) -> Vec<ChildRef> {
    listings
        .into_iter()
        .flatten()
        .filter(|entry| entry.href.contains(pool))
        .collect()
}

// ============================================================================
// I/O boundary
// ============================================================================

/// Polls every cluster member through one transport session
#[derive(Clone)]
pub struct ClusterAggregator {
    transport: Arc<dyn Transport>,
}

impl ClusterAggregator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// All cluster members except the local one, in server order.
    pub async fn poll_all_members(&self) -> Result<Vec<ChildRef>> {
        let members = self.get_listing(STATUS_BASE).await?;
        let members = exclude_local_member(members);
        debug!("Polled {} cluster members", members.len());
        Ok(members)
    }

    /// Statistics for every node of `pool`, merged across all members.
    pub async fn node_details_for_pool(&self, pool: &str) -> Result<NodeStatistics> {
        let members = self.poll_all_members().await?;

        let listings = try_join_all(
            members
                .iter()
                .map(|member| self.get_listing_owned(per_pool_node_path(member))),
        )
        .await?;

        let entries = entries_for_pool(listings, pool);

        let documents = try_join_all(entries.iter().map(|entry| self.get_document(&entry.href)))
            .await?;

        let mut details = NodeStatistics::new();
        for (entry, document) in entries.into_iter().zip(documents) {
            details.insert(entry.name, document);
        }

        info!(
            "Collected statistics for {} nodes of pool {} from {} members",
            details.len(),
            pool,
            members.len()
        );
        Ok(details)
    }

    async fn get_listing_owned(&self, path: String) -> Result<Vec<ChildRef>> {
        self.get_listing(&path).await
    }

    async fn get_listing(&self, path: &str) -> Result<Vec<ChildRef>> {
        let body = self.get_document(path).await?;
        let list: ChildList = decode(Some(body))?;
        Ok(list.children)
    }

    async fn get_document(&self, path: &str) -> Result<Value> {
        let response = self.transport.execute(Method::Get, path, None).await?;
        let body = response.body.unwrap_or(Value::Null);

        if let Some(err) = ErrorDocument::from_body(&body) {
            return Err(StingrayError::ResourceNotFound(format!(
                "{}: {}",
                path,
                err.error_text.unwrap_or(err.error_id)
            )));
        }
        if !(200..300).contains(&response.status) {
            return Err(StingrayError::Http(format!(
                "HTTP {} for {}",
                response.status, path
            )));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::mock::MockTransport;
    use crate::client::ApiResponse;
    use serde_json::json;

    fn member(name: &str) -> ChildRef {
        ChildRef::new(name, format!("/api/tm/2.0/status/{}/", name))
    }

    fn listing_entry(pool: &str, node: &str, tm: &str) -> Value {
        json!({
            "name": format!("{}-{}", pool, node),
            "href": format!(
                "/api/tm/2.0/status/{}/statistics/nodes/per_pool_node/{}-{}",
                tm, pool, node
            ),
        })
    }

    fn two_member_cluster() -> MockTransport {
        MockTransport::new()
            .route(
                Method::Get,
                "/status",
                ApiResponse::ok(json!({"children": [
                    {"name": "tm1", "href": "/api/tm/2.0/status/tm1/"},
                    {"name": "local_tm", "href": "/api/tm/2.0/status/local_tm/"},
                    {"name": "tm2", "href": "/api/tm/2.0/status/tm2/"},
                ]})),
            )
            .route(
                Method::Get,
                "/api/tm/2.0/status/tm1/statistics/nodes/per_pool_node/",
                ApiResponse::ok(json!({"children": [
                    listing_entry("pool-A", "10.0.0.1:80", "tm1"),
                    listing_entry("pool-B", "10.0.1.1:80", "tm1"),
                ]})),
            )
            .route(
                Method::Get,
                "/api/tm/2.0/status/tm2/statistics/nodes/per_pool_node/",
                ApiResponse::ok(json!({"children": [
                    listing_entry("pool-A", "10.0.0.2:80", "tm2"),
                ]})),
            )
            .route(
                Method::Get,
                "/api/tm/2.0/status/tm1/statistics/nodes/per_pool_node/pool-A-10.0.0.1:80",
                ApiResponse::ok(json!({"statistics": {"state": "alive", "tm": "tm1"}})),
            )
            .route(
                Method::Get,
                "/api/tm/2.0/status/tm2/statistics/nodes/per_pool_node/pool-A-10.0.0.2:80",
                ApiResponse::ok(json!({"statistics": {"state": "alive", "tm": "tm2"}})),
            )
    }

    #[test]
    fn test_exclude_local_member() {
        let members = vec![member("tm1"), member("local_tm"), member("tm2")];
        let filtered = exclude_local_member(members);
        let names: Vec<_> = filtered.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["tm1", "tm2"]);
    }

    #[test]
    fn test_exclude_local_member_only_local() {
        assert!(exclude_local_member(vec![member("local_tm")]).is_empty());
    }

    #[test]
    fn test_per_pool_node_path() {
        assert_eq!(
            per_pool_node_path(&member("tm1")),
            "/api/tm/2.0/status/tm1/statistics/nodes/per_pool_node/"
        );
    }

    #[test]
    fn test_entries_for_pool_unions_all_listings() {
        let a = vec![ChildRef::new("a", "/x/pool-A-a"), ChildRef::new("b", "/x/pool-B-b")];
        let b = vec![ChildRef::new("c", "/y/pool-A-c")];
        let entries = entries_for_pool(vec![a, b], "pool-A");
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_entries_for_pool_substring_match() {
        let listing = vec![ChildRef::new("a", "/x/web-v2-a")];
        assert_eq!(entries_for_pool(vec![listing], "web").len(), 1);
    }

    #[tokio::test]
    async fn test_poll_all_members_excludes_local() {
        let aggregator = ClusterAggregator::new(Arc::new(two_member_cluster()));
        let members = aggregator.poll_all_members().await.unwrap();
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["tm1", "tm2"]);
    }

    #[tokio::test]
    async fn test_node_details_merges_every_member() {
        let aggregator = ClusterAggregator::new(Arc::new(two_member_cluster()));
        let details = aggregator.node_details_for_pool("pool-A").await.unwrap();

        assert_eq!(details.len(), 2);
        assert_eq!(
            details["pool-A-10.0.0.1:80"]["statistics"]["tm"],
            json!("tm1")
        );
        assert_eq!(
            details["pool-A-10.0.0.2:80"]["statistics"]["tm"],
            json!("tm2")
        );
        assert!(!details.contains_key("pool-B-10.0.1.1:80"));
    }

    #[tokio::test]
    async fn test_node_details_never_polls_local_member() {
        let mock = Arc::new(two_member_cluster());
        let aggregator = ClusterAggregator::new(mock.clone());
        aggregator.node_details_for_pool("pool-A").await.unwrap();

        assert!(mock.calls().iter().all(|c| !c.path.contains("local_tm")));
        assert_eq!(mock.write_count(), 0);
    }

    #[tokio::test]
    async fn test_node_details_unknown_pool_is_empty() {
        let aggregator = ClusterAggregator::new(Arc::new(two_member_cluster()));
        let details = aggregator.node_details_for_pool("pool-Z").await.unwrap();
        assert!(details.is_empty());
    }

    #[tokio::test]
    async fn test_missing_status_is_not_found() {
        let aggregator = ClusterAggregator::new(Arc::new(MockTransport::new()));
        let result = aggregator.poll_all_members().await;
        assert!(matches!(result, Err(StingrayError::ResourceNotFound(_))));
    }
}
