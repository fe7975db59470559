//! Structured documents exchanged with the traffic manager REST API
//!
//! Every body the API returns is one of:
//! - a child listing (`{"children": [{"name": ..., "href": ...}]}`)
//! - an error document (`{"error_id": ..., "error_text": ..., "error_info": {...}}`)
//! - a configuration or statistics document
//!
//! Fields that the API only sometimes includes are modelled as `Option` or
//! `#[serde(default)]` so that decoding never assumes presence.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StingrayError};

/// Pool configuration collection
pub const POOLS_BASE: &str = "/config/active/pools";

/// Status and statistics root
pub const STATUS_BASE: &str = "/status";

/// Suffix appended to a cluster member's `href` to list per-pool node statistics
pub const PER_POOL_NODE_SUFFIX: &str = "statistics/nodes/per_pool_node/";

/// One entry of a child listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub name: String,
    #[serde(default)]
    pub href: String,
}

impl ChildRef {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

/// A listing of child resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildList {
    #[serde(default)]
    pub children: Vec<ChildRef>,
}

/// Error payload returned in place of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub error_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<Value>,
}

impl ErrorDocument {
    /// Detect an error document without assuming the body is an object.
    pub fn from_body(body: &Value) -> Option<Self> {
        if body.get("error_id").is_none() {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }

    /// Error text reported for one field of a configuration section.
    ///
    /// Looks up `error_info.<section>.<field>.error_text`.
    pub fn field_error(&self, section: &str, field: &str) -> Option<&str> {
        self.error_info
            .as_ref()?
            .get(section)?
            .get(field)?
            .get("error_text")?
            .as_str()
    }
}

/// Pool configuration document
///
/// Only `properties.basic.nodes` and `properties.basic.draining` are
/// interpreted; everything else is carried through untouched so the document
/// can be written back as the API returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub properties: PoolProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolProperties {
    #[serde(default)]
    pub basic: BasicProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `basic` section of a pool: membership and draining state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicProperties {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub draining: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BasicProperties {
    pub fn contains_node(&self, node: &str) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    pub fn is_draining(&self, node: &str) -> bool {
        self.draining.iter().any(|n| n == node)
    }
}

/// Decode a body into `T`, failing with `Parse` when it is absent or malformed.
pub fn decode<T: serde::de::DeserializeOwned>(body: Option<Value>) -> Result<T> {
    let body = body.ok_or_else(|| StingrayError::Parse("empty response body".to_string()))?;
    serde_json::from_value(body).map_err(|e| StingrayError::Parse(e.to_string()))
}

/// Path of a single pool's configuration, with the name percent-encoded
pub fn pool_path(name: &str) -> String {
    format!("{}/{}", POOLS_BASE, encode_segment(name))
}

/// Percent-encode one URL path segment (`/`, `?`, `#`, `%`, spaces...)
pub fn encode_segment(segment: &str) -> String {
    let mut url = match Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return segment.to_string(),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(segment);
    }
    url.path().trim_start_matches('/').to_string()
}
