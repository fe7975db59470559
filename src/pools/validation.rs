//! Node state transitions within a pool
//!
//! Pure functions only: whether an action is legal is decided from the node
//! identity, the action and the pool's `basic` section, nothing else.

use std::fmt;

use crate::error::{Result, StingrayError};
use crate::resources::BasicProperties;

/// Actions a caller can request for a node in a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Drain,
    Undrain,
    Add,
    Remove,
}

impl NodeAction {
    /// Field of the `basic` section the action writes to
    pub fn field(&self) -> &'static str {
        match self {
            NodeAction::Drain | NodeAction::Undrain => "draining",
            NodeAction::Add | NodeAction::Remove => "nodes",
        }
    }

    /// Prefix for errors reported by the traffic manager on write
    pub fn error_label(&self) -> &'static str {
        match self {
            NodeAction::Drain => "Drain error",
            NodeAction::Undrain => "Undrain error",
            NodeAction::Add => "Add node error",
            NodeAction::Remove => "Remove node error",
        }
    }
}

impl fmt::Display for NodeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeAction::Drain => "drain",
            NodeAction::Undrain => "undrain",
            NodeAction::Add => "add",
            NodeAction::Remove => "remove",
        };
        f.write_str(s)
    }
}

/// Node identity as used by the API: `address:port`, no normalisation.
pub fn node_identity(address: &str, port: u16) -> String {
    format!("{}:{}", address, port)
}

/// Check whether `action` is legal for `node` given the pool's current state.
pub fn validate_node(
    node: &str,
    action: NodeAction,
    pool: &str,
    basic: &BasicProperties,
) -> Result<()> {
    match action {
        NodeAction::Drain => {
            if !basic.contains_node(node) {
                return Err(not_in_pool(node, pool));
            }
            if basic.is_draining(node) {
                return Err(StingrayError::ValidationError(format!(
                    "{} is already draining",
                    node
                )));
            }
        }
        NodeAction::Undrain => {
            if !basic.is_draining(node) {
                return Err(StingrayError::ValidationError(format!(
                    "{} is not draining",
                    node
                )));
            }
        }
        NodeAction::Add => {
            if basic.contains_node(node) {
                return Err(StingrayError::NodeAlreadyExists {
                    node: node.to_string(),
                    pool: pool.to_string(),
                });
            }
        }
        NodeAction::Remove => {
            if !basic.contains_node(node) {
                return Err(not_in_pool(node, pool));
            }
        }
    }
    Ok(())
}

/// Apply an already validated action to the `basic` section.
pub fn apply_action(node: &str, action: NodeAction, basic: &mut BasicProperties) {
    match action {
        NodeAction::Drain => basic.draining.push(node.to_string()),
        NodeAction::Undrain => {
            if let Some(idx) = basic.draining.iter().position(|n| n == node) {
                basic.draining.remove(idx);
            }
        }
        NodeAction::Add => basic.nodes.push(node.to_string()),
        NodeAction::Remove => {
            if let Some(idx) = basic.nodes.iter().position(|n| n == node) {
                basic.nodes.remove(idx);
            }
            // draining must stay a subset of nodes
            basic.draining.retain(|n| n != node);
        }
    }
}

/// Validate and apply a batch of actions against a copy of `basic`.
///
/// Each node is checked against the state left by the nodes before it, so a
/// node repeated in the batch is rejected on its second occurrence. The
/// original is never touched; on error nothing is returned to commit.
pub fn stage_batch<S: AsRef<str>>(
    nodes: &[S],
    action: NodeAction,
    pool: &str,
    basic: &BasicProperties,
) -> Result<BasicProperties> {
    let mut staged = basic.clone();
    for node in nodes {
        let node = node.as_ref();
        validate_node(node, action, pool, &staged)?;
        apply_action(node, action, &mut staged);
    }
    Ok(staged)
}

fn not_in_pool(node: &str, pool: &str) -> StingrayError {
    StingrayError::NodeNotInPool {
        node: node.to_string(),
        pool: pool.to_string(),
    }
}
