//! Client for the Stingray traffic manager REST API
//!
//! Pool and node lifecycle operations with local validation of every state
//! transition, plus cluster-wide aggregation of node statistics.

pub mod cli;
pub mod client;
pub mod cluster;
pub mod context;
pub mod error;
pub mod pools;
pub mod resources;

pub use client::{ConnectionSettings, HttpClient, Transport};
pub use cluster::ClusterAggregator;
pub use error::StingrayError;
pub use pools::{Pool, Pools};
