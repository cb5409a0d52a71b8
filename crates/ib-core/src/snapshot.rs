//! Read-only board export for hosts (document export, debugging).

use crate::model::{EdgeRef, IdeaGraph, IdeaNode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub use_case: Option<String>,
    /// Nodes in creation order.
    pub nodes: Vec<IdeaNode>,
    pub edges: Vec<EdgeRef>,
}

impl BoardSnapshot {
    pub fn capture(graph: &IdeaGraph, use_case: Option<&str>) -> Self {
        Self {
            use_case: use_case.map(str::to_string),
            nodes: graph.nodes().into_iter().cloned().collect(),
            edges: graph.edges(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}
