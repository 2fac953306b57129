//! Error types for graph mutation, document import/export, the node catalog and configuration.

use thiserror::Error;

use crate::model::{EdgeId, NodeId, PortDirection, PortKey};

/// Reasons a connection request is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// Source and target belong to the same node
    #[error("cannot connect a node to itself")]
    SelfLoop,

    /// Both endpoints are inputs, or both are outputs
    #[error("cannot connect two {0} ports")]
    SameDirection(PortDirection),

    /// Endpoint does not name an existing port on an existing node
    #[error("unknown port {0}")]
    UnknownPort(PortKey),

    /// Source type does not flow into target type
    #[error("incompatible types: {source_type} cannot connect to {target_type}")]
    IncompatibleType {
        source_type: String,
        target_type: String,
    },

    /// Target accepts a single connection and already has one
    #[error("input {0} is already connected")]
    InputAlreadyConnected(PortKey),

    /// An identical edge already exists
    #[error("edge already exists")]
    DuplicateEdge,
}

/// Errors raised while building or exporting a workflow document.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    #[error("duplicate edge id: {0}")]
    DuplicateEdgeId(EdgeId),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("edge {0} references a missing port")]
    DanglingEdge(EdgeId),

    #[error("edge {0} must run from an output to an input")]
    InvalidEdgeDirection(EdgeId),

    #[error("edge {0} repeats a connection or feeds an already connected input")]
    ConflictingEdge(EdgeId),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid editor configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Node catalog payload errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid node catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("node {0} is listed more than once")]
    DuplicateNode(String),
}
