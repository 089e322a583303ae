//! Errors raised while building or editing a quest graph.

use thiserror::Error;

use crate::{NodeId, PinId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown pin: {0}")]
    UnknownPin(PinId),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("pins {0} and {1} share a direction and cannot be connected")]
    SameDirection(PinId, PinId),

    #[error("pin {0} cannot be connected to itself")]
    SelfConnection(PinId),

    #[error("node {node} has no {what} pin at index {index}")]
    MissingPin {
        node: NodeId,
        what: &'static str,
        index: usize,
    },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
