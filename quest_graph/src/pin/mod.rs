//! Pins - directed connection points on objective nodes.
//!
//! A pin stores its connections as plain ids into the owning graph's pin
//! arena. Nothing here keeps a peer alive: when a node is removed its pins
//! leave the arena and every id still pointing at them goes stale. Readers
//! filter stale ids through [`crate::QuestGraph::valid_connections`].

use serde::{Deserialize, Serialize};

use crate::{NodeId, PinId};

/// Which way execution flows through a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
}

impl PinDirection {
    pub fn opposite(self) -> Self {
        match self {
            PinDirection::Input => PinDirection::Output,
            PinDirection::Output => PinDirection::Input,
        }
    }
}

/// Category tag carried by a pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PinCategory {
    /// Main-line execution flow.
    #[default]
    Execution,
    /// Fan-out into the children of a sequence objective.
    Sequence,
    /// Side-objective attached to the owning node.
    Optional,
    /// Anything a host defines for its own objective kinds.
    Custom(String),
}

impl PinCategory {
    pub fn custom(name: impl Into<String>) -> Self {
        PinCategory::Custom(name.into())
    }

    /// Short label used in logs and default pin names.
    pub fn as_str(&self) -> &str {
        match self {
            PinCategory::Execution => "exec",
            PinCategory::Sequence => "sequence",
            PinCategory::Optional => "optional",
            PinCategory::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for PinCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed connection point owned by exactly one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    pub name: String,
    pub direction: PinDirection,
    pub category: PinCategory,
    pub owner: NodeId,
    /// Peers this pin links to. May contain stale ids after node removal.
    connections: Vec<PinId>,
}

impl Pin {
    /// Create an unconnected pin.
    pub fn new(
        owner: NodeId,
        direction: PinDirection,
        category: PinCategory,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: PinId::new(),
            name: name.into(),
            direction,
            category,
            owner,
            connections: Vec::new(),
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }

    /// Raw connection list, stale entries included.
    pub fn connections(&self) -> &[PinId] {
        &self.connections
    }

    pub fn is_connected_to(&self, other: PinId) -> bool {
        self.connections.contains(&other)
    }

    /// Add one side of a connection. Returns false if it was already present.
    ///
    /// Prefer [`crate::QuestGraph::connect`], which keeps both sides in sync.
    pub fn add_connection(&mut self, other: PinId) -> bool {
        if self.connections.contains(&other) {
            return false;
        }
        self.connections.push(other);
        true
    }

    /// Remove one side of a connection. Returns false if it was not present.
    pub fn remove_connection(&mut self, other: PinId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|id| *id != other);
        before != self.connections.len()
    }

    /// Drop every connection for which `is_alive` returns false.
    ///
    /// Returns the number of entries removed.
    pub fn retain_connections(&mut self, mut is_alive: impl FnMut(PinId) -> bool) -> usize {
        let before = self.connections.len();
        self.connections.retain(|id| is_alive(*id));
        before - self.connections.len()
    }

    pub(crate) fn clear_connections(&mut self) {
        self.connections.clear();
    }
}
