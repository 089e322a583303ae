//! Quest Graph - the node and pin arena a quest is authored in.
//!
//! Nodes own their pins; pins refer to peers by id only. Removing a node
//! erases its pins from the arena, which turns every peer reference to them
//! stale. Stale references are filtered whenever connections are read.
//!
//! The main line of a quest, like the child chain of a sequence, is a
//! single chain: each node has at most one successor on its first execution
//! output. Branching is expressed with sequence nodes, not with the chain.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    GraphError, GraphResult, NodeId, ObjectiveKind, ObjectiveNode, Pin, PinCategory,
    PinDirection, PinId,
};

/// Arena of objective nodes and their pins.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuestGraph {
    nodes: HashMap<NodeId, ObjectiveNode>,
    pins: HashMap<PinId, Pin>,
    /// Node insertion order.
    order: Vec<NodeId>,
}

impl QuestGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, allocating its pins from its kind and settings.
    ///
    /// Entry nodes get a single execution output. Every other node gets an
    /// execution input and output; sequences also get a sequence output, and
    /// one optional output is allocated per declared optional.
    pub fn add_node(&mut self, mut node: ObjectiveNode) -> NodeId {
        let id = node.id;
        node.input = None;
        node.outputs.clear();
        node.optional_outputs.clear();

        if !node.kind.is_entry() {
            let pin = Pin::new(id, PinDirection::Input, PinCategory::Execution, "in");
            node.input = Some(pin.id);
            self.pins.insert(pin.id, pin);
        }

        let exec = Pin::new(id, PinDirection::Output, PinCategory::Execution, "out");
        node.outputs.push(exec.id);
        self.pins.insert(exec.id, exec);

        if matches!(node.kind, ObjectiveKind::Sequence(_)) {
            let seq = Pin::new(id, PinDirection::Output, PinCategory::Sequence, "sequence");
            node.outputs.push(seq.id);
            self.pins.insert(seq.id, seq);
        }

        for label in &node.settings.optionals {
            let pin = Pin::new(id, PinDirection::Output, PinCategory::Optional, label.clone());
            node.optional_outputs.push(pin.id);
            self.pins.insert(pin.id, pin);
        }

        self.order.push(id);
        self.nodes.insert(id, node);
        id
    }

    /// Allocate an extra output pin on an existing node.
    pub fn add_output_pin(
        &mut self,
        node: NodeId,
        category: PinCategory,
        name: impl Into<String>,
    ) -> GraphResult<PinId> {
        let owner = self
            .nodes
            .get_mut(&node)
            .ok_or(GraphError::UnknownNode(node))?;
        let pin = Pin::new(node, PinDirection::Output, category, name);
        let id = pin.id;
        if pin.category == PinCategory::Optional {
            owner.optional_outputs.push(id);
        } else {
            owner.outputs.push(id);
        }
        self.pins.insert(id, pin);
        Ok(id)
    }

    /// Remove a node and its pins.
    ///
    /// Peers are not touched; their references to the removed pins go stale.
    pub fn remove_node(&mut self, id: NodeId) -> Option<ObjectiveNode> {
        let node = self.nodes.remove(&id)?;
        for pin in node.pins() {
            self.pins.remove(&pin);
        }
        self.order.retain(|n| *n != id);
        Some(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&ObjectiveNode> {
        self.nodes.get(&id)
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(&id)
    }

    pub fn contains_pin(&self, id: PinId) -> bool {
        self.pins.contains_key(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ObjectiveNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node owning a pin, if the pin is still alive.
    pub fn pin_owner(&self, pin: PinId) -> Option<NodeId> {
        self.pins.get(&pin).map(|p| p.owner)
    }

    /// The first entry node in insertion order.
    pub fn entry_node(&self) -> Option<NodeId> {
        self.nodes().find(|n| n.is_entry()).map(|n| n.id)
    }

    /// Connect two pins on both sides.
    ///
    /// Connecting an already-connected pair is a no-op.
    pub fn connect(&mut self, a: PinId, b: PinId) -> GraphResult<()> {
        if a == b {
            return Err(GraphError::SelfConnection(a));
        }
        let dir_a = self.pins.get(&a).ok_or(GraphError::UnknownPin(a))?.direction;
        let dir_b = self.pins.get(&b).ok_or(GraphError::UnknownPin(b))?.direction;
        if dir_a == dir_b {
            return Err(GraphError::SameDirection(a, b));
        }

        if let Some(pin) = self.pins.get_mut(&a) {
            pin.add_connection(b);
        }
        if let Some(pin) = self.pins.get_mut(&b) {
            pin.add_connection(a);
        }
        Ok(())
    }

    /// Remove a connection from both sides. Returns true if either side held it.
    pub fn disconnect(&mut self, a: PinId, b: PinId) -> bool {
        let mut removed = false;
        if let Some(pin) = self.pins.get_mut(&a) {
            removed |= pin.remove_connection(b);
        }
        if let Some(pin) = self.pins.get_mut(&b) {
            removed |= pin.remove_connection(a);
        }
        removed
    }

    /// Drop every connection of a pin, on both sides.
    pub fn disconnect_all(&mut self, pin: PinId) {
        let peers = match self.pins.get_mut(&pin) {
            Some(p) => {
                let peers = p.connections().to_vec();
                p.clear_connections();
                peers
            }
            None => return,
        };
        for peer in peers {
            if let Some(p) = self.pins.get_mut(&peer) {
                p.remove_connection(pin);
            }
        }
    }

    /// Live connections of a pin. Stale ids are skipped; an unknown pin has none.
    pub fn valid_connections(&self, pin: PinId) -> Vec<PinId> {
        self.pins
            .get(&pin)
            .map(|p| {
                p.connections()
                    .iter()
                    .copied()
                    .filter(|id| self.pins.contains_key(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn first_valid_connection(&self, pin: PinId) -> Option<PinId> {
        let p = self.pins.get(&pin)?;
        p.connections()
            .iter()
            .copied()
            .find(|id| self.pins.contains_key(id))
    }

    /// Permanently remove stale ids from a pin. Returns how many were dropped.
    pub fn cleanup_stale_connections(&mut self, pin: PinId) -> usize {
        let Self { pins, .. } = self;
        let alive: Vec<PinId> = match pins.get(&pin) {
            Some(p) => p
                .connections()
                .iter()
                .copied()
                .filter(|id| pins.contains_key(id))
                .collect(),
            None => return 0,
        };
        match pins.get_mut(&pin) {
            Some(p) => p.retain_connections(|id| alive.contains(&id)),
            None => 0,
        }
    }

    /// Run [`Self::cleanup_stale_connections`] over every pin.
    pub fn cleanup_all_stale_connections(&mut self) -> usize {
        let ids: Vec<PinId> = self.pins.keys().copied().collect();
        ids.into_iter()
            .map(|id| self.cleanup_stale_connections(id))
            .sum()
    }

    /// First output of a node carrying the given category.
    pub fn find_output_by_category(&self, node: NodeId, category: &PinCategory) -> Option<PinId> {
        let node = self.nodes.get(&node)?;
        node.outputs
            .iter()
            .chain(node.optional_outputs.iter())
            .copied()
            .find(|id| self.pins.get(id).is_some_and(|p| &p.category == category))
    }

    /// Node reached through the first live connection of a pin.
    pub fn next_from_pin(&self, pin: PinId) -> Option<NodeId> {
        self.first_valid_connection(pin)
            .and_then(|peer| self.pin_owner(peer))
    }

    /// Successor of a node along its first execution output.
    pub fn next_in_chain(&self, node: NodeId) -> Option<NodeId> {
        let out = self.find_output_by_category(node, &PinCategory::Execution)?;
        self.next_from_pin(out)
    }

    /// Connect `from`'s main execution output to `to`'s input.
    pub fn link(&mut self, from: NodeId, to: NodeId) -> GraphResult<()> {
        self.link_output(from, 0, to)
    }

    /// Connect output `index` of `from` to `to`'s input.
    pub fn link_output(&mut self, from: NodeId, index: usize, to: NodeId) -> GraphResult<()> {
        let out = self.output_pin(from, index)?;
        let input = self.input_pin(to)?;
        self.connect(out, input)
    }

    /// Connect a sequence's fan-out pin to the first child of its chain.
    pub fn link_sequence(&mut self, sequence: NodeId, child: NodeId) -> GraphResult<()> {
        let out = self
            .find_output_by_category(sequence, &PinCategory::Sequence)
            .ok_or(GraphError::MissingPin {
                node: sequence,
                what: "sequence",
                index: 0,
            })?;
        let input = self.input_pin(child)?;
        self.connect(out, input)
    }

    /// Attach `optional` to optional output `index` of `parent`.
    pub fn link_optional(
        &mut self,
        parent: NodeId,
        index: usize,
        optional: NodeId,
    ) -> GraphResult<()> {
        let out = self
            .nodes
            .get(&parent)
            .ok_or(GraphError::UnknownNode(parent))?
            .optional_outputs
            .get(index)
            .copied()
            .ok_or(GraphError::MissingPin {
                node: parent,
                what: "optional",
                index,
            })?;
        let input = self.input_pin(optional)?;
        self.connect(out, input)
    }

    fn output_pin(&self, node: NodeId, index: usize) -> GraphResult<PinId> {
        self.nodes
            .get(&node)
            .ok_or(GraphError::UnknownNode(node))?
            .outputs
            .get(index)
            .copied()
            .ok_or(GraphError::MissingPin {
                node,
                what: "output",
                index,
            })
    }

    fn input_pin(&self, node: NodeId) -> GraphResult<PinId> {
        self.nodes
            .get(&node)
            .ok_or(GraphError::UnknownNode(node))?
            .input
            .ok_or(GraphError::MissingPin {
                node,
                what: "input",
                index: 0,
            })
    }
}
