// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for blueprints.

use crate::pin::{Pin, PinDirection, PinId, PinType, PinValue};
use serde::{Deserialize, Serialize};

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Node behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Starts execution
    Entry,
    /// Chooses the exit flow from a boolean condition
    Branch,
    /// Writes a value to the context output
    Print,
    /// Constant boolean
    ConstBool(bool),
    /// Constant integer
    ConstInt32(i32),
    /// Integer addition
    AddInt32,
    /// Formats any value as a string
    ToString,
}

/// Pin shape used when instantiating a node kind
struct PinTemplate {
    name: &'static str,
    pin_type: PinType,
    default_value: Option<PinValue>,
}

impl PinTemplate {
    fn flow() -> Self {
        Self::new("", PinType::Flow)
    }

    fn new(name: &'static str, pin_type: PinType) -> Self {
        Self {
            name,
            pin_type,
            default_value: None,
        }
    }

    fn with_default(mut self, value: PinValue) -> Self {
        self.default_value = Some(value);
        self
    }
}

impl NodeKind {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Branch => "Branch",
            Self::Print => "Print",
            Self::ConstBool(_) => "Const Bool",
            Self::ConstInt32(_) => "Const Int32",
            Self::AddInt32 => "Add",
            Self::ToString => "To String",
        }
    }

    /// Whether the node takes part in execution flow.
    ///
    /// Nodes without flow pins are pure and only run when one of their
    /// outputs is pulled.
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::Entry | Self::Branch | Self::Print)
    }

    fn pin_templates(&self) -> (Vec<PinTemplate>, Vec<PinTemplate>) {
        match self {
            Self::Entry => (Vec::new(), vec![PinTemplate::flow()]),
            Self::Branch => (
                vec![
                    PinTemplate::flow(),
                    PinTemplate::new("Condition", PinType::Bool)
                        .with_default(PinValue::Bool(false)),
                ],
                vec![
                    PinTemplate::new("True", PinType::Flow),
                    PinTemplate::new("False", PinType::Flow),
                ],
            ),
            Self::Print => (
                vec![
                    PinTemplate::flow(),
                    PinTemplate::new("Value", PinType::Any)
                        .with_default(PinValue::String(String::new())),
                ],
                vec![PinTemplate::flow()],
            ),
            Self::ConstBool(_) => (Vec::new(), vec![PinTemplate::new("", PinType::Bool)]),
            Self::ConstInt32(_) => (Vec::new(), vec![PinTemplate::new("", PinType::Int32)]),
            Self::AddInt32 => (
                vec![
                    PinTemplate::new("A", PinType::Int32).with_default(PinValue::Int32(0)),
                    PinTemplate::new("B", PinType::Int32).with_default(PinValue::Int32(0)),
                ],
                vec![PinTemplate::new("Result", PinType::Int32)],
            ),
            Self::ToString => (
                vec![PinTemplate::new("Value", PinType::Any)],
                vec![PinTemplate::new("", PinType::String)],
            ),
        }
    }
}

/// A node instance in a blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node behavior
    pub kind: NodeKind,
    /// Display name (can be customized)
    pub name: String,
    /// Position in the editor canvas
    pub position: [f32; 2],
    /// Input pins
    pub inputs: Vec<Pin>,
    /// Output pins
    pub outputs: Vec<Pin>,
}

impl Node {
    /// Create a node of the given kind.
    ///
    /// `next_id` hands out ids for the node and then each pin in order.
    pub fn new(kind: NodeKind, mut next_id: impl FnMut() -> u32) -> Self {
        let id = NodeId(next_id());
        let (input_templates, output_templates) = kind.pin_templates();

        let mut make_pins = |templates: Vec<PinTemplate>, direction: PinDirection| {
            templates
                .into_iter()
                .map(|template| {
                    let pin = Pin::new(
                        PinId(next_id()),
                        id,
                        template.name,
                        template.pin_type,
                        direction,
                    );
                    match template.default_value {
                        Some(value) => pin.with_default(value),
                        None => pin,
                    }
                })
                .collect::<Vec<_>>()
        };

        let inputs = make_pins(input_templates, PinDirection::Input);
        let outputs = make_pins(output_templates, PinDirection::Output);

        Self {
            id,
            name: kind.name().to_string(),
            kind,
            position: [0.0, 0.0],
            inputs,
            outputs,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Get an input pin by index
    pub fn input(&self, index: usize) -> Option<&Pin> {
        self.inputs.get(index)
    }

    /// Get an output pin by index
    pub fn output(&self, index: usize) -> Option<&Pin> {
        self.outputs.get(index)
    }

    /// Get a pin by ID
    pub fn pin(&self, pin_id: PinId) -> Option<&Pin> {
        self.pins().find(|p| p.id == pin_id)
    }

    /// Get a mutable pin by ID
    pub fn pin_mut(&mut self, pin_id: PinId) -> Option<&mut Pin> {
        self.inputs
            .iter_mut()
            .chain(self.outputs.iter_mut())
            .find(|p| p.id == pin_id)
    }

    /// Get all pins
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// First flow input, where execution enters the node
    pub fn flow_input(&self) -> Option<&Pin> {
        self.inputs.iter().find(|p| p.is_flow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> impl FnMut() -> u32 {
        let mut next = 0;
        move || {
            next += 1;
            next
        }
    }

    #[test]
    fn test_node_ids_then_pins() {
        let node = Node::new(NodeKind::Branch, counter());
        assert_eq!(node.id, NodeId(1));
        assert_eq!(node.inputs[0].id, PinId(2));
        assert_eq!(node.inputs[1].id, PinId(3));
        assert_eq!(node.outputs[0].id, PinId(4));
        assert_eq!(node.outputs[1].id, PinId(5));
        assert!(node.pins().all(|p| p.node == node.id));
    }

    #[test]
    fn test_default_values_applied() {
        let node = Node::new(NodeKind::AddInt32, counter());
        assert_eq!(node.inputs[0].default_value, Some(PinValue::Int32(0)));
        assert_eq!(node.outputs[0].default_value, None);
        assert_eq!(node.name, "Add");
    }

    #[test]
    fn test_flow_input() {
        let print = Node::new(NodeKind::Print, counter());
        assert!(print.flow_input().is_some_and(Pin::is_flow));

        let constant = Node::new(NodeKind::ConstInt32(3), counter());
        assert!(constant.flow_input().is_none());
        assert!(!constant.kind.is_executable());
    }
}
