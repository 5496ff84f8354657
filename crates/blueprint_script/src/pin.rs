// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub u32);

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    /// Input pin
    Input,
    /// Output pin
    Output,
}

/// Type of the values that flow through a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinType {
    /// Accepts any data value
    Any,
    /// Execution flow
    Flow,
    /// Boolean value
    Bool,
    /// 32-bit integer
    Int32,
    /// Floating point value
    Float,
    /// String value
    String,
}

impl PinType {
    /// Get the color for this pin type (for UI)
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Any => [220, 48, 48],
            Self::Flow => [255, 255, 255],
            Self::Bool => [220, 48, 48],
            Self::Int32 => [68, 201, 156],
            Self::Float => [147, 226, 74],
            Self::String => [124, 21, 153],
        }
    }

    /// Check if this type can connect to another type
    pub fn can_connect_to(&self, other: &PinType) -> bool {
        match (self, other) {
            (Self::Flow, Self::Flow) => true,
            (Self::Flow, _) | (_, Self::Flow) => false,
            (Self::Any, _) | (_, Self::Any) => true,
            // Numeric conversions
            (Self::Int32, Self::Float) | (Self::Float, Self::Int32) => true,
            _ => self == other,
        }
    }
}

/// A pin on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// Unique pin ID
    pub id: PinId,
    /// Owning node
    pub node: NodeId,
    /// Pin name, empty for the unnamed flow pins
    pub name: String,
    /// Pin direction
    pub direction: PinDirection,
    /// Value type
    pub pin_type: PinType,
    /// Value used when an input is not linked
    pub default_value: Option<PinValue>,
}

impl Pin {
    /// Create a new pin
    pub fn new(
        id: PinId,
        node: NodeId,
        name: impl Into<String>,
        pin_type: PinType,
        direction: PinDirection,
    ) -> Self {
        Self {
            id,
            node,
            name: name.into(),
            direction,
            pin_type,
            default_value: None,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: PinValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Whether this pin carries execution flow
    pub fn is_flow(&self) -> bool {
        self.pin_type == PinType::Flow
    }

    /// Whether this pin accepts at most one link.
    ///
    /// A data input reads a single source and a flow output continues
    /// into a single node.
    pub fn is_exclusive(&self) -> bool {
        match self.direction {
            PinDirection::Input => !self.is_flow(),
            PinDirection::Output => self.is_flow(),
        }
    }

    /// Check if a link to another pin is valid
    pub fn can_connect(&self, other: &Pin) -> bool {
        if self.direction == other.direction {
            return false;
        }

        self.pin_type.can_connect_to(&other.pin_type)
    }
}

/// Value that can be stored in a pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PinValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int32(i32),
    /// Float
    Float(f32),
    /// String
    String(String),
}

impl PinValue {
    /// Get the pin type for this value
    pub fn pin_type(&self) -> PinType {
        match self {
            Self::Bool(_) => PinType::Bool,
            Self::Int32(_) => PinType::Int32,
            Self::Float(_) => PinType::Float,
            Self::String(_) => PinType::String,
        }
    }

    /// Read as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Read as an integer, truncating floats
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(value) => Some(*value),
            Self::Float(value) => Some(*value as i32),
            _ => None,
        }
    }
}

impl fmt::Display for PinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int32(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}
