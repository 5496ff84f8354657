// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint scripting model for the blueprint editor.
//!
//! This crate provides the small visual-scripting collaborator the editor
//! widgets are exercised against:
//! - Typed flow and data pins with default values
//! - Nodes built from a fixed set of kinds
//! - Link validation
//! - A step evaluator that reports every evaluated pin to observers
//!
//! ## Evaluation
//!
//! Flow pins are pushed: each step executes one node and follows its exit
//! flow link. Data pins are pulled: an input reads its linked output (or its
//! default value) when the executing node needs it.

pub mod blueprint;
pub mod context;
pub mod link;
pub mod node;
pub mod pin;

pub use blueprint::{Blueprint, LinkError};
pub use context::{
    Context, EvaluationError, EvaluationObserver, ExecutionState, ObserverId, StepResult,
};
pub use link::{Link, LinkId};
pub use node::{Node, NodeId, NodeKind};
pub use pin::{Pin, PinDirection, PinId, PinType, PinValue};
