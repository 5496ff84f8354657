// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint node editor widgets.
//!
//! This crate builds blueprint-style node boxes inside an immediate-mode
//! frame loop:
//! - Node builder driving a header/content/pin-column layout per node
//! - Pin scopes anchored left for inputs and right for outputs
//! - Create/delete interaction queries
//! - Step-debugging overlays fed by blueprint evaluation events
//!
//! ## Architecture
//!
//! The widgets never own layout or canvas state. They talk to two seams,
//! passed in explicitly every frame through an [`EditorFrame`]:
//! - [`LayoutContext`]: the immediate-mode cursor and layout group stack
//! - [`NodeCanvas`]: node/pin/link identities, style and pending interactions
//!
//! [`StackLayout`] and [`EditorCanvas`] are in-memory implementations of both.

pub mod canvas;
pub mod debug_overlay;
pub mod draw;
pub mod editor_canvas;
pub mod frame;
pub mod ids;
pub mod interaction;
pub mod layout;
pub mod node_builder;
pub mod pin;
pub mod pin_value;
pub mod stack_layout;
pub mod stage;

#[cfg(test)]
mod testing;

pub use canvas::{CanvasStyle, DeletedLink, NodeCanvas, StyleVar};
pub use debug_overlay::{DebugOverlay, EvaluationTrace};
pub use draw::{CornerFlags, DrawCommand, DrawList};
pub use editor_canvas::EditorCanvas;
pub use frame::EditorFrame;
pub use ids::{LinkId, NodeId, PinId};
pub use interaction::{ItemBuilder, ItemDeleter, LinkDeleter, NewLinkBuilder, NewNodeBuilder, NodeDeleter};
pub use layout::{Axis, GroupId, LayoutContext, LayoutStyle};
pub use node_builder::{BlueprintNodeBuilder, HeaderTexture};
pub use pin::PinKind;
pub use pin_value::PinValueBackgroundRenderer;
pub use stack_layout::StackLayout;
pub use stage::{NodeRects, Stage, StageMachine};
