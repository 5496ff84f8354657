// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step-debugging overlay.
//!
//! The overlay observes a blueprint evaluation [`Context`] and highlights the
//! node that just ran, the node scheduled next and the pins execution passed
//! through. Highlights are drawn into a background channel so they sit
//! behind node content:
//!
//! ```ignore
//! overlay.begin(&mut list);
//! for node in nodes {
//!     // draw node content into `list`
//!     overlay.draw_node(&mut list, node.id, rect, rounding);
//! }
//! overlay.end(&mut list);
//! ```

use crate::draw::DrawList;
use blueprint_script::{Context, EvaluationObserver, NodeId, ObserverId, Pin, PinId};
use egui::{Color32, Rect, Rounding};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

const CURRENT_NODE_COLOR: Color32 = Color32::from_rgb(255, 176, 50);
const NEXT_NODE_COLOR: Color32 = Color32::from_rgb(100, 180, 255);
const FLOW_PIN_COLOR: Color32 = Color32::from_rgb(255, 230, 80);
const DATA_PIN_COLOR: Color32 = Color32::from_rgb(120, 220, 120);

/// What the evaluator was doing at its last pin event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationTrace {
    /// Node executed by the last step
    pub current_node: Option<NodeId>,
    /// Node the next step will execute
    pub next_node: Option<NodeId>,
    /// Flow pin execution left the current node through
    pub current_flow_pin: Option<PinId>,
    /// Step the pins below belong to
    pub step: u64,
    /// Pins evaluated during `step`, in order
    pub evaluated_pins: Vec<PinId>,
}

impl EvaluationTrace {
    /// Whether `pin` was evaluated during the last step
    pub fn was_evaluated(&self, pin: PinId) -> bool {
        self.evaluated_pins.contains(&pin)
    }
}

impl EvaluationObserver for EvaluationTrace {
    fn on_pin_evaluated(&mut self, context: &Context, pin: &Pin) {
        if context.step_count() != self.step || context.current_node() != self.current_node {
            self.evaluated_pins.clear();
        }
        self.current_node = context.current_node();
        self.next_node = context.next_node();
        self.current_flow_pin = context.current_flow_pin();
        self.step = context.step_count();
        self.evaluated_pins.push(pin.id);
    }
}

/// Draws evaluation highlights over the blueprint
#[derive(Debug, Default)]
pub struct DebugOverlay {
    trace: Rc<RefCell<EvaluationTrace>>,
    subscription: Option<ObserverId>,
    drawing: bool,
}

impl DebugOverlay {
    /// A detached overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing `context`
    pub fn attach(&mut self, context: &mut Context) {
        if self.subscription.is_some() {
            return;
        }
        let observer: Rc<RefCell<dyn EvaluationObserver>> = self.trace.clone();
        self.subscription = Some(context.subscribe(observer));
    }

    /// Stop observing `context`; returns false if not attached to it
    pub fn detach(&mut self, context: &mut Context) -> bool {
        self.subscription
            .take()
            .is_some_and(|id| context.unsubscribe(id))
    }

    /// Whether the overlay is subscribed to a context
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Snapshot of the last pin event
    pub fn trace(&self) -> EvaluationTrace {
        self.trace.borrow().clone()
    }

    /// Split `list` so highlights land behind content drawn until [`Self::end`].
    /// Does nothing while no node is executing.
    pub fn begin(&mut self, list: &mut DrawList) {
        if self.trace.borrow().current_node.is_none() {
            return;
        }
        list.split(2);
        list.set_channel(1);
        self.drawing = true;
    }

    /// Merge the highlights below the content
    pub fn end(&mut self, list: &mut DrawList) {
        if self.drawing {
            list.merge();
            self.drawing = false;
        }
    }

    /// Outline `node` if it is executing or scheduled next
    pub fn draw_node(&self, list: &mut DrawList, node: NodeId, rect: Rect, rounding: f32) {
        if !self.drawing {
            return;
        }
        let trace = self.trace.borrow();
        let (color, thickness) = if trace.current_node == Some(node) {
            (CURRENT_NODE_COLOR, 3.0)
        } else if trace.next_node == Some(node) {
            (NEXT_NODE_COLOR, 2.0)
        } else {
            return;
        };

        Self::in_background(list, |list| {
            let rounding = Rounding::same(rounding);
            list.add_rect_filled(rect.expand(thickness), color.gamma_multiply(0.15), rounding);
            list.add_rect(rect.expand(thickness), color, rounding, thickness);
        });
    }

    /// Mark an input pin that execution enters through or that was pulled
    pub fn draw_input_pin(&self, list: &mut DrawList, pin: &Pin, rect: Rect) {
        if !self.drawing {
            return;
        }
        let trace = self.trace.borrow();
        let color = if pin.is_flow() && trace.next_node == Some(pin.node) {
            FLOW_PIN_COLOR
        } else if !pin.is_flow() && trace.was_evaluated(pin.id) {
            DATA_PIN_COLOR
        } else {
            return;
        };
        Self::in_background(list, |list| Self::mark_pin(list, rect, color));
    }

    /// Mark the output pin execution left through, or a produced value
    pub fn draw_output_pin(&self, list: &mut DrawList, pin: &Pin, rect: Rect) {
        if !self.drawing {
            return;
        }
        let trace = self.trace.borrow();
        let color = if trace.current_flow_pin == Some(pin.id) {
            FLOW_PIN_COLOR
        } else if !pin.is_flow() && trace.was_evaluated(pin.id) {
            DATA_PIN_COLOR
        } else {
            return;
        };
        Self::in_background(list, |list| Self::mark_pin(list, rect, color));
    }

    fn mark_pin(list: &mut DrawList, rect: Rect, color: Color32) {
        let rounding = Rounding::same(rect.height() * 0.5);
        list.add_rect_filled(rect.expand(2.0), color.gamma_multiply(0.25), rounding);
        list.add_rect(rect.expand(2.0), color, rounding, 1.5);
    }

    fn in_background(list: &mut DrawList, draw: impl FnOnce(&mut DrawList)) {
        list.set_channel(0);
        draw(list);
        list.set_channel(1);
    }
}

impl Drop for DebugOverlay {
    fn drop(&mut self) {
        if self.subscription.is_some() {
            tracing::warn!("debug overlay dropped while still attached to a context");
        }
    }
}
