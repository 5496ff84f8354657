// SPDX-License-Identifier: MIT OR Apache-2.0
//! Blueprint evaluation and execution.

use crate::blueprint::Blueprint;
use crate::node::{Node, NodeId, NodeKind};
use crate::pin::{Pin, PinId, PinValue};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Receives a notification for every pin the evaluator touches
pub trait EvaluationObserver {
    /// Called after `pin` was evaluated.
    ///
    /// For flow pins this is the moment execution passes through the pin,
    /// for data pins the moment its value was produced.
    fn on_pin_evaluated(&mut self, context: &Context, pin: &Pin);
}

/// Handle returned by [`Context::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Execution state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    /// Nothing started
    #[default]
    Idle,
    /// Stepping through nodes
    Running,
    /// The last node had no exit flow
    Done,
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Another node is scheduled
    Continue,
    /// Execution finished
    Done,
}

/// Step evaluator state for one run of a blueprint.
///
/// The context does not hold the blueprint, so the blueprint can still be
/// edited between steps.
#[derive(Default)]
pub struct Context {
    state: ExecutionState,
    current_node: Option<NodeId>,
    next_node: Option<NodeId>,
    current_flow_pin: Option<PinId>,
    step_count: u64,
    values: HashMap<PinId, PinValue>,
    /// Outputs being pulled right now
    pulling: HashSet<PinId>,
    output: Vec<String>,
    observers: Vec<(ObserverId, Rc<RefCell<dyn EvaluationObserver>>)>,
    last_observer_id: u64,
}

impl Context {
    /// Create an idle context
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer
    pub fn subscribe(&mut self, observer: Rc<RefCell<dyn EvaluationObserver>>) -> ObserverId {
        self.last_observer_id += 1;
        let id = ObserverId(self.last_observer_id);
        self.observers.push((id, observer));
        id
    }

    /// Unregister an observer, returns false if it was not registered
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Current execution state
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Node executed by the last step
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    /// Node the next step will execute
    pub fn next_node(&self) -> Option<NodeId> {
        self.next_node
    }

    /// Flow output pin execution left the current node through
    pub fn current_flow_pin(&self) -> Option<PinId> {
        self.current_flow_pin
    }

    /// Number of nodes executed since start
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Last value produced for a pin
    pub fn value(&self, pin_id: PinId) -> Option<&PinValue> {
        self.values.get(&pin_id)
    }

    /// Lines written by print nodes
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Start execution at an entry node
    pub fn start(&mut self, blueprint: &Blueprint, entry: NodeId) -> Result<(), EvaluationError> {
        let node = blueprint
            .node(entry)
            .ok_or(EvaluationError::NodeNotFound(entry))?;
        if node.kind != NodeKind::Entry {
            return Err(EvaluationError::NotAnEntry(entry));
        }

        self.values.clear();
        self.pulling.clear();
        self.output.clear();
        self.step_count = 0;
        self.current_node = Some(entry);
        self.state = ExecutionState::Running;

        let exit = node.outputs.iter().find(|p| p.is_flow()).map(|p| p.id);
        self.leave_through(blueprint, exit);

        tracing::debug!("Started execution at {:?}", entry);
        Ok(())
    }

    /// Execute the next scheduled node
    pub fn step(&mut self, blueprint: &Blueprint) -> Result<StepResult, EvaluationError> {
        if self.state != ExecutionState::Running {
            return Ok(StepResult::Done);
        }

        let Some(node_id) = self.next_node.take() else {
            self.state = ExecutionState::Done;
            return Ok(StepResult::Done);
        };

        let node = blueprint
            .node(node_id)
            .ok_or(EvaluationError::NodeNotFound(node_id))?;

        self.current_node = Some(node_id);
        self.step_count += 1;

        if let Some(entry_pin) = node.flow_input() {
            self.notify(entry_pin);
        }

        let exit = self.execute(blueprint, node)?;
        self.leave_through(blueprint, exit);

        tracing::debug!(
            "Step {}: executed {} ({:?}), next {:?}",
            self.step_count,
            node.name,
            node_id,
            self.next_node
        );

        if self.next_node.is_some() {
            Ok(StepResult::Continue)
        } else {
            self.state = ExecutionState::Done;
            Ok(StepResult::Done)
        }
    }

    /// Run until done or until `max_steps` nodes were executed
    pub fn run(&mut self, blueprint: &Blueprint, max_steps: u64) -> Result<StepResult, EvaluationError> {
        for _ in 0..max_steps {
            if self.step(blueprint)? == StepResult::Done {
                return Ok(StepResult::Done);
            }
        }
        Ok(StepResult::Continue)
    }

    fn leave_through(&mut self, blueprint: &Blueprint, exit: Option<PinId>) {
        self.current_flow_pin = exit;
        self.next_node = exit
            .and_then(|pin| blueprint.links_from(pin).next())
            .map(|link| link.to_node);

        if let Some(pin) = exit.and_then(|pin| blueprint.pin(pin)) {
            self.notify(pin);
        }
    }

    /// Perform a node's action, returning the flow pin execution leaves by
    fn execute(&mut self, blueprint: &Blueprint, node: &Node) -> Result<Option<PinId>, EvaluationError> {
        let exit = match node.kind {
            NodeKind::Entry => node.output(0),
            NodeKind::Branch => {
                let condition = self.evaluate_input(blueprint, node, 1)?;
                let condition = condition
                    .as_bool()
                    .ok_or_else(|| EvaluationError::TypeMismatch(node.inputs[1].id))?;
                node.output(if condition { 0 } else { 1 })
            }
            NodeKind::Print => {
                let value = self.evaluate_input(blueprint, node, 1)?;
                tracing::info!("{}", value);
                self.output.push(value.to_string());
                node.output(0)
            }
            _ => return Err(EvaluationError::NotExecutable(node.id)),
        };
        Ok(exit.map(|pin| pin.id))
    }

    fn evaluate_input(
        &mut self,
        blueprint: &Blueprint,
        node: &Node,
        index: usize,
    ) -> Result<PinValue, EvaluationError> {
        let pin = node
            .input(index)
            .ok_or(EvaluationError::NodeNotFound(node.id))?;

        let value = match blueprint.link_to(pin.id) {
            Some(link) => self.evaluate_output(blueprint, link.from_pin)?,
            None => pin
                .default_value
                .clone()
                .ok_or(EvaluationError::MissingInput(pin.id))?,
        };

        self.values.insert(pin.id, value.clone());
        self.notify(pin);
        Ok(value)
    }

    /// Pull the value of a pure node's output
    fn evaluate_output(&mut self, blueprint: &Blueprint, pin_id: PinId) -> Result<PinValue, EvaluationError> {
        if !self.pulling.insert(pin_id) {
            return Err(EvaluationError::CycleDetected(pin_id));
        }
        let value = self.compute_output(blueprint, pin_id);
        self.pulling.remove(&pin_id);
        value
    }

    fn compute_output(&mut self, blueprint: &Blueprint, pin_id: PinId) -> Result<PinValue, EvaluationError> {
        let pin = blueprint
            .pin(pin_id)
            .ok_or(EvaluationError::PinNotFound(pin_id))?;
        let node = blueprint
            .node(pin.node)
            .ok_or(EvaluationError::NodeNotFound(pin.node))?;

        let value = match node.kind {
            NodeKind::ConstBool(value) => PinValue::Bool(value),
            NodeKind::ConstInt32(value) => PinValue::Int32(value),
            NodeKind::AddInt32 => {
                let mut sum = 0i32;
                for index in 0..node.inputs.len() {
                    let operand = self.evaluate_input(blueprint, node, index)?;
                    let operand = operand
                        .as_i32()
                        .ok_or_else(|| EvaluationError::TypeMismatch(node.inputs[index].id))?;
                    sum = sum.wrapping_add(operand);
                }
                PinValue::Int32(sum)
            }
            NodeKind::ToString => PinValue::String(self.evaluate_input(blueprint, node, 0)?.to_string()),
            // Outputs of executable nodes hold what their last execution produced
            _ => self
                .values
                .get(&pin_id)
                .cloned()
                .ok_or(EvaluationError::MissingInput(pin_id))?,
        };

        self.values.insert(pin_id, value.clone());
        self.notify(pin);
        Ok(value)
    }

    fn notify(&self, pin: &Pin) {
        for (_, observer) in &self.observers {
            observer.borrow_mut().on_pin_evaluated(self, pin);
        }
    }
}

/// Error during evaluation
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Pin not found
    #[error("Pin not found: {0:?}")]
    PinNotFound(PinId),

    /// Execution can only start at entry nodes
    #[error("Node is not an entry node: {0:?}")]
    NotAnEntry(NodeId),

    /// Pure nodes cannot be scheduled for execution
    #[error("Node has no flow: {0:?}")]
    NotExecutable(NodeId),

    /// Missing required input
    #[error("Missing required input: {0:?}")]
    MissingInput(PinId),

    /// Value of the wrong type
    #[error("Type mismatch on pin {0:?}")]
    TypeMismatch(PinId),

    /// An output depends on its own value
    #[error("Data cycle through pin {0:?}")]
    CycleDetected(PinId),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Entry -> Branch(cond) -> True: Print(ToString(Add(2, 3)))
    fn sample(condition: bool) -> (Blueprint, NodeId) {
        let mut blueprint = Blueprint::new("Sample");
        let entry = blueprint.add_node(NodeKind::Entry);
        let branch = blueprint.add_node(NodeKind::Branch);
        let cond = blueprint.add_node(NodeKind::ConstBool(condition));
        let two = blueprint.add_node(NodeKind::ConstInt32(2));
        let three = blueprint.add_node(NodeKind::ConstInt32(3));
        let add = blueprint.add_node(NodeKind::AddInt32);
        let to_string = blueprint.add_node(NodeKind::ToString);
        let print = blueprint.add_node(NodeKind::Print);

        let pin = |bp: &Blueprint, node: NodeId, output: bool, index: usize| {
            let node = bp.node(node).unwrap();
            if output { node.outputs[index].id } else { node.inputs[index].id }
        };

        let links = [
            (pin(&blueprint, entry, true, 0), pin(&blueprint, branch, false, 0)),
            (pin(&blueprint, cond, true, 0), pin(&blueprint, branch, false, 1)),
            (pin(&blueprint, branch, true, 0), pin(&blueprint, print, false, 0)),
            (pin(&blueprint, two, true, 0), pin(&blueprint, add, false, 0)),
            (pin(&blueprint, three, true, 0), pin(&blueprint, add, false, 1)),
            (pin(&blueprint, add, true, 0), pin(&blueprint, to_string, false, 0)),
            (pin(&blueprint, to_string, true, 0), pin(&blueprint, print, false, 1)),
        ];
        for (from, to) in links {
            blueprint.connect(from, to).unwrap();
        }

        (blueprint, entry)
    }

    #[derive(Default)]
    struct Recorder {
        pins: Vec<PinId>,
        current_nodes: Vec<Option<NodeId>>,
    }

    impl EvaluationObserver for Recorder {
        fn on_pin_evaluated(&mut self, context: &Context, pin: &Pin) {
            self.pins.push(pin.id);
            self.current_nodes.push(context.current_node());
        }
    }

    #[test]
    fn test_run_true_branch() {
        let (blueprint, entry) = sample(true);
        let mut context = Context::new();
        context.start(&blueprint, entry).unwrap();

        assert_eq!(context.state(), ExecutionState::Running);
        assert_eq!(context.run(&blueprint, 10).unwrap(), StepResult::Done);
        assert_eq!(context.output(), ["5"]);
        assert_eq!(context.step_count(), 2);
        assert_eq!(context.state(), ExecutionState::Done);
    }

    #[test]
    fn test_false_branch_stops_after_branch() {
        let (blueprint, entry) = sample(false);
        let mut context = Context::new();
        context.start(&blueprint, entry).unwrap();

        assert_eq!(context.step(&blueprint).unwrap(), StepResult::Done);
        assert!(context.output().is_empty());
        assert!(context.next_node().is_none());
        // The false exit is still reported as the flow pin taken
        assert!(context.current_flow_pin().is_some());
    }

    #[test]
    fn test_step_tracks_current_and_next() {
        let (blueprint, entry) = sample(true);
        let branch = blueprint.nodes().nth(1).unwrap().id;
        let print = blueprint.nodes().last().unwrap().id;

        let mut context = Context::new();
        context.start(&blueprint, entry).unwrap();
        assert_eq!(context.current_node(), Some(entry));
        assert_eq!(context.next_node(), Some(branch));

        assert_eq!(context.step(&blueprint).unwrap(), StepResult::Continue);
        assert_eq!(context.current_node(), Some(branch));
        assert_eq!(context.next_node(), Some(print));
    }

    #[test]
    fn test_observers_see_every_pin() {
        let (blueprint, entry) = sample(true);
        let recorder = Rc::new(RefCell::new(Recorder::default()));

        let mut context = Context::new();
        let id = context.subscribe(recorder.clone());
        context.start(&blueprint, entry).unwrap();
        context.step(&blueprint).unwrap();

        {
            let recorder = recorder.borrow();
            // entry exit, branch flow in, condition source, condition, branch exit
            assert_eq!(recorder.pins.len(), 5);
            assert_eq!(recorder.current_nodes[0], Some(entry));
        }

        assert!(context.unsubscribe(id));
        assert!(!context.unsubscribe(id));
        context.step(&blueprint).unwrap();
        assert_eq!(recorder.borrow().pins.len(), 5);
    }

    #[test]
    fn test_start_requires_entry() {
        let (blueprint, _) = sample(true);
        let branch = blueprint.nodes().nth(1).unwrap().id;
        let mut context = Context::new();
        assert_eq!(
            context.start(&blueprint, branch),
            Err(EvaluationError::NotAnEntry(branch))
        );
        assert_eq!(
            context.start(&blueprint, NodeId(999)),
            Err(EvaluationError::NodeNotFound(NodeId(999)))
        );
    }

    #[test]
    fn test_unlinked_inputs_use_defaults() {
        let mut blueprint = Blueprint::new("Defaults");
        let entry = blueprint.add_node(NodeKind::Entry);
        let print = blueprint.add_node(NodeKind::Print);
        let from = blueprint.node(entry).unwrap().outputs[0].id;
        let to = blueprint.node(print).unwrap().inputs[0].id;
        blueprint.connect(from, to).unwrap();

        let mut context = Context::new();
        context.start(&blueprint, entry).unwrap();
        context.run(&blueprint, 4).unwrap();
        assert_eq!(context.output(), [""]);
    }

    #[test]
    fn test_data_cycle_is_an_error() {
        let mut blueprint = Blueprint::new("Cycle");
        let entry = blueprint.add_node(NodeKind::Entry);
        let print = blueprint.add_node(NodeKind::Print);
        let first = blueprint.add_node(NodeKind::AddInt32);
        let second = blueprint.add_node(NodeKind::AddInt32);
        let to_string = blueprint.add_node(NodeKind::ToString);
        let output = |bp: &Blueprint, node: NodeId| bp.node(node).unwrap().outputs[0].id;
        let input = |bp: &Blueprint, node: NodeId, index: usize| bp.node(node).unwrap().inputs[index].id;

        blueprint
            .connect(output(&blueprint, entry), input(&blueprint, print, 0))
            .unwrap();
        blueprint
            .connect(output(&blueprint, first), input(&blueprint, second, 0))
            .unwrap();
        blueprint
            .connect(output(&blueprint, second), input(&blueprint, to_string, 0))
            .unwrap();
        blueprint
            .connect(output(&blueprint, to_string), input(&blueprint, print, 1))
            .unwrap();
        // Loaded files may carry a cycle the editor would refuse
        blueprint.link_unchecked(output(&blueprint, second), input(&blueprint, first, 0));

        let mut context = Context::new();
        context.start(&blueprint, entry).unwrap();
        assert_eq!(
            context.run(&blueprint, 4),
            Err(EvaluationError::CycleDetected(output(&blueprint, second)))
        );
        assert!(context.output().is_empty());
    }
}
