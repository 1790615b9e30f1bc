//! The two-level planner: an outer A* over goal-tree cursors whose every
//! edge is resolved by an inner A* over arm primitives.
//!
//! A high-level node pairs a goal cursor with a world snapshot. Expanding it
//! asks the goal tree for candidate sub-goals, runs a low-level search for
//! each, and turns each success into one edge whose tokens are an English
//! annotation followed by the primitive sequence, at the low-level path
//! cost.

use std::time::Instant;

use enum_iterator::all;
use log::{debug, info};
use thiserror::Error;

use crate::action::{Action, Plan, PlanToken};
use crate::dnf::DnfFormula;
use crate::goal::{GoalIx, GoalTree};
use crate::interpret::Interpretation;
use crate::search::{self, SearchLimits, SearchOutcome, SearchSpace, astar};
use crate::world::{World, WorldState};

#[derive(Clone, Debug)]
pub struct PlanOptions {
    pub low_timeout: std::time::Duration,
    pub high_timeout: std::time::Duration,
    pub cancel: tokio_util::sync::CancellationToken,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            low_timeout: search::DEFAULT_TIMEOUT,
            high_timeout: search::DEFAULT_TIMEOUT,
            cancel: tokio_util::sync::CancellationToken::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("I could not plan that in time")]
    Timeout,
    #[error("I do not see how: {0}")]
    Unachievable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A winning plan and the index of the interpretation it realises.
#[derive(Debug)]
pub struct Planned {
    pub interpretation: usize,
    pub plan: Plan,
}

/// Low-level search space: world snapshots under the four primitives, unit
/// cost, aimed at one sub-goal.
struct PrimitiveSpace<'a> {
    world: &'a World,
    tree: &'a GoalTree,
    target: GoalIx,
}

impl SearchSpace for PrimitiveSpace<'_> {
    type Node = WorldState;
    type Step = Action;

    fn key(&self, node: &Self::Node) -> String {
        node.key()
    }

    fn successors(&mut self, node: &Self::Node) -> Vec<(Self::Step, Self::Node, usize)> {
        all::<Action>()
            .filter_map(|action| action.apply(self.world, node).ok().map(|next| (action, next, 1)))
            .collect()
    }

    fn is_goal(&self, node: &Self::Node) -> bool {
        self.tree.fulfilled(self.target, self.world, node)
    }

    fn heuristic(&self, node: &Self::Node) -> usize {
        self.tree.effective_heuristic(self.target, self.world, node)
    }
}

/// High-level node: a goal-tree cursor plus the snapshot it was reached in.
#[derive(Clone, Debug)]
pub struct HighNode {
    cursor: GoalIx,
    state: WorldState,
}

struct GoalSpace<'a> {
    world: &'a World,
    tree: &'a GoalTree,
    options: &'a PlanOptions,
    started: Instant,
}

impl GoalSpace<'_> {
    /// The inner search may never outlive the outer budget.
    fn low_limits(&self) -> SearchLimits {
        let remaining = self.options.high_timeout.saturating_sub(self.started.elapsed());
        SearchLimits {
            timeout: remaining.min(self.options.low_timeout),
            cancel: self.options.cancel.clone(),
        }
    }
}

impl SearchSpace for GoalSpace<'_> {
    type Node = HighNode;
    type Step = Vec<PlanToken>;

    fn key(&self, node: &Self::Node) -> String {
        format!("{}#{}", node.cursor.index(), node.state.key())
    }

    fn successors(&mut self, node: &Self::Node) -> Vec<(Self::Step, Self::Node, usize)> {
        let mut edges = Vec::new();
        for target in self.tree.next_goals(node.cursor, self.world, &node.state) {
            if target == self.tree.finish() {
                continue;
            }
            let mut low = PrimitiveSpace { world: self.world, tree: self.tree, target };
            match astar(&mut low, node.state.clone(), &self.low_limits()) {
                SearchOutcome::Found(path) if path.cost > 0 => {
                    let end = path.steps.last().expect("positive cost").1.clone();
                    let mut tokens = vec![PlanToken::Note(self.tree.describe(target, self.world))];
                    tokens.extend(path.steps.iter().map(|(a, _)| PlanToken::Primitive(*a)));
                    edges.push((tokens, HighNode { cursor: target, state: end }, path.cost));
                }
                SearchOutcome::Found(_) => {
                    debug!(target: "planner", "sub-goal was already satisfied; skipping");
                }
                SearchOutcome::Timeout { .. } => {
                    debug!(target: "planner", "sub-goal search timed out");
                }
                SearchOutcome::Exhausted { .. } => {
                    debug!(target: "planner", "sub-goal is unreachable from here");
                }
            }
        }
        edges
    }

    fn is_goal(&self, node: &Self::Node) -> bool {
        self.tree.fulfilled(self.tree.root(), self.world, &node.state)
    }

    fn heuristic(&self, node: &Self::Node) -> usize {
        self.tree
            .next_goals(node.cursor, self.world, &node.state)
            .into_iter()
            .map(|g| {
                if g == self.tree.finish() {
                    0
                } else {
                    self.tree.effective_heuristic(g, self.world, &node.state)
                }
            })
            .min()
            .unwrap_or(0)
    }
}

/// Plans one formula. Self-referential conjunctions are dropped first; an
/// already-satisfied formula yields an annotation-only plan.
pub fn plan(
    world: &World,
    state: &WorldState,
    dnf: &DnfFormula,
    options: &PlanOptions,
) -> Result<Plan, PlanError> {
    let dnf = dnf.without_self_references();
    if dnf.is_empty() {
        return Err(PlanError::Unachievable("the goal is contradictory".to_owned()));
    }
    if dnf.satisfied(world, state) {
        return Ok(Plan(vec![PlanToken::Note("already true".to_owned())]));
    }

    let tree = GoalTree::build(&dnf);
    let mut space = GoalSpace { world, tree: &tree, options, started: Instant::now() };
    let start = HighNode { cursor: tree.root(), state: state.clone() };
    let limits =
        SearchLimits { timeout: options.high_timeout, cancel: options.cancel.clone() };
    match astar(&mut space, start, &limits) {
        SearchOutcome::Found(path) => {
            info!(
                target: "planner",
                "plan of cost {} found for {dnf} ({} sub-goals)",
                path.cost,
                path.steps.len()
            );
            Ok(Plan(path.steps.into_iter().flat_map(|(tokens, _)| tokens).collect()))
        }
        SearchOutcome::Timeout { .. } => Err(PlanError::Timeout),
        SearchOutcome::Exhausted { .. } => Err(PlanError::Unachievable(
            "no sequence of moves reaches the goal".to_owned(),
        )),
    }
}

/// Plans every interpretation and keeps the cheapest plan by primitive
/// count; ties go to the earlier interpretation. Fails only when all do,
/// with the reasons joined (a timeout anywhere outranks other reasons).
pub fn plan_best(
    world: &World,
    state: &WorldState,
    interpretations: &[Interpretation],
    options: &PlanOptions,
) -> Result<Planned, PlanError> {
    let mut best: Option<Planned> = None;
    let mut timed_out = false;
    let mut reasons = Vec::new();

    for (index, interpretation) in interpretations.iter().enumerate() {
        match plan(world, state, &interpretation.dnf, options) {
            Ok(plan) => {
                let better = best
                    .as_ref()
                    .is_none_or(|b| plan.primitive_count() < b.plan.primitive_count());
                if better {
                    best = Some(Planned { interpretation: index, plan });
                }
            }
            Err(PlanError::Timeout) => timed_out = true,
            Err(err) => reasons.push(err.to_string()),
        }
    }

    match best {
        Some(planned) => {
            info!(
                target: "planner",
                "interpretation {} wins with {} primitive(s)",
                planned.interpretation + 1,
                planned.plan.primitive_count()
            );
            Ok(planned)
        }
        None if timed_out => Err(PlanError::Timeout),
        None if reasons.is_empty() => {
            Err(PlanError::Unachievable("there was nothing to plan".to_owned()))
        }
        None => Err(PlanError::Unachievable(reasons.join("; "))),
    }
}
