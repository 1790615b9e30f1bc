//! Arm primitives, plan tokens, and the executor — the only place world
//! state is mutated.

use derive_more::{Deref, From};
use enum_iterator::{Sequence, all};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use thiserror::Error;

use crate::physics::can_place;
use crate::world::{World, WorldState};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(Sequence)]
pub enum Action {
    Left,
    Right,
    Pick,
    Drop,
}

// The single-letter alphabet the executor dispatches on.
const_assert_eq!(<Action as Sequence>::CARDINALITY, 4);

impl Action {
    pub const fn letter(self) -> char {
        match self {
            Action::Left => 'l',
            Action::Right => 'r',
            Action::Pick => 'p',
            Action::Drop => 'd',
        }
    }

    pub fn from_letter(letter: char) -> Option<Action> {
        all::<Action>().find(|action| action.letter() == letter)
    }

    /// Applies one primitive, returning the successor state. The input is
    /// untouched on error.
    pub fn apply(self, world: &World, state: &WorldState) -> Result<WorldState, ExecError> {
        let mut next = state.clone();
        match self {
            Action::Left => {
                if next.arm == 0 {
                    return Err(ExecError::ArmAtEdge("left"));
                }
                next.arm -= 1;
            }
            Action::Right => {
                if next.arm + 1 >= next.width() {
                    return Err(ExecError::ArmAtEdge("right"));
                }
                next.arm += 1;
            }
            Action::Pick => {
                if next.holding.is_some() {
                    return Err(ExecError::AlreadyHolding);
                }
                let arm = next.arm;
                let top = next.stacks[arm].pop().ok_or(ExecError::EmptyStack(arm))?;
                next.holding = Some(top);
            }
            Action::Drop => {
                let held = next.holding.take().ok_or(ExecError::NotHolding)?;
                if let Some(top) = next.top_of(next.arm) {
                    if !can_place(world, &held, top) {
                        return Err(ExecError::IllegalDrop { held, target: top.to_owned() });
                    }
                }
                let arm = next.arm;
                next.stacks[arm].push(held);
            }
        }
        Ok(next)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ExecError {
    #[error("the arm is already at the {0} edge")]
    ArmAtEdge(&'static str),
    #[error("the arm is already holding something")]
    AlreadyHolding,
    #[error("there is nothing to pick up at column {0}")]
    EmptyStack(usize),
    #[error("the arm is not holding anything")]
    NotHolding,
    #[error("{held} cannot be released on {target}")]
    IllegalDrop { held: String, target: String },
}

/// One element of an emitted plan: a primitive for the actuator, or an
/// English annotation for the transcript. Annotations starting with `#` are
/// silent comments.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(From)]
pub enum PlanToken {
    Primitive(Action),
    Note(String),
}

impl PlanToken {
    pub fn is_silent(&self) -> bool {
        matches!(self, PlanToken::Note(note) if note.starts_with('#'))
    }
}

impl std::fmt::Display for PlanToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanToken::Primitive(action) => write!(f, "{action}"),
            PlanToken::Note(note) => write!(f, "{note}"),
        }
    }
}

#[derive(Clone, Debug, Default)]
#[derive(Deref, From)]
pub struct Plan(pub Vec<PlanToken>);

impl Plan {
    pub fn primitives(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().filter_map(|token| match token {
            PlanToken::Primitive(action) => Some(*action),
            PlanToken::Note(_) => None,
        })
    }

    /// Plan length for comparing interpretations: primitives only,
    /// annotations are free.
    pub fn primitive_count(&self) -> usize {
        self.primitives().count()
    }
}

/// Applies a plan's primitives in order. Fatal on the first illegal token;
/// the state keeps the prefix applied so far.
pub fn execute(world: &World, state: &mut WorldState, plan: &Plan) -> Result<(), ExecError> {
    for action in plan.primitives() {
        *state = action.apply(world, state)?;
    }
    Ok(())
}

/// Classifies a driver argument: whitespace-separated single letters from
/// {p, d, l, r} form an action string, anything else routes to the
/// utterance pipeline.
pub fn parse_action_string(input: &str) -> Option<Vec<Action>> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    tokens
        .iter()
        .map(|token| {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) => Action::from_letter(letter),
                _ => None,
            }
        })
        .collect()
}
