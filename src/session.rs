//! One interactive session: the world being manipulated, the pending
//! command awaiting clarification, and the clarification queue.
//!
//! The state machine is AwaitingCommand → AwaitingClarification(parses) →
//! AwaitingCommand: a question keeps the parses pending, the next utterance
//! is read as clarifications, and interpretation is retried. The buffers
//! clear whenever a command commits or fails.

use std::collections::VecDeque;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::Project;
use crate::action::{Action, ExecError, Plan, PlanToken, execute};
use crate::dnf::DnfFormula;
use crate::interpret::{Clarification, InterpretOutcome, interpret};
use crate::parse::{Command, parse_clarifications, parse_utterance};
use crate::planner::{PlanOptions, plan, plan_best};
use crate::world::{World, WorldState};

/// Utterances with this prefix bypass English and go straight to the
/// planner as a textual DNF formula.
pub const FORMULA_PREFIX: &str = "dnf ";

#[derive(Debug)]
pub enum SessionReply {
    /// A plan was found; it has not been applied yet.
    Plan { interpretation: DnfFormula, plan: Plan },
    /// A disambiguation question; the next utterance should answer it.
    Question(String),
    Failure(String),
}

pub struct Session {
    world: World,
    state: WorldState,
    options: PlanOptions,
    pending: Option<Vec<Command>>,
    clarifications: VecDeque<Clarification>,
}

impl Session {
    pub fn new(project: Project, options: PlanOptions) -> Session {
        Session {
            world: project.world,
            state: project.state,
            options,
            pending: None,
            clarifications: VecDeque::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn awaiting_clarification(&self) -> bool {
        self.pending.is_some()
    }

    /// Swaps in a fresh cancellation token, e.g. after an interrupt
    /// consumed the previous one.
    pub fn set_cancel(&mut self, cancel: CancellationToken) {
        self.options.cancel = cancel;
    }

    /// One conversational turn: parse (or route) the utterance, interpret,
    /// plan. Does not mutate the world; callers apply the plan via
    /// [`Session::execute`].
    pub fn submit(&mut self, utterance: &str) -> SessionReply {
        let utterance = utterance.trim();

        if let Some(formula_src) = utterance.strip_prefix(FORMULA_PREFIX) {
            // A direct formula is a fresh command.
            self.pending = None;
            self.clarifications.clear();
            return match DnfFormula::parse(formula_src, &self.world) {
                Ok(dnf) => match plan(&self.world, &self.state, &dnf, &self.options) {
                    Ok(plan) => SessionReply::Plan { interpretation: dnf, plan },
                    Err(err) => SessionReply::Failure(err.to_string()),
                },
                Err(err) => SessionReply::Failure(err.to_string()),
            };
        }

        if self.pending.is_some() {
            let alternatives: Vec<_> = parse_clarifications(utterance)
                .into_iter()
                .filter_map(|cmd| match cmd {
                    Command::Clarify(entity) => Some(entity),
                    _ => None,
                })
                .collect();
            if alternatives.is_empty() {
                // Keep the pending command; the user may try again.
                return SessionReply::Failure(
                    "I did not understand that clarification".to_owned(),
                );
            }
            debug!(target: "session", "queueing clarification with {} reading(s)", alternatives.len());
            self.clarifications.push_back(Clarification { alternatives });
            let parses = self.pending.clone().expect("pending command");
            return self.try_interpret(&parses);
        }

        let parses = parse_utterance(utterance);
        if parses.is_empty() {
            if !parse_clarifications(utterance).is_empty() {
                return SessionReply::Failure(
                    "there is no pending command to clarify".to_owned(),
                );
            }
            return SessionReply::Failure(format!("I do not understand \"{utterance}\""));
        }
        self.try_interpret(&parses)
    }

    fn try_interpret(&mut self, parses: &[Command]) -> SessionReply {
        match interpret(parses, &self.world, &self.state, &self.clarifications) {
            InterpretOutcome::Ok(interpretations) => {
                // The command commits; conversation buffers reset.
                self.pending = None;
                self.clarifications.clear();
                info!(
                    target: "session",
                    "{} interpretation(s), planning...",
                    interpretations.len()
                );
                match plan_best(&self.world, &self.state, &interpretations, &self.options) {
                    Ok(planned) => SessionReply::Plan {
                        interpretation: interpretations[planned.interpretation].dnf.clone(),
                        plan: planned.plan,
                    },
                    Err(err) => SessionReply::Failure(err.to_string()),
                }
            }
            InterpretOutcome::NeedsClarification(question) => {
                self.pending = Some(parses.to_vec());
                SessionReply::Question(question)
            }
            InterpretOutcome::Failure(message) => {
                // A failed utterance requires a fresh command.
                self.pending = None;
                self.clarifications.clear();
                SessionReply::Failure(message)
            }
        }
    }

    /// Applies a found plan to the session's world.
    pub fn execute(&mut self, plan: &Plan) -> Result<(), ExecError> {
        execute(&self.world, &mut self.state, plan)
    }

    /// Applies a raw primitive sequence (driver action strings).
    pub fn perform(&mut self, actions: &[Action]) -> Result<(), ExecError> {
        let plan = Plan(actions.iter().copied().map(PlanToken::Primitive).collect());
        execute(&self.world, &mut self.state, &plan)
    }
}
