//! The semantic interpreter: grammar parses to disjunctive-normal-form goal
//! formulas over ground identifiers.
//!
//! Resolution enforces the physical feasibility rules, memoises entity
//! lookups per interpret call, and resolves "the" against the session's
//! clarification queue. When several referents survive, interpretation
//! pauses with a disambiguation question instead of failing.

use std::collections::{HashMap, HashSet, VecDeque};

use itertools::Itertools;
use log::{debug, info};
use thiserror::Error;

use crate::dnf::{Conjunction, DnfFormula, Literal};
use crate::parse::{Command, Entity, Location, ObjectDesc, Quantifier};
use crate::physics::valid_literal;
use crate::relation::Relation;
use crate::world::{FLOOR, Form, World, WorldState};

pub mod describe;

/// One clarification utterance, kept as its alternative entity parses.
#[derive(Clone, Debug)]
pub struct Clarification {
    pub alternatives: Vec<Entity>,
}

/// A successfully interpreted parse: the command it came from and its goal.
#[derive(Clone, Debug)]
pub struct Interpretation {
    pub command: Command,
    pub dnf: DnfFormula,
}

#[derive(Debug)]
pub enum InterpretOutcome {
    Ok(Vec<Interpretation>),
    /// Referential ambiguity: the question to put to the user.
    NeedsClarification(String),
    Failure(String),
}

#[derive(Error, Debug)]
enum InterpretError {
    #[error("{0}")]
    Ambiguity(String),
    #[error("{0}")]
    Failure(String),
}

/// Interprets every parse of one utterance. An utterance succeeds if any
/// parse does; an ambiguity signal outranks plain failures; otherwise the
/// per-parse failure messages are joined.
pub fn interpret(
    parses: &[Command],
    world: &World,
    state: &WorldState,
    clarifications: &VecDeque<Clarification>,
) -> InterpretOutcome {
    let mut interpretations = Vec::new();
    let mut ambiguity: Option<String> = None;
    let mut failures = Vec::new();

    for command in parses {
        let mut resolver = Resolver::new(world, state, clarifications.clone());
        match resolver.command_goal(command) {
            Ok(dnf) => {
                info!(target: "interpret", "interpretation: {dnf}");
                interpretations.push(Interpretation { command: command.clone(), dnf });
            }
            Err(InterpretError::Ambiguity(question)) => {
                debug!(target: "interpret", "ambiguous parse: {question}");
                ambiguity.get_or_insert(question);
            }
            Err(InterpretError::Failure(message)) => failures.push(message),
        }
    }

    if !interpretations.is_empty() {
        InterpretOutcome::Ok(interpretations)
    } else if let Some(question) = ambiguity {
        InterpretOutcome::NeedsClarification(question)
    } else if failures.is_empty() {
        InterpretOutcome::Failure("I do not understand".to_owned())
    } else {
        InterpretOutcome::Failure(failures.into_iter().unique().join("; "))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Junction {
    Conjunctive,
    Disjunctive,
}

#[derive(Clone, Debug)]
struct Resolved {
    junction: Junction,
    ids: Vec<String>,
}

struct Resolver<'a> {
    world: &'a World,
    state: &'a WorldState,
    clarifications: VecDeque<Clarification>,
    memo: HashMap<Entity, Resolved>,
}

impl<'a> Resolver<'a> {
    fn new(world: &'a World, state: &'a WorldState, clarifications: VecDeque<Clarification>) -> Self {
        Resolver { world, state, clarifications, memo: HashMap::new() }
    }

    fn command_goal(&mut self, command: &Command) -> Result<DnfFormula, InterpretError> {
        let dnf = match command {
            Command::Take(entity) => {
                let resolved = self.resolve_entity(entity)?;
                if entity.quantifier == Quantifier::All && resolved.ids.len() > 1 {
                    return Err(InterpretError::Failure(
                        "I cannot hold more than one object".to_owned(),
                    ));
                }
                let conjunctions = resolved
                    .ids
                    .iter()
                    .map(|id| Literal::unary(Relation::Holding, id))
                    .filter(|lit| valid_literal(self.world, lit))
                    .map(|lit| Conjunction(vec![lit]))
                    .collect::<Vec<_>>();
                DnfFormula(conjunctions)
            }
            Command::Drop(location) => {
                let Some(held) = self.state.holding() else {
                    return Err(InterpretError::Failure("I am not holding anything".to_owned()));
                };
                let held = held.to_owned();
                self.location_goal(&held, location)?
            }
            Command::Move(entity, location) => {
                let resolved = self.resolve_entity(entity)?;
                if location.relation.arity() == 1 {
                    self.unary_goal(location.relation, &resolved)
                } else {
                    let anchor = self.resolve_entity(&location.entity)?;
                    self.assemble(location.relation, &resolved, &anchor)?
                }
            }
            Command::Clarify(_) => {
                return Err(InterpretError::Failure(
                    "there is no pending command to clarify".to_owned(),
                ));
            }
        };
        if dnf.is_empty() {
            return Err(InterpretError::Failure(
                "that is physically impossible in this world".to_owned(),
            ));
        }
        Ok(dnf)
    }

    /// Goal for "put it ⟨location⟩": the held object stands in for the
    /// entity, conjunctively.
    fn location_goal(
        &mut self,
        held: &str,
        location: &Location,
    ) -> Result<DnfFormula, InterpretError> {
        let singleton =
            Resolved { junction: Junction::Conjunctive, ids: vec![held.to_owned()] };
        if location.relation.arity() == 1 {
            return Ok(self.unary_goal(location.relation, &singleton));
        }
        let anchor = self.resolve_entity(&location.entity)?;
        self.assemble(location.relation, &singleton, &anchor)
    }

    fn unary_goal(&self, relation: Relation, resolved: &Resolved) -> DnfFormula {
        let literals = resolved
            .ids
            .iter()
            .map(|id| Literal::unary(relation, id))
            .filter(|lit| valid_literal(self.world, lit))
            .collect::<Vec<_>>();
        match resolved.junction {
            // A conjunction whose literals were all filtered out is dropped,
            // not emitted empty (it would be vacuously satisfied).
            Junction::Conjunctive if literals.is_empty() => DnfFormula(Vec::new()),
            Junction::Conjunctive => DnfFormula(vec![Conjunction(literals)]),
            Junction::Disjunctive => DnfFormula(
                literals.into_iter().map(|lit| Conjunction(vec![lit])).collect(),
            ),
        }
    }

    /// The four-way conjunction/disjunction table over entity × location.
    fn assemble(
        &self,
        relation: Relation,
        entity: &Resolved,
        anchor: &Resolved,
    ) -> Result<DnfFormula, InterpretError> {
        let literal = |e: &String, l: &String| {
            let lit = Literal::binary(relation, e, l);
            (valid_literal(self.world, &lit) && !lit.is_self_referential()).then_some(lit)
        };

        use Junction::*;
        let conjunctions: Vec<Conjunction> = match (entity.junction, anchor.junction) {
            (Conjunctive, Conjunctive) => {
                let lits = entity
                    .ids
                    .iter()
                    .cartesian_product(&anchor.ids)
                    .filter_map(|(e, l)| literal(e, l))
                    .collect::<Vec<_>>();
                vec![Conjunction(lits)]
            }
            (Disjunctive, Conjunctive) => entity
                .ids
                .iter()
                .map(|e| {
                    Conjunction(anchor.ids.iter().filter_map(|l| literal(e, l)).collect())
                })
                .collect(),
            (Conjunctive, Disjunctive) => entity
                .ids
                .iter()
                .map(|_| anchor.ids.iter())
                .multi_cartesian_product()
                .map(|choice| {
                    Conjunction(
                        entity
                            .ids
                            .iter()
                            .zip(choice)
                            .filter_map(|(e, l)| literal(e, l))
                            .collect(),
                    )
                })
                .collect(),
            (Disjunctive, Disjunctive) => entity
                .ids
                .iter()
                .cartesian_product(&anchor.ids)
                .filter_map(|(e, l)| literal(e, l))
                .map(|lit| Conjunction(vec![lit]))
                .collect(),
        };

        let conjunctions =
            conjunctions.into_iter().filter(|c| !c.is_empty()).unique().collect::<Vec<_>>();
        Ok(DnfFormula(conjunctions))
    }

    fn resolve_entity(&mut self, entity: &Entity) -> Result<Resolved, InterpretError> {
        if let Some(resolved) = self.memo.get(entity) {
            return Ok(resolved.clone());
        }
        let mut ids = self.resolve_object(&entity.object)?;
        ids.sort();
        if ids.is_empty() {
            return Err(InterpretError::Failure(format!(
                "I cannot see any {}",
                describe::object_phrase(&entity.object)
            )));
        }
        let resolved = match entity.quantifier {
            Quantifier::Any => Resolved { junction: Junction::Disjunctive, ids },
            Quantifier::All => Resolved { junction: Junction::Conjunctive, ids },
            Quantifier::The => {
                let single = if ids.len() == 1 {
                    ids.remove(0)
                } else {
                    self.resolve_the(ids)?
                };
                Resolved { junction: Junction::Conjunctive, ids: vec![single] }
            }
        };
        self.memo.insert(entity.clone(), resolved.clone());
        Ok(resolved)
    }

    /// Ground identifiers matched by a (possibly relative) object
    /// description in the current world.
    fn resolve_object(&mut self, object: &ObjectDesc) -> Result<Vec<String>, InterpretError> {
        match object {
            ObjectDesc::Simple(filter) => {
                if filter.form == Form::Floor {
                    return Ok(vec![FLOOR.to_owned()]);
                }
                Ok(self
                    .world
                    .ids()
                    .filter(|id| self.state.contains(id))
                    .filter(|id| {
                        self.world.spec(id).is_some_and(|spec| filter.matches(spec))
                    })
                    .map(str::to_owned)
                    .collect())
            }
            ObjectDesc::Relative(inner, location) => {
                let base = self.resolve_object(inner)?;
                if location.relation.arity() == 1 {
                    return Ok(base
                        .into_iter()
                        .filter(|x| {
                            location.relation.test(self.world, self.state, x, None)
                        })
                        .collect());
                }
                let anchor = self.resolve_entity(&location.entity)?;
                let test = |x: &String, l: &String| {
                    location.relation.test(self.world, self.state, x, Some(l.as_str()))
                };
                Ok(base
                    .into_iter()
                    .filter(|x| match anchor.junction {
                        Junction::Disjunctive => anchor.ids.iter().any(|l| test(x, l)),
                        Junction::Conjunctive => anchor.ids.iter().all(|l| test(x, l)),
                    })
                    .collect())
            }
        }
    }

    /// Whittles "the" candidates down with queued clarifications; if more
    /// than one remains, signals ambiguity with a question.
    fn resolve_the(&mut self, mut candidates: Vec<String>) -> Result<String, InterpretError> {
        while candidates.len() > 1 {
            let Some(clarification) = self.clarifications.pop_front() else {
                break;
            };
            let mut matched: HashSet<String> = HashSet::new();
            for alternative in &clarification.alternatives {
                if let Ok(ids) = self.resolve_object(&alternative.object) {
                    matched.extend(ids);
                }
            }
            candidates.retain(|c| matched.contains(c));
            if candidates.is_empty() {
                return Err(InterpretError::Failure(
                    "none of the candidates matches that clarification".to_owned(),
                ));
            }
        }
        if candidates.len() == 1 {
            return Ok(candidates.remove(0));
        }
        Err(InterpretError::Ambiguity(describe::question(
            self.world,
            self.state,
            &candidates,
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assertables::assert_contains;

    use super::*;
    use crate::parse::parse_utterance;
    use crate::world::{Color, ObjectSpec, Size};

    // The three-stack scenario world: [e, l] [g, m] [k, f].
    fn fixture() -> (World, WorldState) {
        let objects = [
            ("e", ObjectSpec::new(Form::Brick, Size::Large, Color::Green)),
            ("l", ObjectSpec::new(Form::Ball, Size::Large, Color::White)),
            ("g", ObjectSpec::new(Form::Table, Size::Large, Color::Blue)),
            ("m", ObjectSpec::new(Form::Pyramid, Size::Small, Color::Yellow)),
            ("k", ObjectSpec::new(Form::Box, Size::Large, Color::Yellow)),
            ("f", ObjectSpec::new(Form::Brick, Size::Small, Color::Blue)),
        ]
        .into_iter()
        .map(|(id, spec)| (id.to_owned(), spec))
        .collect::<HashMap<_, _>>();
        let state = WorldState::new(
            vec![
                vec!["e".into(), "l".into()],
                vec!["g".into(), "m".into()],
                vec!["k".into(), "f".into()],
            ],
            None,
            0,
        );
        (World::new(objects), state)
    }

    fn interpret_str(utterance: &str, world: &World, state: &WorldState) -> InterpretOutcome {
        interpret(&parse_utterance(utterance), world, state, &VecDeque::new())
    }

    #[test]
    fn take_the_white_ball() {
        let (world, state) = fixture();
        let InterpretOutcome::Ok(interps) = interpret_str("take the white ball", &world, &state)
        else {
            panic!("expected an interpretation");
        };
        assert_eq!(interps.len(), 1);
        assert_eq!(interps[0].dnf.to_string(), "holding(l)");
    }

    #[test]
    fn ball_into_box_uses_inside() {
        let (world, state) = fixture();
        let InterpretOutcome::Ok(interps) =
            interpret_str("put the white ball in a box", &world, &state)
        else {
            panic!("expected an interpretation");
        };
        assert_eq!(interps[0].dnf.to_string(), "inside(l,k)");
    }

    #[test]
    fn all_bricks_on_the_floor_is_one_conjunction() {
        let (world, state) = fixture();
        let InterpretOutcome::Ok(interps) =
            interpret_str("put all bricks on the floor", &world, &state)
        else {
            panic!("expected an interpretation");
        };
        assert_eq!(interps[0].dnf.to_string(), "ontop(e,floor) & ontop(f,floor)");
    }

    #[test]
    fn drop_without_holding_fails() {
        let (world, state) = fixture();
        let outcome = interpret_str("put it beside the yellow pyramid", &world, &state);
        let InterpretOutcome::Failure(message) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_contains!(message, "not holding");
    }

    #[test]
    fn the_with_two_referents_asks() {
        let (world, state) = fixture();
        let outcome = interpret_str("take the brick", &world, &state);
        let InterpretOutcome::NeedsClarification(question) = outcome else {
            panic!("expected a question, got {outcome:?}");
        };
        assert_contains!(question, "Do you mean");
        assert_contains!(question, "green brick");
        assert_contains!(question, "blue brick");
    }

    #[test]
    fn clarification_narrows_the_referent() {
        let (world, state) = fixture();
        let parses = parse_utterance("take the brick");
        let clarifications: VecDeque<Clarification> =
            [Clarification {
                alternatives: vec![Entity {
                    quantifier: Quantifier::The,
                    object: ObjectDesc::Simple(crate::parse::ObjectFilter {
                        form: Form::AnyForm,
                        size: Size::Unspecified,
                        color: Color::Green,
                    }),
                }],
            }]
            .into();
        let outcome = interpret(&parses, &world, &state, &clarifications);
        let InterpretOutcome::Ok(interps) = outcome else {
            panic!("expected an interpretation, got {outcome:?}");
        };
        assert_eq!(interps[0].dnf.to_string(), "holding(e)");
    }

    #[test]
    fn mismatched_clarification_is_a_user_error() {
        let (world, state) = fixture();
        let parses = parse_utterance("take the brick");
        let clarifications: VecDeque<Clarification> =
            [Clarification {
                alternatives: vec![Entity {
                    quantifier: Quantifier::The,
                    object: ObjectDesc::Simple(crate::parse::ObjectFilter {
                        form: Form::Ball,
                        size: Size::Unspecified,
                        color: Color::Black,
                    }),
                }],
            }]
            .into();
        assert!(matches!(
            interpret(&parses, &world, &state, &clarifications),
            InterpretOutcome::Failure(_)
        ));
    }

    #[test]
    fn attachment_ambiguity_gives_two_interpretations() {
        let (world, mut state) = fixture();
        // Swap l and f so "a ball in a box" has a referent.
        state.stacks[0].pop();
        state.stacks[2].pop();
        state.stacks[2].push("l".into());
        state.stacks[0].push("f".into());
        let InterpretOutcome::Ok(interps) =
            interpret_str("put a ball in a box on the floor", &world, &state)
        else {
            panic!("expected interpretations");
        };
        assert_eq!(interps.len(), 2);
    }

    #[test]
    fn unary_location_on_the_floor_fails() {
        let (world, state) = fixture();
        // Every literal is filtered (the floor cannot be the subject), so
        // no vacuously-true empty conjunction may survive.
        let outcome = interpret_str("move the floor at any location", &world, &state);
        let InterpretOutcome::Failure(message) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_contains!(message, "impossible");
    }

    #[test]
    fn take_all_of_several_fails() {
        let (world, state) = fixture();
        let outcome = interpret_str("take all bricks", &world, &state);
        let InterpretOutcome::Failure(message) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_contains!(message, "more than one");
    }

    #[test]
    fn no_such_object() {
        let (world, state) = fixture();
        let outcome = interpret_str("take the red plank", &world, &state);
        let InterpretOutcome::Failure(message) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_contains!(message, "red plank");
    }

    #[test]
    fn literals_never_self_refer_and_respect_physics() {
        let (world, state) = fixture();
        let InterpretOutcome::Ok(interps) =
            interpret_str("put a brick on a brick", &world, &state)
        else {
            panic!("expected an interpretation");
        };
        for interp in interps {
            for conjunction in interp.dnf.iter() {
                for literal in conjunction.iter() {
                    assert!(!literal.is_self_referential());
                    assert!(valid_literal(&world, literal));
                }
            }
        }
    }
}
