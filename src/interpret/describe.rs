//! English rendering of object descriptions and disambiguation questions.
//!
//! A candidate is described by its attributes plus the relation to whatever
//! sits directly beneath it, which is distinguishing in practice.
// TODO: fall back to column position when two candidates share both
// attributes and support.

use crate::parse::{Entity, ObjectDesc, Quantifier};
use crate::relation::Relation;
use crate::utils::or_join;
use crate::world::{Form, World, WorldState};

/// "small blue box", "ball inside a box", ...
pub fn object_phrase(object: &ObjectDesc) -> String {
    match object {
        ObjectDesc::Simple(filter) => filter.describe(),
        ObjectDesc::Relative(inner, location) => {
            if location.relation.arity() == 1 {
                let state = match location.relation {
                    Relation::Holding => "being held",
                    _ => "at any location",
                };
                return format!("{} {state}", object_phrase(inner));
            }
            format!(
                "{} {} {}",
                object_phrase(inner),
                location.relation.phrase(),
                entity_phrase(&location.entity)
            )
        }
    }
}

pub fn entity_phrase(entity: &Entity) -> String {
    let quantifier = match entity.quantifier {
        Quantifier::Any => "any",
        Quantifier::All => "every",
        Quantifier::The => "the",
    };
    if matches!(&entity.object, ObjectDesc::Simple(filter) if filter.form == Form::Floor) {
        return "the floor".to_owned();
    }
    format!("{quantifier} {}", object_phrase(&entity.object))
}

/// The question posed when "the" still has several referents.
pub fn question(world: &World, state: &WorldState, candidates: &[String]) -> String {
    let descriptions = candidates.iter().map(|id| candidate_phrase(world, state, id));
    format!("Do you mean {}?", or_join(descriptions))
}

fn candidate_phrase(world: &World, state: &WorldState, id: &str) -> String {
    let base = world.describe(id);
    match state.position_of(id) {
        None => format!("{base} that I am holding"),
        Some((_, 0)) => format!("{base} that is on the floor"),
        Some((col, height)) => {
            let below = &state.stacks()[col][height - 1];
            let support = if world.spec(below).is_some_and(|s| s.is_form(Form::Box)) {
                "inside"
            } else {
                "on top of"
            };
            format!("{base} that is {support} {}", world.describe(below))
        }
    }
}
