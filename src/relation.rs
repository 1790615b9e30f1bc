//! Spatial relation predicates over the current world state.
//!
//! Held objects are at no column, so every column-dependent relation
//! involving them is false. The floor supports everything: `above(a, floor)`
//! holds for any placed `a`, `ontop(a, floor)` means `a` is at the bottom of
//! its stack.

use derive_more::IsVariant;
use enum_iterator::{Sequence, all};
use serde::{Deserialize, Serialize};

use crate::world::{FLOOR, Form, World, WorldState};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(Sequence, IsVariant)]
pub enum Relation {
    LeftOf,
    RightOf,
    Inside,
    OnTop,
    Under,
    Beside,
    Above,
    Holding,
    AnyPlace,
}

impl Relation {
    pub const fn arity(self) -> usize {
        match self {
            Relation::Holding | Relation::AnyPlace => 1,
            _ => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Relation::LeftOf => "leftof",
            Relation::RightOf => "rightof",
            Relation::Inside => "inside",
            Relation::OnTop => "ontop",
            Relation::Under => "under",
            Relation::Beside => "beside",
            Relation::Above => "above",
            Relation::Holding => "holding",
            Relation::AnyPlace => "anyplace",
        }
    }

    pub fn from_name(name: &str) -> Option<Relation> {
        all::<Relation>().find(|r| r.name() == name)
    }

    /// The English phrase used in questions and plan annotations.
    pub const fn phrase(self) -> &'static str {
        match self {
            Relation::LeftOf => "left of",
            Relation::RightOf => "right of",
            Relation::Inside => "inside",
            Relation::OnTop => "on top of",
            Relation::Under => "under",
            Relation::Beside => "beside",
            Relation::Above => "above",
            Relation::Holding => "held",
            Relation::AnyPlace => "anywhere",
        }
    }

    /// Tests the relation in `state`. `b` is ignored for unary relations.
    pub fn test(self, world: &World, state: &WorldState, a: &str, b: Option<&str>) -> bool {
        let b = b.unwrap_or(FLOOR);
        match self {
            Relation::LeftOf => left_of(state, a, b),
            Relation::RightOf => left_of(state, b, a),
            Relation::Inside => directly_above(state, a, b) && has_form(world, b, Form::Box),
            Relation::OnTop => on_top(world, state, a, b),
            Relation::Under => above(state, b, a),
            Relation::Beside => beside(state, a, b),
            Relation::Above => above(state, a, b),
            Relation::Holding => state.holding() == Some(a),
            Relation::AnyPlace => true,
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn has_form(world: &World, id: &str, form: Form) -> bool {
    world.spec(id).is_some_and(|s| s.is_form(form))
}

pub fn left_of(state: &WorldState, a: &str, b: &str) -> bool {
    match (state.column_of(a), state.column_of(b)) {
        (Some(ca), Some(cb)) => ca < cb,
        _ => false,
    }
}

pub fn beside(state: &WorldState, a: &str, b: &str) -> bool {
    match (state.column_of(a), state.column_of(b)) {
        (Some(ca), Some(cb)) => ca.abs_diff(cb) == 1,
        _ => false,
    }
}

/// `a` is exactly one cell above `b` in the same column.
pub fn directly_above(state: &WorldState, a: &str, b: &str) -> bool {
    match (state.position_of(a), state.position_of(b)) {
        (Some((ca, ha)), Some((cb, hb))) => ca == cb && ha == hb + 1,
        _ => false,
    }
}

pub fn on_top(world: &World, state: &WorldState, a: &str, b: &str) -> bool {
    if b == FLOOR {
        return state.position_of(a).is_some_and(|(_, height)| height == 0);
    }
    directly_above(state, a, b) && !has_form(world, b, Form::Box)
}

/// `a` strictly above `b` in the same column; everything placed is above the
/// floor.
pub fn above(state: &WorldState, a: &str, b: &str) -> bool {
    if b == FLOOR {
        return state.position_of(a).is_some();
    }
    match (state.position_of(a), state.position_of(b)) {
        (Some((ca, ha)), Some((cb, hb))) => ca == cb && ha > hb,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;
    use crate::world::{Color, ObjectSpec, Size};

    // Columns: [e, l] [g, m] [k, f], nothing held.
    fn fixture() -> (World, WorldState) {
        let objects = [
            ("e", ObjectSpec::new(Form::Brick, Size::Large, Color::Green)),
            ("l", ObjectSpec::new(Form::Ball, Size::Large, Color::White)),
            ("g", ObjectSpec::new(Form::Table, Size::Large, Color::Blue)),
            ("m", ObjectSpec::new(Form::Pyramid, Size::Small, Color::Red)),
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

    #[test_case(Relation::LeftOf, "e", Some("m"), true)]
    #[test_case(Relation::LeftOf, "m", Some("e"), false)]
    #[test_case(Relation::RightOf, "k", Some("g"), true)]
    #[test_case(Relation::Beside, "l", Some("g"), true)]
    #[test_case(Relation::Beside, "l", Some("f"), false)]
    #[test_case(Relation::OnTop, "l", Some("e"), true)]
    #[test_case(Relation::OnTop, "f", Some("k"), false; "directly above a box is inside, not ontop")]
    #[test_case(Relation::Inside, "f", Some("k"), true)]
    #[test_case(Relation::Inside, "m", Some("g"), false; "a table is not a container")]
    #[test_case(Relation::OnTop, "e", Some("floor"), true)]
    #[test_case(Relation::OnTop, "l", Some("floor"), false)]
    #[test_case(Relation::Above, "l", Some("e"), true)]
    #[test_case(Relation::Above, "l", Some("floor"), true)]
    #[test_case(Relation::Under, "e", Some("l"), true)]
    #[test_case(Relation::Under, "l", Some("e"), false)]
    #[test_case(Relation::AnyPlace, "l", None, true)]
    fn relation_tests(rel: Relation, a: &str, b: Option<&str>, expected: bool) {
        let (world, state) = fixture();
        assert_eq!(rel.test(&world, &state, a, b), expected);
    }

    #[test]
    fn held_objects_are_at_no_column() {
        let (world, mut state) = fixture();
        state.stacks[0].pop();
        state.holding = Some("l".into());
        for rel in [Relation::LeftOf, Relation::Beside, Relation::Above, Relation::OnTop] {
            assert!(!rel.test(&world, &state, "l", Some("g")));
        }
        assert!(Relation::Holding.test(&world, &state, "l", None));
    }
}
