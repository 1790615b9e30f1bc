//! Physical feasibility: which object may be released onto or into which.
//!
//! The same rules gate the low-level `drop` primitive and the validity of
//! generated goal literals.

use crate::dnf::Literal;
use crate::relation::Relation;
use crate::world::{FLOOR, Form, ObjectSpec, Size, World};

/// Whether `a` may be released onto (or, for a box, into) `b`.
pub fn can_place(world: &World, a: &str, b: &str) -> bool {
    if a == b || a == FLOOR {
        return false;
    }
    if b == FLOOR {
        return true;
    }
    let (Some(a), Some(b)) = (world.spec(a), world.spec(b)) else {
        return false;
    };
    match b.form {
        // Nothing rests on a ball.
        Form::Ball => false,
        Form::Box => fits_inside(a, b),
        _ => rests_on(a, b),
    }
}

fn fits_inside(a: &ObjectSpec, b: &ObjectSpec) -> bool {
    if a.size == Size::Large && b.size == Size::Small {
        return false;
    }
    match a.form {
        // Rigid shapes take up the whole box.
        Form::Pyramid | Form::Plank | Form::Box => b.size == Size::Large && a.size == Size::Small,
        _ => true,
    }
}

fn rests_on(a: &ObjectSpec, b: &ObjectSpec) -> bool {
    if a.size == Size::Large && b.size == Size::Small {
        return false;
    }
    match a.form {
        // Balls roll off everything except the floor and boxes.
        Form::Ball => false,
        Form::Box if a.size == Size::Small => {
            !(b.size == Size::Small && matches!(b.form, Form::Brick | Form::Pyramid))
        }
        Form::Box => b.form != Form::Pyramid,
        _ => true,
    }
}

/// Whether a goal literal is worth pursuing at all. Positive literals must
/// be physically achievable; the floor may only be the second argument of
/// `ontop`/`above`/`inside`; arguments must be distinct known identifiers.
pub fn valid_literal(world: &World, literal: &Literal) -> bool {
    let a = literal.first();
    if a == FLOOR || world.spec(a).is_none() {
        return false;
    }
    let Some(b) = literal.second() else {
        return literal.relation.arity() == 1;
    };
    if a == b || world.spec(b).is_none() {
        return false;
    }
    // A negated literal is trivially satisfiable whenever it is well formed.
    if !literal.polarity {
        return matches!(
            literal.relation,
            Relation::Inside | Relation::OnTop | Relation::Above
        ) || b != FLOOR;
    }
    match literal.relation {
        Relation::OnTop => {
            b == FLOOR
                || (!world.spec(b).is_some_and(|s| s.is_form(Form::Box)) && can_place(world, a, b))
        }
        Relation::Inside => {
            world.spec(b).is_some_and(|s| s.is_form(Form::Box)) && can_place(world, a, b)
        }
        Relation::Above => b == FLOOR || satisfiable_above(world, a, b),
        Relation::Under => satisfiable_above(world, b, a),
        Relation::LeftOf | Relation::RightOf | Relation::Beside => b != FLOOR,
        Relation::Holding | Relation::AnyPlace => false, // binary form is malformed
    }
}

/// `a` somewhere above `b` in one column: impossible over a ball, and a
/// large object can never end up above a small one (supports only shrink
/// going up).
fn satisfiable_above(world: &World, a: &str, b: &str) -> bool {
    if a == FLOOR || b == FLOOR {
        return false;
    }
    let (Some(a), Some(b)) = (world.spec(a), world.spec(b)) else {
        return false;
    };
    b.form != Form::Ball && !(a.size == Size::Large && b.size == Size::Small)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;
    use crate::world::Color;

    fn world() -> World {
        let objects = [
            ("small_ball", ObjectSpec::new(Form::Ball, Size::Small, Color::Black)),
            ("large_ball", ObjectSpec::new(Form::Ball, Size::Large, Color::White)),
            ("small_brick", ObjectSpec::new(Form::Brick, Size::Small, Color::Blue)),
            ("large_brick", ObjectSpec::new(Form::Brick, Size::Large, Color::Green)),
            ("small_box", ObjectSpec::new(Form::Box, Size::Small, Color::Red)),
            ("large_box", ObjectSpec::new(Form::Box, Size::Large, Color::Yellow)),
            ("small_pyramid", ObjectSpec::new(Form::Pyramid, Size::Small, Color::Red)),
            ("large_pyramid", ObjectSpec::new(Form::Pyramid, Size::Large, Color::Yellow)),
            ("small_plank", ObjectSpec::new(Form::Plank, Size::Small, Color::Green)),
            ("large_table", ObjectSpec::new(Form::Table, Size::Large, Color::Blue)),
        ]
        .into_iter()
        .map(|(id, spec)| (id.to_owned(), spec))
        .collect::<HashMap<_, _>>();
        World::new(objects)
    }

    #[test_case("large_ball", "floor", true; "floor accepts everything")]
    #[test_case("small_brick", "large_ball", false; "nothing on a ball")]
    #[test_case("large_brick", "small_box", false; "large into small")]
    #[test_case("small_ball", "large_box", true)]
    #[test_case("large_ball", "large_box", true)]
    #[test_case("small_pyramid", "large_box", true; "small rigid shape in a large box")]
    #[test_case("small_pyramid", "small_box", false; "rigid shape needs a large box")]
    #[test_case("small_plank", "large_box", true)]
    #[test_case("small_box", "large_box", true)]
    #[test_case("large_ball", "large_table", false; "balls roll off tables")]
    #[test_case("large_brick", "small_brick", false; "small cannot support large")]
    #[test_case("small_box", "small_brick", false)]
    #[test_case("small_box", "small_pyramid", false)]
    #[test_case("small_box", "large_brick", true)]
    #[test_case("large_box", "large_pyramid", false; "no box on a pyramid")]
    #[test_case("large_box", "large_table", true)]
    #[test_case("floor", "large_box", false; "the floor cannot move")]
    #[test_case("small_brick", "small_brick", false; "self support")]
    fn placement(a: &str, b: &str, expected: bool) {
        assert_eq!(can_place(&world(), a, b), expected);
    }

    #[test_case(Literal::binary(Relation::Inside, "small_ball", "large_box"), true)]
    #[test_case(Literal::binary(Relation::Inside, "small_ball", "large_table"), false; "inside needs a box")]
    #[test_case(Literal::binary(Relation::OnTop, "small_ball", "large_box"), false; "directly above a box is inside")]
    #[test_case(Literal::binary(Relation::OnTop, "large_ball", "floor"), true)]
    #[test_case(Literal::binary(Relation::Above, "small_brick", "large_ball"), false; "nothing ends up above a ball")]
    #[test_case(Literal::binary(Relation::Above, "large_brick", "small_brick"), false; "stacks shrink going up")]
    #[test_case(Literal::binary(Relation::Under, "small_brick", "large_brick"), false; "under mirrors above")]
    #[test_case(Literal::binary(Relation::Under, "large_brick", "small_brick"), true)]
    #[test_case(Literal::binary(Relation::LeftOf, "small_ball", "floor"), false; "no direction relative to the floor")]
    #[test_case(Literal::binary(Relation::OnTop, "small_ball", "small_ball"), false; "self reference")]
    #[test_case(Literal::unary(Relation::Holding, "small_ball"), true)]
    #[test_case(Literal::unary(Relation::Holding, "floor"), false)]
    #[test_case(Literal::binary(Relation::OnTop, "large_ball", "large_table").negated(), true; "negated literals are not filtered")]
    fn literal_validity(literal: Literal, expected: bool) {
        assert_eq!(valid_literal(&world(), &literal), expected);
    }
}
