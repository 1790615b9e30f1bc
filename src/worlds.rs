//! Compiled-in worlds. Nothing is read from disk; a preset bundles an
//! object table, an initial state, and example utterances for the driver's
//! index arguments.

use std::collections::HashMap;

use crate::Project;
use crate::world::{Color, Form, ObjectSpec, Size, World, WorldState};

pub const NAMES: &[&str] = &["small", "medium", "three"];

pub fn preset(name: &str) -> Option<Project> {
    match name {
        "small" => Some(small()),
        "medium" => Some(medium()),
        "three" => Some(three()),
        _ => None,
    }
}

fn table(entries: &[(&str, Form, Size, Color)]) -> HashMap<String, ObjectSpec> {
    entries
        .iter()
        .map(|&(id, form, size, color)| (id.to_owned(), ObjectSpec::new(form, size, color)))
        .collect()
}

fn stacks(columns: &[&[&str]]) -> Vec<Vec<String>> {
    columns
        .iter()
        .map(|column| column.iter().map(|id| (*id).to_owned()).collect())
        .collect()
}

/// The thirteen-object table shared by `small` and `medium`.
fn standard_objects() -> HashMap<String, ObjectSpec> {
    use Color::*;
    use Form::*;
    use Size::*;
    table(&[
        ("a", Brick, Large, Green),
        ("b", Brick, Small, White),
        ("c", Plank, Large, Red),
        ("d", Plank, Small, Green),
        ("e", Ball, Large, White),
        ("f", Ball, Small, Black),
        ("g", Table, Large, Blue),
        ("h", Table, Small, Red),
        ("i", Pyramid, Large, Yellow),
        ("j", Pyramid, Small, Red),
        ("k", Box, Large, Yellow),
        ("l", Box, Large, Red),
        ("m", Box, Small, Blue),
    ])
}

fn small() -> Project {
    let world = World::new(standard_objects()).with_examples([
        "take an object",
        "take a blue object",
        "take the white ball",
        "put a black ball in a box on the floor",
        "put a ball in a box on the floor",
        "put all boxes on the floor",
        "move all balls inside a large box",
    ]);
    let state = WorldState::new(
        stacks(&[&["e"], &["g", "l"], &[], &["k", "m", "f"], &[]]),
        None,
        0,
    );
    Project { world, state }
}

fn medium() -> Project {
    let world = World::new(standard_objects()).with_examples([
        "put the brick that is to the left of a pyramid in a box",
        "put the white ball in a box on the floor",
        "move the large ball inside a yellow box on the floor",
        "take the yellow box",
        "put all bricks on a table",
    ]);
    let state = WorldState::new(
        stacks(&[
            &["e"],
            &["a", "l"],
            &[],
            &[],
            &["i", "h", "j"],
            &[],
            &[],
            &["k", "g", "c", "b"],
            &[],
            &["d", "m", "f"],
        ]),
        None,
        0,
    );
    Project { world, state }
}

/// The compact three-column world the documentation scenarios use.
fn three() -> Project {
    use Color::*;
    use Form::*;
    use Size::*;
    let world = World::new(table(&[
        ("e", Brick, Large, Green),
        ("l", Ball, Large, White),
        ("g", Table, Large, Blue),
        ("m", Pyramid, Small, Red),
        ("k", Box, Large, Yellow),
        ("f", Brick, Small, Blue),
    ]))
    .with_examples([
        "take the white ball",
        "put the white ball in a box",
        "put the small brick on the green brick",
        "dnf holding(m)",
    ]);
    let state = WorldState::new(
        stacks(&[&["e", "l"], &["g", "m"], &["k", "f"]]),
        None,
        0,
    );
    Project { world, state }
}
