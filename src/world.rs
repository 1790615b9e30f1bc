//! The block world: object attributes, the object table, and the mutable
//! arm/stack state that planning snapshots.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, ensure};
use enum_iterator::Sequence;
use enum_map::Enum;
use serde::{Deserialize, Serialize};

/// Identifier of the pseudo-object accepting everything. It lives in the
/// object table but never in a stack.
pub const FLOOR: &str = "floor";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(Sequence, Enum)]
pub enum Form {
    Brick,
    Plank,
    Ball,
    Pyramid,
    Box,
    Table,
    Floor,
    /// Grammar wildcard ("object", "thing"). Never in an object table.
    AnyForm,
}

impl Form {
    pub fn matches(self, concrete: Form) -> bool {
        self == Form::AnyForm || self == concrete
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(Sequence, Enum)]
pub enum Size {
    Small,
    Large,
    /// Grammar wildcard. Never in an object table.
    Unspecified,
}

impl Size {
    pub fn matches(self, concrete: Size) -> bool {
        self == Size::Unspecified || self == concrete
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(Sequence, Enum)]
pub enum Color {
    Red,
    Black,
    Blue,
    Green,
    Yellow,
    White,
    /// Grammar wildcard. Never in an object table.
    Unspecified,
}

impl Color {
    pub fn matches(self, concrete: Color) -> bool {
        self == Color::Unspecified || self == concrete
    }
}

/// Attributes of one object. World tables hold concrete values only; the
/// wildcard variants appear in grammar filters.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
pub struct ObjectSpec {
    pub form: Form,
    pub size: Size,
    pub color: Color,
}

impl ObjectSpec {
    pub const fn new(form: Form, size: Size, color: Color) -> Self {
        ObjectSpec { form, size, color }
    }

    pub fn is_form(&self, form: Form) -> bool {
        self.form == form
    }
}

/// Immutable per-session data: the object table plus the world's predefined
/// example utterances.
#[derive(Clone, Debug)]
#[derive(Serialize, Deserialize)]
pub struct World {
    objects: HashMap<String, ObjectSpec>,
    examples: Vec<String>,
}

impl World {
    pub fn new(objects: HashMap<String, ObjectSpec>) -> Self {
        let mut objects = objects;
        objects.insert(
            FLOOR.to_owned(),
            ObjectSpec::new(Form::Floor, Size::Unspecified, Color::Unspecified),
        );
        World { objects, examples: Vec::new() }
    }

    pub fn with_examples(mut self, examples: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    pub fn spec(&self, id: &str) -> Option<&ObjectSpec> {
        self.objects.get(id)
    }

    /// Identifiers of the proper objects, i.e. everything except the floor.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str).filter(|id| *id != FLOOR)
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// Short English description: "the white ball", with the size added only
    /// when another object shares form and color.
    pub fn describe(&self, id: &str) -> String {
        if id == FLOOR {
            return "the floor".to_owned();
        }
        let Some(spec) = self.spec(id) else {
            return format!("the unknown object {id}");
        };
        let twin = self
            .objects
            .iter()
            .any(|(other, s)| other != id && s.form == spec.form && s.color == spec.color);
        let mut words = vec!["the"];
        if twin {
            words.push(size_word(spec.size));
        }
        words.push(color_word(spec.color));
        words.push(form_word(spec.form));
        words.retain(|w| !w.is_empty());
        words.join(" ")
    }
}

pub fn form_word(form: Form) -> &'static str {
    match form {
        Form::Brick => "brick",
        Form::Plank => "plank",
        Form::Ball => "ball",
        Form::Pyramid => "pyramid",
        Form::Box => "box",
        Form::Table => "table",
        Form::Floor => "floor",
        Form::AnyForm => "object",
    }
}

pub fn size_word(size: Size) -> &'static str {
    match size {
        Size::Small => "small",
        Size::Large => "large",
        Size::Unspecified => "",
    }
}

pub fn color_word(color: Color) -> &'static str {
    match color {
        Color::Red => "red",
        Color::Black => "black",
        Color::Blue => "blue",
        Color::Green => "green",
        Color::Yellow => "yellow",
        Color::White => "white",
        Color::Unspecified => "",
    }
}

/// The mutable snapshot: stacks of identifiers (bottom first), the held
/// identifier, and the arm column. Cloned whenever a search branches.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
pub struct WorldState {
    pub(crate) stacks: Vec<Vec<String>>,
    pub(crate) holding: Option<String>,
    pub(crate) arm: usize,
}

impl WorldState {
    pub fn new(stacks: Vec<Vec<String>>, holding: Option<String>, arm: usize) -> Self {
        WorldState { stacks, holding, arm }
    }

    pub fn stacks(&self) -> &[Vec<String>] {
        &self.stacks
    }

    pub fn holding(&self) -> Option<&str> {
        self.holding.as_deref()
    }

    pub fn arm(&self) -> usize {
        self.arm
    }

    pub fn width(&self) -> usize {
        self.stacks.len()
    }

    pub fn top_of(&self, col: usize) -> Option<&str> {
        self.stacks.get(col)?.last().map(String::as_str)
    }

    /// Column and stack index of a placed object. `None` for the floor, a
    /// held object, or an unknown identifier.
    pub fn position_of(&self, id: &str) -> Option<(usize, usize)> {
        self.stacks.iter().enumerate().find_map(|(col, stack)| {
            stack.iter().position(|x| x == id).map(|height| (col, height))
        })
    }

    pub fn column_of(&self, id: &str) -> Option<usize> {
        self.position_of(id).map(|(col, _)| col)
    }

    /// Whether the identifier is anywhere in the world: a stack or the hand.
    pub fn contains(&self, id: &str) -> bool {
        self.holding.as_deref() == Some(id) || self.position_of(id).is_some()
    }

    /// Canonical id used to deduplicate search nodes.
    pub fn key(&self) -> String {
        let stacks = self
            .stacks
            .iter()
            .map(|stack| stack.join(","))
            .collect::<Vec<_>>()
            .join(";");
        format!("{stacks}|{}|{}", self.arm, self.holding.as_deref().unwrap_or("-"))
    }

    /// Textual rendering: columns drawn top-down, the arm marked above its
    /// column, the held identifier next to it.
    pub fn render(&self) -> String {
        let cell = |text: &str| format!("{text:^5}");
        let mut out = String::new();
        for (col, _) in self.stacks.iter().enumerate() {
            let marker = if col == self.arm {
                match &self.holding {
                    Some(id) => format!("[{id}]"),
                    None => "\\_/".to_owned(),
                }
            } else {
                String::new()
            };
            out.push_str(&cell(&marker));
        }
        out.push('\n');
        let tallest = self.stacks.iter().map(Vec::len).max().unwrap_or(0);
        for level in (0..tallest).rev() {
            for stack in &self.stacks {
                out.push_str(&cell(stack.get(level).map_or("", String::as_str)));
            }
            out.push('\n');
        }
        for _ in &self.stacks {
            out.push_str("=====");
        }
        out.push('\n');
        for col in 0..self.stacks.len() {
            out.push_str(&cell(&col.to_string()));
        }
        out.push('\n');
        out
    }

    /// Checks the structural invariants against a world's object table.
    pub fn validate(&self, world: &World) -> anyhow::Result<()> {
        ensure!(!self.stacks.is_empty(), "a world must have at least one column");
        ensure!(
            self.arm < self.stacks.len(),
            "arm column {} out of range 0..{}",
            self.arm,
            self.stacks.len()
        );

        let mut seen = HashSet::new();
        let held = self.holding.iter().map(|id| (usize::MAX, id));
        for (col, id) in self
            .stacks
            .iter()
            .enumerate()
            .flat_map(|(col, stack)| stack.iter().map(move |id| (col, id)))
            .chain(held)
        {
            if id == FLOOR {
                bail!("the floor may not appear in column {col} or the hand");
            }
            if world.spec(id).is_none() {
                bail!("identifier {id} does not resolve in the object table");
            }
            if !seen.insert(id.clone()) {
                bail!("identifier {id} appears more than once");
            }
        }
        Ok(())
    }
}
