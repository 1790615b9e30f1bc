//! Utterance grammar: tokens, the grammar AST, and a backtracking parser.
//!
//! The parser returns *every* complete parse of an utterance, so attachment
//! ambiguity ("put a ball in a box on the floor") surfaces as multiple
//! `Command`s for the interpreter to arbitrate. Input is lowercased and
//! stripped of non-word characters before parsing.

use derive_more::IsVariant;
use enum_iterator::all;
use enum_map::{EnumMap, enum_map};
use itertools::Itertools;
use log::debug;

use crate::relation::Relation;
use crate::world::{Color, Form, ObjectSpec, Size, color_word, form_word, size_word};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(IsVariant)]
pub enum Quantifier {
    Any,
    All,
    The,
}

/// Form/size/color test with wildcards (`AnyForm`, `Unspecified`).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObjectFilter {
    pub form: Form,
    pub size: Size,
    pub color: Color,
}

impl ObjectFilter {
    pub fn matches(&self, spec: &ObjectSpec) -> bool {
        self.form.matches(spec.form)
            && self.size.matches(spec.size)
            && self.color.matches(spec.color)
    }

    /// "small blue box", "object", ...
    pub fn describe(&self) -> String {
        let words =
            [size_word(self.size), color_word(self.color), form_word(self.form)];
        words.into_iter().filter(|w| !w.is_empty()).join(" ")
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ObjectDesc {
    Simple(ObjectFilter),
    /// An object further constrained by where it is: "a ball (that is) in a
    /// box".
    Relative(Box<ObjectDesc>, Location),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Location {
    pub relation: Relation,
    /// Ignored by unary relations ("at any location", "being held").
    pub entity: Box<Entity>,
}

impl Location {
    fn unary(relation: Relation) -> Self {
        let anything = Entity {
            quantifier: Quantifier::Any,
            object: ObjectDesc::Simple(ObjectFilter {
                form: Form::AnyForm,
                size: Size::Unspecified,
                color: Color::Unspecified,
            }),
        };
        Location { relation, entity: Box::new(anything) }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Entity {
    pub quantifier: Quantifier,
    pub object: ObjectDesc,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[derive(IsVariant)]
pub enum Command {
    Take(Entity),
    /// "put it ⟨location⟩" — operates on whatever is held.
    Drop(Location),
    Move(Entity, Location),
    /// An utterance answering a disambiguation question.
    Clarify(Entity),
}

pub fn tokenize(utterance: &str) -> Vec<String> {
    utterance
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// All complete `Command` parses of an utterance, in grammar order,
/// duplicates removed.
pub fn parse_utterance(utterance: &str) -> Vec<Command> {
    let mut tokens = tokenize(utterance);
    if tokens.last().is_some_and(|t| t == "please") {
        tokens.pop();
    }
    let parser = Parser { tokens: &tokens };
    let start = parser.skip_polite(0);
    let parses: Vec<Command> = parser
        .command(start)
        .into_iter()
        .filter(|(_, end)| *end == tokens.len())
        .map(|(cmd, _)| cmd)
        .unique()
        .collect();
    debug!(target: "parse", "{} parse(s) for {utterance:?}", parses.len());
    parses
}

/// Parses a clarification reply: a bare entity, with "the" implied when the
/// quantifier is missing.
pub fn parse_clarifications(utterance: &str) -> Vec<Command> {
    let tokens = tokenize(utterance);
    let parser = Parser { tokens: &tokens };
    let mut entities: Vec<Entity> = parser
        .entity(0)
        .into_iter()
        .filter(|(_, end)| *end == tokens.len())
        .map(|(ent, _)| ent)
        .collect();
    if entities.is_empty() {
        entities = parser
            .object(0)
            .into_iter()
            .filter(|(_, end)| *end == tokens.len())
            .map(|(object, _)| Entity { quantifier: Quantifier::The, object })
            .collect();
    }
    entities.into_iter().map(Command::Clarify).unique().collect()
}

type Parses<T> = Vec<(T, usize)>;

struct Parser<'a> {
    tokens: &'a [String],
}

impl Parser<'_> {
    fn at(&self, pos: usize) -> Option<&str> {
        self.tokens.get(pos).map(String::as_str)
    }

    fn literal(&self, pos: usize, words: &[&str]) -> Option<usize> {
        for (i, word) in words.iter().enumerate() {
            if self.at(pos + i) != Some(*word) {
                return None;
            }
        }
        Some(pos + words.len())
    }

    /// "please", "will/can/could you", optionally chained.
    fn skip_polite(&self, mut pos: usize) -> usize {
        loop {
            if let Some(next) = self.literal(pos, &["please"]) {
                pos = next;
            } else if matches!(self.at(pos), Some("will" | "can" | "could"))
                && self.at(pos + 1) == Some("you")
            {
                pos += 2;
            } else {
                return pos;
            }
        }
    }

    fn command(&self, pos: usize) -> Parses<Command> {
        let mut out = Vec::new();
        let take_starts = [
            self.literal(pos, &["take"]),
            self.literal(pos, &["grasp"]),
            self.literal(pos, &["pick", "up"]),
        ];
        for start in take_starts.into_iter().flatten() {
            for (entity, end) in self.entity(start) {
                out.push((Command::Take(entity), end));
            }
        }

        if matches!(self.at(pos), Some("move" | "put" | "drop")) {
            let start = pos + 1;
            if let Some(after_it) = self.literal(start, &["it"]) {
                for (location, end) in self.location(after_it) {
                    out.push((Command::Drop(location), end));
                }
            }
            for (entity, mid) in self.entity(start) {
                for (location, end) in self.location(mid) {
                    out.push((Command::Move(entity.clone(), location), end));
                }
            }
        }
        out
    }

    fn quantifier(&self, pos: usize) -> Option<(Quantifier, usize)> {
        let quantifier = match self.at(pos)? {
            "any" | "a" | "an" => Quantifier::Any,
            "every" | "all" => Quantifier::All,
            "the" => Quantifier::The,
            _ => return None,
        };
        Some((quantifier, pos + 1))
    }

    fn entity(&self, pos: usize) -> Parses<Entity> {
        let Some((quantifier, start)) = self.quantifier(pos) else {
            return Vec::new();
        };
        self.object(start)
            .into_iter()
            .map(|(object, end)| (Entity { quantifier, object }, end))
            .collect()
    }

    /// A simple object plus any number of relative-location attachments,
    /// each optionally introduced by "that is"/"that are".
    fn object(&self, pos: usize) -> Parses<ObjectDesc> {
        let Some((filter, end)) = self.simple_object(pos) else {
            return Vec::new();
        };
        let mut out: Parses<ObjectDesc> = vec![(ObjectDesc::Simple(filter), end)];
        let mut layer = out.clone();
        while !layer.is_empty() {
            let mut next = Vec::new();
            for (desc, at) in &layer {
                let mut starts = vec![*at];
                if self.at(*at) == Some("that") && matches!(self.at(at + 1), Some("is" | "are")) {
                    starts.push(at + 2);
                }
                for start in starts {
                    for (location, end) in self.location(start) {
                        next.push((ObjectDesc::Relative(Box::new(desc.clone()), location), end));
                    }
                }
            }
            out.extend(next.iter().cloned());
            layer = next;
        }
        out
    }

    fn simple_object(&self, pos: usize) -> Option<(ObjectFilter, usize)> {
        let mut size = Size::Unspecified;
        let mut color = Color::Unspecified;
        let mut pos = pos;
        loop {
            let word = self.at(pos)?;
            if let Some(parsed) = word_size(word) {
                size = parsed;
                pos += 1;
            } else if let Some(parsed) = word_color(word) {
                color = parsed;
                pos += 1;
            } else {
                let form = word_form(word)?;
                return Some((ObjectFilter { form, size, color }, pos + 1));
            }
        }
    }

    fn location(&self, pos: usize) -> Parses<Location> {
        let mut out = Vec::new();
        if let Some(end) = self.literal(pos, &["at", "any", "location"]) {
            out.push((Location::unary(Relation::AnyPlace), end));
        }
        if let Some(end) = self.literal(pos, &["being", "held"]) {
            out.push((Location::unary(Relation::Holding), end));
        }
        for (relation, start) in self.relation_phrase(pos) {
            for (entity, end) in self.entity(start) {
                out.push((Location { relation, entity: Box::new(entity) }, end));
            }
        }
        out
    }

    fn relation_phrase(&self, pos: usize) -> Vec<(Relation, usize)> {
        const PHRASES: &[(&[&str], Relation)] = &[
            (&["to", "the", "left", "of"], Relation::LeftOf),
            (&["to", "the", "right", "of"], Relation::RightOf),
            (&["left", "of"], Relation::LeftOf),
            (&["right", "of"], Relation::RightOf),
            (&["on", "top", "of"], Relation::OnTop),
            (&["on"], Relation::OnTop),
            (&["to"], Relation::OnTop),
            (&["inside"], Relation::Inside),
            (&["into"], Relation::Inside),
            (&["in"], Relation::Inside),
            (&["under"], Relation::Under),
            (&["below"], Relation::Under),
            (&["next", "to"], Relation::Beside),
            (&["beside"], Relation::Beside),
            (&["above"], Relation::Above),
        ];
        PHRASES
            .iter()
            .filter_map(|(phrase, relation)| {
                self.literal(pos, phrase).map(|end| (*relation, end))
            })
            .collect()
    }
}

fn word_form(word: &str) -> Option<Form> {
    let lexicon = form_lexicon();
    let singular = [
        Some(word),
        word.strip_suffix('s'),
        word.strip_suffix("es"),
    ];
    singular
        .into_iter()
        .flatten()
        .find_map(|w| all::<Form>().find(|form| lexicon[*form].contains(&w)))
}

fn form_lexicon() -> EnumMap<Form, &'static [&'static str]> {
    enum_map! {
        Form::Brick => &["brick"][..],
        Form::Plank => &["plank"],
        Form::Ball => &["ball"],
        Form::Pyramid => &["pyramid"],
        Form::Box => &["box"],
        Form::Table => &["table"],
        Form::Floor => &["floor"],
        Form::AnyForm => &["object", "thing", "form", "one"],
    }
}

fn word_size(word: &str) -> Option<Size> {
    match word {
        "small" | "tiny" => Some(Size::Small),
        "large" | "big" => Some(Size::Large),
        _ => None,
    }
}

fn word_color(word: &str) -> Option<Color> {
    match word {
        "red" => Some(Color::Red),
        "black" => Some(Color::Black),
        "blue" => Some(Color::Blue),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "white" => Some(Color::White),
        _ => None,
    }
}
