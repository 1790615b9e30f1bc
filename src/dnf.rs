//! Goal formulas: literals, conjunctions, and their disjunction.
//!
//! The textual form round-trips through [`DnfFormula::parse`], which also
//! backs the `dnf ` escape hatch of the driver: conjunctions separated by
//! `|`, literals by `&`, each literal `rel(a,b)`, `rel(a)`, or `-rel(...)`.

use derive_more::{Deref, DerefMut, From};
use itertools::Itertools;
use thiserror::Error;

use crate::relation::Relation;
use crate::world::{World, WorldState};

/// An atomic relational claim over one or two identifiers.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Literal {
    pub relation: Relation,
    args: Vec<String>,
    pub polarity: bool,
}

impl Literal {
    pub fn unary(relation: Relation, a: impl Into<String>) -> Self {
        Literal { relation, args: vec![a.into()], polarity: true }
    }

    pub fn binary(relation: Relation, a: impl Into<String>, b: impl Into<String>) -> Self {
        Literal { relation, args: vec![a.into(), b.into()], polarity: true }
    }

    pub fn negated(mut self) -> Self {
        self.polarity = !self.polarity;
        self
    }

    pub fn first(&self) -> &str {
        &self.args[0]
    }

    pub fn second(&self) -> Option<&str> {
        self.args.get(1).map(String::as_str)
    }

    pub fn is_self_referential(&self) -> bool {
        self.second() == Some(self.first())
    }

    pub fn holds(&self, world: &World, state: &WorldState) -> bool {
        self.relation.test(world, state, self.first(), self.second()) == self.polarity
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.polarity {
            write!(f, "-")?;
        }
        write!(f, "{}({})", self.relation, self.args.join(","))
    }
}

/// Literals that must all hold at once.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
#[derive(Deref, DerefMut, From)]
pub struct Conjunction(pub Vec<Literal>);

impl Conjunction {
    pub fn satisfied(&self, world: &World, state: &WorldState) -> bool {
        self.0.iter().all(|lit| lit.holds(world, state))
    }
}

impl std::fmt::Display for Conjunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(" & "))
    }
}

/// The interpretation target: an ordered disjunction of conjunctions.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
#[derive(Deref, DerefMut, From)]
pub struct DnfFormula(pub Vec<Conjunction>);

impl DnfFormula {
    pub fn satisfied(&self, world: &World, state: &WorldState) -> bool {
        self.0.iter().any(|conj| conj.satisfied(world, state))
    }

    /// Drops conjunctions containing a self-referential literal. Run before
    /// the formula reaches the planner.
    pub fn without_self_references(&self) -> DnfFormula {
        DnfFormula(
            self.0
                .iter()
                .filter(|conj| !conj.iter().any(Literal::is_self_referential))
                .cloned()
                .collect(),
        )
    }

    pub fn parse(input: &str, world: &World) -> Result<DnfFormula, FormulaError> {
        if input.trim().is_empty() {
            return Err(FormulaError::Empty);
        }
        let mut conjunctions = Vec::new();
        for conj_src in input.split('|') {
            let mut literals = Vec::new();
            for lit_src in conj_src.split('&') {
                literals.push(parse_literal(lit_src.trim(), world)?);
            }
            conjunctions.push(Conjunction(literals));
        }
        if conjunctions.iter().all(|c| c.is_empty()) {
            return Err(FormulaError::Empty);
        }
        Ok(DnfFormula(conjunctions))
    }
}

impl std::fmt::Display for DnfFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(" | "))
    }
}

#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("malformed literal `{0}`")]
    Malformed(String),
    #[error("unknown relation `{0}`")]
    UnknownRelation(String),
    #[error("`{relation}` takes {expected} argument(s), got {got}")]
    Arity { relation: Relation, expected: usize, got: usize },
    #[error("unknown object `{0}`")]
    UnknownObject(String),
    #[error("empty formula")]
    Empty,
}

fn parse_literal(src: &str, world: &World) -> Result<Literal, FormulaError> {
    let malformed = || FormulaError::Malformed(src.to_owned());
    let (polarity, src_body) = match src.strip_prefix('-') {
        Some(rest) => (false, rest.trim_start()),
        None => (true, src),
    };
    let (name, rest) = src_body.split_once('(').ok_or_else(malformed)?;
    let args_src = rest.strip_suffix(')').ok_or_else(malformed)?;

    let relation = Relation::from_name(name.trim())
        .ok_or_else(|| FormulaError::UnknownRelation(name.trim().to_owned()))?;
    let args: Vec<String> =
        args_src.split(',').map(|a| a.trim().to_owned()).filter(|a| !a.is_empty()).collect();
    if args.len() != relation.arity() {
        return Err(FormulaError::Arity {
            relation,
            expected: relation.arity(),
            got: args.len(),
        });
    }
    for arg in &args {
        if world.spec(arg).is_none() {
            return Err(FormulaError::UnknownObject(arg.clone()));
        }
    }
    let mut literal = match &args[..] {
        [a] => Literal::unary(relation, a.as_str()),
        [a, b] => Literal::binary(relation, a.as_str(), b.as_str()),
        _ => unreachable!("arity checked above"),
    };
    if !polarity {
        literal = literal.negated();
    }
    Ok(literal)
}
