//! Condition trees of parsed task definitions.
//!
//! A parsed condition is a nested list of strings in prefix notation:
//! `["inroom", "apple.n.01_1", "kitchen"]`, or a list of such lists. It is
//! deserialized into a [`Condition`] tree so the classifiers can match on
//! shape instead of sniffing strings.

use serde::{Deserialize, Serialize};

/// Logical connectives and quantifiers. Their arguments are sub-conditions,
/// not object variables.
pub const CONNECTIVES: &[&str] = &[
    "and", "or", "not", "imply", "forall", "exists", "forn", "forpairs", "fornpairs",
];

/// A node of a condition tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    /// A bare token: an object variable, a room type, a number.
    Term(String),
    /// A list headed by a string.
    Predicate { name: String, args: Vec<Condition> },
    /// A list headed by another list, or an empty list.
    Group(Vec<Condition>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCondition {
    Atom(String),
    List(Vec<RawCondition>),
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        match raw {
            RawCondition::Atom(token) => Condition::Term(token),
            RawCondition::List(items) => {
                let mut items = items.into_iter();
                match items.next() {
                    Some(RawCondition::Atom(name)) => Condition::Predicate {
                        name,
                        args: items.map(Condition::from).collect(),
                    },
                    Some(first) => Condition::Group(
                        std::iter::once(first)
                            .chain(items)
                            .map(Condition::from)
                            .collect(),
                    ),
                    None => Condition::Group(Vec::new()),
                }
            }
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(cond: Condition) -> Self {
        match cond {
            Condition::Term(token) => RawCondition::Atom(token),
            Condition::Predicate { name, args } => RawCondition::List(
                std::iter::once(RawCondition::Atom(name))
                    .chain(args.into_iter().map(RawCondition::from))
                    .collect(),
            ),
            Condition::Group(children) => {
                RawCondition::List(children.into_iter().map(RawCondition::from).collect())
            }
        }
    }
}

impl Condition {
    pub fn predicate(name: impl Into<String>, args: Vec<Condition>) -> Self {
        Condition::Predicate {
            name: name.into(),
            args,
        }
    }

    /// Shorthand for a predicate over bare tokens.
    pub fn atom<I, S>(name: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::predicate(name, terms.into_iter().map(|t| Condition::Term(t.into())).collect())
    }

    pub fn as_term(&self) -> Option<&str> {
        match self {
            Condition::Term(t) => Some(t),
            _ => None,
        }
    }

    /// Call `f` with every non-connective predicate in the tree.
    ///
    /// Connectives and groups are descended into. Quantifier parameter lists
    /// (predicates headed by a `?` variable) are skipped.
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a str, &'a [Condition])) {
        match self {
            Condition::Term(_) => {}
            Condition::Group(children) => {
                for child in children {
                    child.for_each_leaf(f);
                }
            }
            Condition::Predicate { name, args } => {
                if name.starts_with('?') {
                    return;
                }
                if !CONNECTIVES.contains(&name.as_str()) {
                    f(name, args);
                }
                for arg in args {
                    arg.for_each_leaf(f);
                }
            }
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Term(t) => f.write_str(t),
            Condition::Predicate { name, args } => {
                write!(f, "({name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Condition::Group(children) => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Reduce a variable token to the concept name it encodes.
///
/// Keeps the text after the last `?`, then drops a trailing `_<digits>`
/// instance suffix: `?apple.n.01_1` becomes `apple.n.01`.
pub fn strip_variable(token: &str) -> &str {
    let tail = token.rsplit_once('?').map_or(token, |(_, t)| t);
    match tail.rsplit_once('_') {
        Some((head, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            head
        }
        _ => tail,
    }
}

/// Text after the last `?`, keeping any instance suffix.
pub fn variable_name(token: &str) -> &str {
    token.rsplit_once('?').map_or(token, |(_, t)| t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_variable_drops_qualifier_and_index() {
        assert_eq!(strip_variable("apple.n.01_1"), "apple.n.01");
        assert_eq!(strip_variable("?apple.n.01_12"), "apple.n.01");
        assert_eq!(strip_variable("?apple.n.01"), "apple.n.01");
        assert_eq!(strip_variable("countertop.n.01"), "countertop.n.01");
        assert_eq!(strip_variable("living_room"), "living_room");
        assert_eq!(strip_variable("trash_"), "trash_");
    }

    #[test]
    fn deserializes_into_tagged_tree() {
        let json = r#"[["and", ["inroom", "apple.n.01_1", "kitchen"], ["not", ["cooked", "apple.n.01_1"]]]]"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        let Condition::Group(children) = &cond else {
            panic!("expected a group, got {cond}");
        };
        assert_eq!(children.len(), 1);
        let Condition::Predicate { name, args } = &children[0] else {
            panic!("expected a predicate");
        };
        assert_eq!(name, "and");
        assert_eq!(args.len(), 2);
        assert_eq!(
            args[0],
            Condition::atom("inroom", ["apple.n.01_1", "kitchen"])
        );
    }

    #[test]
    fn serializes_back_to_nested_lists() {
        let cond = Condition::atom("ontop", ["apple.n.01_1", "table.n.02_1"]);
        let json = serde_json::to_string(&cond).unwrap();
        assert_eq!(json, r#"["ontop","apple.n.01_1","table.n.02_1"]"#);
    }

    #[test]
    fn leaves_skip_connectives_and_quantifier_params() {
        let json = r#"["forall", ["?jar.n.01", "-", "jar.n.01"], ["and", ["filled", "?jar.n.01", "water.n.06_1"], ["not", ["open", "?jar.n.01"]]]]"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        let mut seen = Vec::new();
        cond.for_each_leaf(&mut |name, _| seen.push(name));
        assert_eq!(seen, vec!["filled", "open"]);
    }

    #[test]
    fn display_is_prefix_notation() {
        let cond = Condition::atom("inroom", ["apple.n.01_1"]);
        assert_eq!(cond.to_string(), "(inroom apple.n.01_1)");
    }
}
