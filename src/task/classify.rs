//! Usage classification over condition trees.
//!
//! One pass over the leaf predicates of a task collects, per concept: whether
//! it is used as a substance, as a non-substance, as a fillable container,
//! and which predicates it appears with. A second pass extracts the `inroom`
//! placements that become room requirements.

use std::collections::{BTreeMap, HashMap};

use crate::concept::ConceptUsage;
use crate::error::{DataQualityWarning, TaskError, WarningLog};

use super::condition::{CONNECTIVES, Condition, strip_variable, variable_name};

/// Predicates whose object argument is a substance.
pub const SUBSTANCE_PREDICATES: &[&str] =
    &["filled", "insource", "empty", "saturated", "contains", "covered"];

/// Predicates that apply to substances and non-substances alike.
pub const UNIVERSAL_PREDICATES: &[&str] = &["future", "real"];

/// Predicates whose first argument needs a fillable volume.
pub const FILLABLE_PREDICATES: &[&str] = &["filled", "contains", "empty"];

/// Concepts that are never placed as room inventory.
pub const UNTRACKED_ROOM_CONCEPTS: &[&str] = &["floor.n.01", "wall.n.01"];

const INROOM: &str = "inroom";

/// Maps the object variables of one task to its (canonical) concepts.
#[derive(Debug, Clone, Default)]
pub struct VariableResolver {
    /// Declared variable → canonical concept.
    variables: HashMap<String, String>,
    /// Raw or canonical concept spelling → canonical concept.
    concepts: HashMap<String, String>,
}

impl VariableResolver {
    /// Register a declared concept (raw spelling, canonical spelling) and its
    /// variables.
    pub fn declare<'v>(
        &mut self,
        raw: &str,
        canonical: &str,
        variables: impl IntoIterator<Item = &'v String>,
    ) {
        self.concepts.insert(raw.to_string(), canonical.to_string());
        self.concepts
            .insert(canonical.to_string(), canonical.to_string());
        for var in variables {
            self.variables
                .insert(variable_name(var).to_string(), canonical.to_string());
        }
    }

    /// The concept a token refers to, if it names a declared object.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        if let Some(concept) = self.variables.get(variable_name(token)) {
            return Some(concept);
        }
        self.concepts.get(strip_variable(token)).map(String::as_str)
    }
}

/// Per-concept usage observed in one task.
pub type UsageMap = BTreeMap<String, ConceptUsage>;

/// Argument positions of a substance predicate: (non-substance subject, substance).
///
/// `covered` lists the substance first unless the second argument is a stain
/// or dust variable.
fn substance_positions(name: &str, args: &[&str]) -> (usize, usize) {
    if name != "covered" {
        return (0, 1);
    }
    let reversed = args
        .get(1)
        .is_some_and(|a| a.contains("stain") || a.contains("dust"));
    if reversed { (0, 1) } else { (1, 0) }
}

/// Classify how every concept in `conditions` is used.
///
/// An unresolvable token in a substance position is a data-quality warning;
/// the stripped token itself is tagged as the substance instead.
pub fn classify_usage<'c>(
    task: &str,
    conditions: impl IntoIterator<Item = &'c Condition>,
    resolver: &VariableResolver,
    warnings: &mut WarningLog,
) -> UsageMap {
    let mut usage = UsageMap::new();

    let mut visit = |name: &str, args: &[Condition]| {
        let terms: Vec<&str> = args.iter().filter_map(Condition::as_term).collect();

        for term in &terms {
            if let Some(concept) = resolver.resolve(term) {
                usage
                    .entry(concept.to_string())
                    .or_default()
                    .predicates
                    .insert(name.to_string());
            }
        }

        if FILLABLE_PREDICATES.contains(&name) {
            if let Some(concept) = terms.first().and_then(|t| resolver.resolve(t)) {
                usage.entry(concept.to_string()).or_default().used_as_fillable = true;
            }
        }

        if SUBSTANCE_PREDICATES.contains(&name) {
            let (subject, substance) = substance_positions(name, &terms);
            if let Some(concept) = terms.get(subject).and_then(|t| resolver.resolve(t)) {
                usage.entry(concept.to_string()).or_default().used_as_non_substance = true;
            }
            if let Some(token) = terms.get(substance) {
                let concept = match resolver.resolve(token) {
                    Some(concept) => concept.to_string(),
                    None => {
                        let fallback = strip_variable(token).to_string();
                        warnings.push(DataQualityWarning::UnresolvedSubstanceVariable {
                            task: task.to_string(),
                            token: token.to_string(),
                            fallback: fallback.clone(),
                        });
                        fallback
                    }
                };
                usage.entry(concept).or_default().used_as_substance = true;
            }
        } else if !UNIVERSAL_PREDICATES.contains(&name) && !CONNECTIVES.contains(&name) {
            for term in &terms {
                if let Some(concept) = resolver.resolve(term) {
                    usage.entry(concept.to_string()).or_default().used_as_non_substance = true;
                }
            }
        }
    };

    for cond in conditions {
        cond.for_each_leaf(&mut visit);
    }
    usage
}

/// Count the `inroom` placements of a task: room type → concept → count.
///
/// Every `inroom` leaf must have exactly two bare arguments and its object
/// must resolve to a declared concept. Untracked concepts (floors, walls)
/// are dropped.
pub fn room_placements<'c>(
    task: &str,
    conditions: impl IntoIterator<Item = &'c Condition>,
    resolver: &VariableResolver,
) -> Result<BTreeMap<String, BTreeMap<String, u32>>, TaskError> {
    let mut leaves: Vec<(&[Condition], &Condition)> = Vec::new();
    for cond in conditions {
        collect_inroom(cond, &mut leaves);
    }

    let mut placements: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
    for (args, node) in leaves {
        let (Some(object), Some(room_type), 2) = (
            args.first().and_then(Condition::as_term),
            args.get(1).and_then(Condition::as_term),
            args.len(),
        ) else {
            return Err(TaskError::MalformedInroom {
                task: task.to_string(),
                condition: node.to_string(),
            });
        };
        let Some(concept) = resolver.resolve(object) else {
            return Err(TaskError::UnknownInroomObject {
                task: task.to_string(),
                variable: object.to_string(),
            });
        };
        if UNTRACKED_ROOM_CONCEPTS.contains(&concept) {
            continue;
        }
        *placements
            .entry(room_type.to_string())
            .or_default()
            .entry(concept.to_string())
            .or_default() += 1;
    }
    Ok(placements)
}

fn collect_inroom<'a>(cond: &'a Condition, out: &mut Vec<(&'a [Condition], &'a Condition)>) {
    match cond {
        Condition::Term(_) => {}
        Condition::Group(children) => {
            for child in children {
                collect_inroom(child, out);
            }
        }
        Condition::Predicate { name, args } => {
            if name == INROOM {
                out.push((args.as_slice(), cond));
            }
            for arg in args {
                collect_inroom(arg, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> VariableResolver {
        let mut r = VariableResolver::default();
        for (concept, vars) in [
            ("table.n.02", vec!["table.n.02_1"]),
            ("dust.n.01", vec!["dust.n.01_1"]),
            ("apple.n.01", vec!["apple.n.01_1", "apple.n.01_2"]),
            ("jar.n.01", vec!["jar.n.01_1"]),
            ("water.n.06", vec!["water.n.06_1"]),
            ("floor.n.01", vec!["floor.n.01_1"]),
        ] {
            let vars: Vec<String> = vars.into_iter().map(String::from).collect();
            r.declare(concept, concept, &vars);
        }
        r
    }

    #[test]
    fn covered_with_dust_reverses_arguments() {
        let cond = Condition::atom("covered", ["table.n.02_1", "dust.n.01_1"]);
        let mut log = WarningLog::new();
        let usage = classify_usage("t-0", [&cond], &resolver(), &mut log);
        assert!(usage["dust.n.01"].used_as_substance);
        assert!(!usage["table.n.02"].used_as_substance);
        assert!(usage["table.n.02"].used_as_non_substance);
        assert!(log.is_empty());
    }

    #[test]
    fn filled_marks_container_fillable_and_contents_substance() {
        let cond = Condition::atom("filled", ["jar.n.01_1", "water.n.06_1"]);
        let mut log = WarningLog::new();
        let usage = classify_usage("t-0", [&cond], &resolver(), &mut log);
        assert!(usage["jar.n.01"].used_as_fillable);
        assert!(usage["jar.n.01"].used_as_non_substance);
        assert!(usage["water.n.06"].used_as_substance);
        assert!(!usage["water.n.06"].used_as_fillable);
        assert!(usage["water.n.06"].predicates.contains("filled"));
    }

    #[test]
    fn universal_predicates_do_not_classify() {
        let cond = Condition::atom("future", ["water.n.06_1"]);
        let mut log = WarningLog::new();
        let usage = classify_usage("t-0", [&cond], &resolver(), &mut log);
        let water = &usage["water.n.06"];
        assert!(!water.used_as_substance && !water.used_as_non_substance);
        assert!(water.predicates.contains("future"));
    }

    #[test]
    fn other_predicates_mark_all_arguments_non_substance() {
        let cond = Condition::atom("ontop", ["apple.n.01_1", "table.n.02_1"]);
        let mut log = WarningLog::new();
        let usage = classify_usage("t-0", [&cond], &resolver(), &mut log);
        assert!(usage["apple.n.01"].used_as_non_substance);
        assert!(usage["table.n.02"].used_as_non_substance);
    }

    #[test]
    fn unresolved_substance_falls_back_with_warning() {
        let cond = Condition::atom("filled", ["jar.n.01_1", "?milk.n.01_3"]);
        let mut log = WarningLog::new();
        let usage = classify_usage("t-0", [&cond], &resolver(), &mut log);
        assert!(usage["milk.n.01"].used_as_substance);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn quantified_variables_resolve_by_concept() {
        let json = r#"["forall", ["?apple.n.01", "-", "apple.n.01"], ["cooked", "?apple.n.01"]]"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        let mut log = WarningLog::new();
        let usage = classify_usage("t-0", [&cond], &resolver(), &mut log);
        assert!(usage["apple.n.01"].used_as_non_substance);
        assert!(usage["apple.n.01"].predicates.contains("cooked"));
    }

    #[test]
    fn inroom_counts_aggregate_and_skip_floors() {
        let conds = [
            Condition::atom("inroom", ["apple.n.01_1", "kitchen"]),
            Condition::atom("inroom", ["apple.n.01_2", "kitchen"]),
            Condition::atom("inroom", ["floor.n.01_1", "kitchen"]),
            Condition::atom("inroom", ["table.n.02_1", "dining_room"]),
        ];
        let placements = room_placements("t-0", &conds, &resolver()).unwrap();
        assert_eq!(placements["kitchen"]["apple.n.01"], 2);
        assert!(!placements["kitchen"].contains_key("floor.n.01"));
        assert_eq!(placements["dining_room"]["table.n.02"], 1);
    }

    #[test]
    fn inroom_with_wrong_arity_is_fatal() {
        let cond = Condition::atom("inroom", ["apple.n.01_1"]);
        let err = room_placements("boil-0", [&cond], &resolver()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("boil-0:"), "{msg}");
        assert!(matches!(err, TaskError::MalformedInroom { .. }));
    }

    #[test]
    fn inroom_with_undeclared_object_is_fatal() {
        let cond = Condition::atom("inroom", ["chair.n.01_1", "kitchen"]);
        let err = room_placements("t-0", [&cond], &resolver()).unwrap_err();
        assert!(matches!(err, TaskError::UnknownInroomObject { .. }));
    }
}
