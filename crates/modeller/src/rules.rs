//! Standard relationships between element types.
//!
//! The table lists which relationship a pair of element types carries by
//! default. [`derive_relationships`] applies it to a catalogue and proposes
//! the relationships that are not declared yet.

use std::collections::BTreeSet;

use log::debug;

use modeller_core::catalogue::{Element, ElementType, Relationship};

/// One standard relationship between element types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    pub relationship_type: &'static str,
    pub source: ElementType,
    pub target: ElementType,
}

const fn rule(source: ElementType, relationship_type: &'static str, target: ElementType) -> TypeRule {
    TypeRule {
        relationship_type,
        source,
        target,
    }
}

/// The standard rule table, in declaration order.
pub fn standard_rules() -> Vec<TypeRule> {
    use ElementType::*;

    vec![
        rule(Organisation, "performs", Process),
        rule(People, "uses", Object),
        rule(People, "achieves", Outcome),
        rule(Capability, "requires", Asset),
        rule(Process, "requires", Asset),
        rule(Process, "realises", Capability),
        rule(People, "pursue", Purpose),
        rule(Organisation, "pursue", Purpose),
        rule(Content, "expresses", Purpose),
        rule(Content, "conveys", Story),
        rule(Story, "contextualises", Purpose),
        rule(Task, "is_part_of", Journey),
        rule(Journey, "traverses", Channel),
        rule(Process, "creates", Product),
        rule(Organisation, "makes", Product),
        rule(Product, "features in", Journey),
        rule(Product, "serves", Task),
        rule(Product, "embodies", Brand),
        rule(People, "perceives", Brand),
        rule(Brand, "appears in", Journey),
    ]
}

/// Whether two elements may be related under the enterprise boundary.
///
/// Elements are only kept apart when both name an enterprise and the names
/// differ, ignoring case.
fn same_enterprise(a: &Element, b: &Element) -> bool {
    match (a.enterprise.as_deref(), b.enterprise.as_deref()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => true,
    }
}

/// Propose the standard relationships missing from `existing`.
///
/// Proposals are ordered by rule, then source id, then target id. A triple
/// is never proposed twice and never proposed if it already exists.
pub fn derive_relationships(elements: &[Element], existing: &[Relationship]) -> Vec<Relationship> {
    let mut seen: BTreeSet<(u64, u64, String)> = existing
        .iter()
        .map(|r| {
            (
                r.source_element_id,
                r.target_element_id,
                r.relationship_type.clone(),
            )
        })
        .collect();

    let mut sorted: Vec<&Element> = elements.iter().collect();
    sorted.sort_by_key(|e| e.id);

    let mut proposed = Vec::new();
    for rule in standard_rules() {
        let sources = sorted.iter().filter(|e| e.element_type == rule.source);
        for source in sources {
            let targets = sorted.iter().filter(|e| e.element_type == rule.target);
            for target in targets {
                if source.id == target.id || !same_enterprise(source, target) {
                    continue;
                }
                let key = (source.id, target.id, rule.relationship_type.to_string());
                if seen.insert(key) {
                    proposed.push(Relationship::new(
                        source.id,
                        target.id,
                        rule.relationship_type,
                    ));
                }
            }
        }
    }

    debug!(proposed = proposed.len(); "Derived standard relationships");
    proposed
}
