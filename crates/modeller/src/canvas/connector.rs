//! Automatic connections derived from relationship rules.
//!
//! A rule `(source element, target element, type)` asks for one connection
//! from every instance of the source element to every instance of the
//! target element. [`AutoConnector::on_placed`] adds the connections a new
//! instance needs; [`AutoConnector::synchronize`] recomputes the whole
//! required set and applies the difference. Manual connections are never
//! touched by either.

use std::collections::BTreeSet;

use log::debug;

use modeller_core::catalogue::{ElementId, Relationship};

use super::model::{CanvasModel, InstanceId, Provenance};
use crate::error::ModellerError;

type Triple = (InstanceId, InstanceId, String);

/// The relationship rules a canvas connects by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeSet<(ElementId, ElementId, String)>,
}

impl RuleSet {
    pub fn new(relationships: &[Relationship]) -> Self {
        Self {
            rules: relationships
                .iter()
                .map(|r| {
                    (
                        r.source_element_id,
                        r.target_element_id,
                        r.relationship_type.clone(),
                    )
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = (ElementId, ElementId, &str)> {
        self.rules.iter().map(|(s, t, r)| (*s, *t, r.as_str()))
    }
}

/// Added and removed connection counts from one synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConnector;

impl AutoConnector {
    /// Create the automatic connections a newly placed instance needs.
    ///
    /// Returns the ids of the connections created.
    pub fn on_placed(
        &self,
        model: &mut CanvasModel,
        rules: &RuleSet,
        instance_id: InstanceId,
    ) -> Result<Vec<InstanceId>, ModellerError> {
        let element_type_id = model
            .element(instance_id)
            .ok_or_else(|| ModellerError::not_found("element instance", instance_id))?
            .element_type_id;

        let mut wanted: Vec<Triple> = Vec::new();
        for (source, target, relationship_type) in rules.iter() {
            if source == element_type_id {
                wanted.extend(
                    model
                        .instances_of(target)
                        .filter(|other| other.id != instance_id)
                        .map(|other| (instance_id, other.id, relationship_type.to_string())),
                );
            }
            if target == element_type_id {
                wanted.extend(
                    model
                        .instances_of(source)
                        .filter(|other| other.id != instance_id)
                        .map(|other| (other.id, instance_id, relationship_type.to_string())),
                );
            }
        }

        let mut created = Vec::new();
        for (source, target, relationship_type) in wanted {
            if let Some(id) =
                model.add_connection(source, target, &relationship_type, Provenance::Auto)?
            {
                debug!(
                    connection_id = id,
                    source,
                    target,
                    relationship_type = relationship_type.as_str();
                    "Connection created"
                );
                created.push(id);
            }
        }
        Ok(created)
    }

    /// The full set of triples the rules require on this canvas.
    pub fn required(&self, model: &CanvasModel, rules: &RuleSet) -> BTreeSet<Triple> {
        let mut required = BTreeSet::new();
        for (source, target, relationship_type) in rules.iter() {
            for from in model.instances_of(source) {
                for to in model.instances_of(target) {
                    if from.id != to.id {
                        required.insert((from.id, to.id, relationship_type.to_string()));
                    }
                }
            }
        }
        required
    }

    /// Bring the automatic connections in line with `rules`.
    ///
    /// Automatic connections no rule requires are removed; required triples
    /// with no connection of either provenance are added.
    pub fn synchronize(
        &self,
        model: &mut CanvasModel,
        rules: &RuleSet,
    ) -> Result<SyncReport, ModellerError> {
        let required = self.required(model, rules);

        let removed = model.retain_connections(|c| {
            c.provenance == Provenance::Manual
                || required.contains(&(
                    c.source_instance_id,
                    c.target_instance_id,
                    c.relationship_type.clone(),
                ))
        });

        let mut added = 0;
        for (source, target, relationship_type) in &required {
            if model
                .add_connection(*source, *target, relationship_type, Provenance::Auto)?
                .is_some()
            {
                added += 1;
            }
        }

        debug!(added, removed; "Connections synchronized");
        Ok(SyncReport { added, removed })
    }
}

#[cfg(test)]
mod tests {
    use modeller_core::geometry::{Point, Size};

    use super::*;

    const A: ElementId = 1;
    const B: ElementId = 2;

    fn place(model: &mut CanvasModel, element: ElementId) -> InstanceId {
        model
            .place_element(element, "instance", Point::default(), Size::new(100.0, 50.0))
            .unwrap()
    }

    fn triples(model: &CanvasModel) -> Vec<(InstanceId, InstanceId, String)> {
        model
            .connections()
            .map(|c| {
                (
                    c.source_instance_id,
                    c.target_instance_id,
                    c.relationship_type.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn test_place_creates_one_connection_per_rule() {
        let rules = RuleSet::new(&[Relationship::new(A, B, "uses")]);
        let connector = AutoConnector;
        let mut model = CanvasModel::new(1, Size::new(800.0, 600.0));

        let a = place(&mut model, A);
        assert!(connector.on_placed(&mut model, &rules, a).unwrap().is_empty());
        let b1 = place(&mut model, B);
        assert_eq!(connector.on_placed(&mut model, &rules, b1).unwrap().len(), 1);
        assert_eq!(triples(&model), vec![(a, b1, "uses".to_string())]);

        let b2 = place(&mut model, B);
        assert_eq!(connector.on_placed(&mut model, &rules, b2).unwrap().len(), 1);
        assert_eq!(model.connections().count(), 2);

        // Placing again is idempotent.
        assert!(connector.on_placed(&mut model, &rules, b2).unwrap().is_empty());

        model.remove_element(b1).unwrap();
        assert_eq!(triples(&model), vec![(a, b2, "uses".to_string())]);
    }

    #[test]
    fn test_no_self_connection_for_reflexive_rule() {
        let rules = RuleSet::new(&[Relationship::new(A, A, "relates")]);
        let connector = AutoConnector;
        let mut model = CanvasModel::new(1, Size::new(800.0, 600.0));

        let first = place(&mut model, A);
        assert!(connector.on_placed(&mut model, &rules, first).unwrap().is_empty());
        let second = place(&mut model, A);
        connector.on_placed(&mut model, &rules, second).unwrap();

        assert_eq!(
            triples(&model),
            vec![
                (second, first, "relates".to_string()),
                (first, second, "relates".to_string()),
            ]
        );
    }

    #[test]
    fn test_synchronize_prunes_auto_and_keeps_manual() {
        let connector = AutoConnector;
        let mut model = CanvasModel::new(1, Size::new(800.0, 600.0));
        let a = place(&mut model, A);
        let b = place(&mut model, B);

        let uses = RuleSet::new(&[Relationship::new(A, B, "uses")]);
        connector.synchronize(&mut model, &uses).unwrap();
        model
            .add_connection(b, a, "feeds", Provenance::Manual)
            .unwrap();

        let serves = RuleSet::new(&[Relationship::new(A, B, "serves")]);
        let report = connector.synchronize(&mut model, &serves).unwrap();

        assert_eq!(report, SyncReport { added: 1, removed: 1 });
        assert_eq!(
            triples(&model),
            vec![(b, a, "feeds".to_string()), (a, b, "serves".to_string())]
        );
    }

    #[test]
    fn test_synchronize_matches_incremental_placement() {
        let rules = RuleSet::new(&[
            Relationship::new(A, B, "uses"),
            Relationship::new(B, A, "serves"),
        ]);
        let connector = AutoConnector;

        let mut incremental = CanvasModel::new(1, Size::new(800.0, 600.0));
        for element in [A, B, B, A] {
            let id = place(&mut incremental, element);
            connector.on_placed(&mut incremental, &rules, id).unwrap();
        }

        let mut batch = incremental.clone();
        let report = connector.synchronize(&mut batch, &rules).unwrap();

        assert_eq!(report, SyncReport::default());
        assert_eq!(
            connector.required(&incremental, &rules).len(),
            incremental.connections().count()
        );
    }
}
