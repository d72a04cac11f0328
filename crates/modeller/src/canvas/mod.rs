//! The interactive canvas.
//!
//! [`CanvasSession`] wraps a [`CanvasModel`] and keeps it consistent after
//! every edit: placing an instance runs the [`AutoConnector`], and any edit
//! that changes a parent's geometry or its property set re-runs the
//! [`LayoutPropagator`] for that parent.

mod connector;
mod layout;
mod model;

pub use connector::{AutoConnector, RuleSet, SyncReport};
pub use layout::{LayoutPropagator, connection_endpoints};
pub use model::{
    CanvasId, CanvasModel, Connection, ElementInstance, InstanceId, PropertyInstance, Provenance,
};

use log::{debug, info};

use modeller_core::{
    catalogue::{ElementId, PropertyId, Relationship},
    geometry::{Point, Size},
};

use crate::{config::CanvasConfig, error::ModellerError};

/// Offset applied to a copied instance.
const COPY_OFFSET: Point = Point::new(20.0, 20.0);

/// An editable canvas plus the rules and layout it is kept consistent with.
#[derive(Debug, Clone)]
pub struct CanvasSession {
    model: CanvasModel,
    rules: RuleSet,
    connector: AutoConnector,
    layout: LayoutPropagator,
    config: CanvasConfig,
}

impl CanvasSession {
    pub fn new(model: CanvasModel, relationships: &[Relationship], config: CanvasConfig) -> Self {
        Self {
            model,
            rules: RuleSet::new(relationships),
            connector: AutoConnector,
            layout: LayoutPropagator::from_config(&config),
            config,
        }
    }

    pub fn model(&self) -> &CanvasModel {
        &self.model
    }

    /// Place an instance of `element_type_id` at `origin` with the default
    /// size and create its automatic connections.
    pub fn place(
        &mut self,
        element_type_id: ElementId,
        instance_name: &str,
        origin: Point,
    ) -> Result<InstanceId, ModellerError> {
        self.place_sized(
            element_type_id,
            instance_name,
            origin,
            self.config.default_element_size(),
        )
    }

    pub fn place_sized(
        &mut self,
        element_type_id: ElementId,
        instance_name: &str,
        origin: Point,
        size: Size,
    ) -> Result<InstanceId, ModellerError> {
        let id = self
            .model
            .place_element(element_type_id, instance_name, origin, size)?;
        let created = self.connector.on_placed(&mut self.model, &self.rules, id)?;
        debug!(
            instance_id = id,
            element_type_id,
            connections = created.len();
            "Instance placed"
        );
        Ok(id)
    }

    /// Copy an instance with its property instances.
    ///
    /// The copy is named `"<name> (copy)"`, offset from the original, and
    /// connected like any newly placed instance.
    pub fn copy_instance(&mut self, id: InstanceId) -> Result<InstanceId, ModellerError> {
        let original = self
            .model
            .element(id)
            .cloned()
            .ok_or_else(|| ModellerError::not_found("element instance", id))?;
        let properties: Vec<(PropertyId, String, f32)> = self
            .model
            .properties_of(id)
            .iter()
            .map(|p| (p.property_template_id, p.instance_name.clone(), p.height))
            .collect();

        let copy = self.place_sized(
            original.element_type_id,
            &format!("{} (copy)", original.instance_name),
            original.origin().add_point(COPY_OFFSET),
            original.size(),
        )?;
        for (template, name, height) in properties {
            self.model.attach_property(copy, template, &name, height)?;
        }
        self.layout.apply(&mut self.model, copy)?;
        Ok(copy)
    }

    pub fn move_to(&mut self, id: InstanceId, origin: Point) -> Result<(), ModellerError> {
        self.model.move_element(id, origin)?;
        self.layout.apply(&mut self.model, id)
    }

    pub fn resize(&mut self, id: InstanceId, size: Size) -> Result<(), ModellerError> {
        self.model.resize_element(id, size)?;
        self.layout.apply(&mut self.model, id)
    }

    pub fn rename(&mut self, id: InstanceId, name: &str) -> Result<(), ModellerError> {
        self.model.rename_element(id, name)
    }

    /// Delete an instance, its property instances and its connections.
    pub fn delete(&mut self, id: InstanceId) -> Result<ElementInstance, ModellerError> {
        let removed = self.model.remove_element(id)?;
        debug!(instance_id = id; "Instance deleted");
        Ok(removed)
    }

    /// Attach a property instance below `parent` and restack its siblings.
    pub fn attach_property(
        &mut self,
        parent: InstanceId,
        property_template_id: PropertyId,
        instance_name: &str,
    ) -> Result<InstanceId, ModellerError> {
        let id = self.model.attach_property(
            parent,
            property_template_id,
            instance_name,
            self.config.default_property_height(),
        )?;
        self.layout.apply(&mut self.model, parent)?;
        Ok(id)
    }

    pub fn detach_property(&mut self, id: InstanceId) -> Result<PropertyInstance, ModellerError> {
        let removed = self.model.detach_property(id)?;
        self.layout.apply(&mut self.model, removed.parent_instance_id)?;
        Ok(removed)
    }

    /// Draw a manual connection. Returns `None` if the triple already exists.
    pub fn connect(
        &mut self,
        source: InstanceId,
        target: InstanceId,
        relationship_type: &str,
    ) -> Result<Option<InstanceId>, ModellerError> {
        self.model
            .add_connection(source, target, relationship_type, Provenance::Manual)
    }

    pub fn disconnect(&mut self, connection_id: InstanceId) -> Result<Connection, ModellerError> {
        self.model.remove_connection(connection_id)
    }

    /// Replace the relationship rules and resynchronize automatic
    /// connections.
    pub fn set_rules(&mut self, relationships: &[Relationship]) -> Result<SyncReport, ModellerError> {
        self.rules = RuleSet::new(relationships);
        let report = self.connector.synchronize(&mut self.model, &self.rules)?;
        info!(
            canvas_id = self.model.id(),
            added = report.added,
            removed = report.removed;
            "Canvas connections synchronized"
        );
        Ok(report)
    }

    pub fn set_zoom(&mut self, zoom: f32) -> Result<(), ModellerError> {
        self.model.set_zoom(zoom)
    }

    pub fn set_pan(&mut self, pan: Point) -> Result<(), ModellerError> {
        self.model.set_pan(pan)
    }

    /// Current endpoints of a connection, clipped to both instances.
    pub fn endpoints(&self, connection_id: InstanceId) -> Result<(Point, Point), ModellerError> {
        let connection = self
            .model
            .connection(connection_id)
            .ok_or_else(|| ModellerError::not_found("connection", connection_id))?;
        let bounds = |id| {
            self.model
                .element(id)
                .map(ElementInstance::bounds)
                .ok_or_else(|| ModellerError::not_found("element instance", id))
        };
        Ok(connection_endpoints(
            bounds(connection.source_instance_id)?,
            bounds(connection.target_instance_id)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    const PORTAL: ElementId = 1;
    const GATEWAY: ElementId = 2;

    fn session() -> CanvasSession {
        CanvasSession::new(
            CanvasModel::new(1, Size::new(1200.0, 800.0)),
            &[Relationship::new(PORTAL, GATEWAY, "uses")],
            CanvasConfig::default(),
        )
    }

    #[test]
    fn test_place_connects_and_delete_disconnects() {
        let mut session = session();
        let portal = session.place(PORTAL, "Portal", Point::new(0.0, 0.0)).unwrap();
        let gateway = session.place(GATEWAY, "Gateway", Point::new(400.0, 0.0)).unwrap();
        let second = session.place(GATEWAY, "Gateway 2", Point::new(400.0, 300.0)).unwrap();

        assert_eq!(session.model().connections().count(), 2);
        assert!(session.model().has_connection(portal, gateway, "uses"));
        assert!(session.model().has_connection(portal, second, "uses"));

        session.delete(gateway).unwrap();
        let remaining: Vec<_> = session
            .model()
            .connections()
            .map(|c| (c.source_instance_id, c.target_instance_id))
            .collect();
        assert_eq!(remaining, vec![(portal, second)]);
    }

    #[test]
    fn test_move_keeps_connections_and_restacks_properties() {
        let mut session = session();
        let portal = session.place(PORTAL, "Portal", Point::new(0.0, 0.0)).unwrap();
        let gateway = session.place(GATEWAY, "Gateway", Point::new(400.0, 0.0)).unwrap();
        let tag = session.attach_property(portal, 9, "Slow").unwrap();
        let connection = session.model().connections_of(portal)[0].id;

        session.move_to(portal, Point::new(0.0, 200.0)).unwrap();

        assert_eq!(session.model().connections_of(gateway).len(), 1);
        assert_approx_eq!(f32, session.model().property(tag).unwrap().y, 305.0);
        let (from, to) = session.endpoints(connection).unwrap();
        assert_approx_eq!(f32, from.x(), 200.0);
        assert_approx_eq!(f32, from.y(), 200.0);
        assert_approx_eq!(f32, to.x(), 400.0);
        assert_approx_eq!(f32, to.y(), 100.0);
    }

    #[test]
    fn test_copy_instance() {
        let mut session = session();
        let portal = session.place(PORTAL, "Portal", Point::new(10.0, 10.0)).unwrap();
        session.place(GATEWAY, "Gateway", Point::new(400.0, 0.0)).unwrap();
        session.attach_property(portal, 9, "Slow").unwrap();

        let copy = session.copy_instance(portal).unwrap();

        let instance = session.model().element(copy).unwrap();
        assert_eq!(instance.instance_name, "Portal (copy)");
        assert_approx_eq!(f32, instance.x, 30.0);
        assert_approx_eq!(f32, instance.y, 30.0);
        assert_eq!(session.model().properties_of(copy).len(), 1);
        assert_eq!(session.model().connections_of(copy).len(), 1);
    }

    #[test]
    fn test_manual_connection_survives_rule_change() {
        let mut session = session();
        let portal = session.place(PORTAL, "Portal", Point::new(0.0, 0.0)).unwrap();
        let gateway = session.place(GATEWAY, "Gateway", Point::new(400.0, 0.0)).unwrap();
        session.connect(gateway, portal, "notifies").unwrap();

        let report = session.set_rules(&[]).unwrap();

        assert_eq!(report, SyncReport { added: 0, removed: 1 });
        assert!(session.model().has_connection(gateway, portal, "notifies"));
        assert!(!session.model().has_connection(portal, gateway, "uses"));
    }

    #[test]
    fn test_detach_restacks_siblings() {
        let mut session = session();
        let portal = session.place(PORTAL, "Portal", Point::new(0.0, 0.0)).unwrap();
        let first = session.attach_property(portal, 1, "First").unwrap();
        let second = session.attach_property(portal, 2, "Second").unwrap();

        session.detach_property(first).unwrap();

        assert_approx_eq!(f32, session.model().property(second).unwrap().y, 105.0);
    }

    #[test]
    fn test_rejected_resize_keeps_layout() {
        let mut session = session();
        let portal = session.place(PORTAL, "Portal", Point::new(0.0, 0.0)).unwrap();
        session.attach_property(portal, 1, "Tag").unwrap();
        let before = session.model().clone();

        assert!(session.resize(portal, Size::new(-5.0, 10.0)).is_err());
        assert_eq!(session.model(), &before);
    }
}
