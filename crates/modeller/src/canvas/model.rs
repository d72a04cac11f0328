//! Canvas state: element instances, property instances and connections.
//!
//! Every mutation validates its input first and leaves the model untouched
//! when it fails. Instances keep their creation order, which is the order
//! property instances stack in under their parent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use modeller_core::{
    catalogue::{ElementId, PropertyId},
    geometry::{Bounds, Point, Size},
};

use crate::error::ModellerError;

pub type CanvasId = u64;
pub type InstanceId = u64;

/// A placed copy of a catalogue element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInstance {
    pub id: InstanceId,
    pub element_type_id: ElementId,
    pub instance_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub z_index: i32,
}

impl ElementInstance {
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.origin(), self.size())
    }
}

/// A placed copy of a property template, owned by one element instance.
///
/// Its position is recomputed from the parent; see [`super::layout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInstance {
    pub id: InstanceId,
    pub property_template_id: PropertyId,
    pub parent_instance_id: InstanceId,
    pub instance_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PropertyInstance {
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }
}

/// Where a connection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Derived from relationship rules; created and pruned automatically.
    Auto,
    /// Drawn by the user; only removed explicitly or with an endpoint.
    Manual,
}

/// A visual line between two element instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: InstanceId,
    pub source_instance_id: InstanceId,
    pub target_instance_id: InstanceId,
    pub relationship_type: String,
    pub provenance: Provenance,
}

impl Connection {
    pub fn key(&self) -> (InstanceId, InstanceId, &str) {
        (
            self.source_instance_id,
            self.target_instance_id,
            &self.relationship_type,
        )
    }

    /// Returns `true` if either endpoint is `instance_id`.
    pub fn touches(&self, instance_id: InstanceId) -> bool {
        self.source_instance_id == instance_id || self.target_instance_id == instance_id
    }
}

/// The full state of one canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasModel {
    id: CanvasId,
    elements: IndexMap<InstanceId, ElementInstance>,
    properties: IndexMap<InstanceId, PropertyInstance>,
    connections: IndexMap<InstanceId, Connection>,
    dimensions: Size,
    zoom: f32,
    pan: Point,
    next_id: InstanceId,
}

fn validate_name(name: &str) -> Result<(), ModellerError> {
    if name.trim().is_empty() {
        return Err(ModellerError::validation("instance name must not be empty"));
    }
    Ok(())
}

fn validate_size(size: Size) -> Result<(), ModellerError> {
    if !size.is_positive() {
        return Err(ModellerError::validation(format!(
            "dimensions must be positive, got {}x{}",
            size.width(),
            size.height()
        )));
    }
    Ok(())
}

fn validate_point(point: Point) -> Result<(), ModellerError> {
    if !point.x().is_finite() || !point.y().is_finite() {
        return Err(ModellerError::validation("coordinates must be finite"));
    }
    Ok(())
}

impl CanvasModel {
    /// Create an empty canvas at zoom 1 with no pan.
    pub fn new(id: CanvasId, dimensions: Size) -> Self {
        Self {
            id,
            elements: IndexMap::new(),
            properties: IndexMap::new(),
            connections: IndexMap::new(),
            dimensions,
            zoom: 1.0,
            pan: Point::default(),
            next_id: 1,
        }
    }

    pub fn id(&self) -> CanvasId {
        self.id
    }

    pub fn dimensions(&self) -> Size {
        self.dimensions
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    fn allocate_id(&mut self) -> InstanceId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Element instances in creation order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementInstance> {
        self.elements.values()
    }

    pub fn element(&self, id: InstanceId) -> Option<&ElementInstance> {
        self.elements.get(&id)
    }

    fn element_mut(&mut self, id: InstanceId) -> Result<&mut ElementInstance, ModellerError> {
        self.elements
            .get_mut(&id)
            .ok_or_else(|| ModellerError::not_found("element instance", id))
    }

    /// Instances of one catalogue element, in creation order.
    pub fn instances_of(&self, element_type_id: ElementId) -> impl Iterator<Item = &ElementInstance> {
        self.elements
            .values()
            .filter(move |e| e.element_type_id == element_type_id)
    }

    /// Place a new element instance on top of every existing one.
    ///
    /// # Errors
    ///
    /// Returns [`ModellerError::Validation`] for an empty name, a
    /// non-positive size or non-finite coordinates.
    pub fn place_element(
        &mut self,
        element_type_id: ElementId,
        instance_name: &str,
        origin: Point,
        size: Size,
    ) -> Result<InstanceId, ModellerError> {
        validate_name(instance_name)?;
        validate_size(size)?;
        validate_point(origin)?;

        let z_index = self
            .elements
            .values()
            .map(|e| e.z_index)
            .max()
            .map_or(0, |z| z + 1);
        let id = self.allocate_id();
        self.elements.insert(
            id,
            ElementInstance {
                id,
                element_type_id,
                instance_name: instance_name.trim().to_string(),
                x: origin.x(),
                y: origin.y(),
                width: size.width(),
                height: size.height(),
                z_index,
            },
        );
        Ok(id)
    }

    pub fn move_element(&mut self, id: InstanceId, origin: Point) -> Result<(), ModellerError> {
        validate_point(origin)?;
        let element = self.element_mut(id)?;
        element.x = origin.x();
        element.y = origin.y();
        Ok(())
    }

    pub fn resize_element(&mut self, id: InstanceId, size: Size) -> Result<(), ModellerError> {
        validate_size(size)?;
        let element = self.element_mut(id)?;
        element.width = size.width();
        element.height = size.height();
        Ok(())
    }

    pub fn rename_element(&mut self, id: InstanceId, name: &str) -> Result<(), ModellerError> {
        validate_name(name)?;
        self.element_mut(id)?.instance_name = name.trim().to_string();
        Ok(())
    }

    /// Remove an element instance with its property instances and every
    /// connection that references it.
    pub fn remove_element(&mut self, id: InstanceId) -> Result<ElementInstance, ModellerError> {
        let removed = self
            .elements
            .shift_remove(&id)
            .ok_or_else(|| ModellerError::not_found("element instance", id))?;
        self.properties.retain(|_, p| p.parent_instance_id != id);
        self.connections.retain(|_, c| !c.touches(id));
        Ok(removed)
    }

    /// Property instances in creation order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyInstance> {
        self.properties.values()
    }

    pub fn property(&self, id: InstanceId) -> Option<&PropertyInstance> {
        self.properties.get(&id)
    }

    /// Property instances attached to `parent`, in creation order.
    pub fn properties_of(&self, parent: InstanceId) -> Vec<&PropertyInstance> {
        self.properties
            .values()
            .filter(|p| p.parent_instance_id == parent)
            .collect()
    }

    /// Attach a property instance to `parent`.
    ///
    /// The new instance has zero width and sits at the parent origin until
    /// the layout propagator positions it.
    pub fn attach_property(
        &mut self,
        parent: InstanceId,
        property_template_id: PropertyId,
        instance_name: &str,
        height: f32,
    ) -> Result<InstanceId, ModellerError> {
        validate_name(instance_name)?;
        if !height.is_finite() || height <= 0.0 {
            return Err(ModellerError::validation(format!(
                "property height must be positive, got {height}"
            )));
        }
        let origin = self
            .element(parent)
            .ok_or_else(|| ModellerError::not_found("element instance", parent))?
            .origin();

        let id = self.allocate_id();
        self.properties.insert(
            id,
            PropertyInstance {
                id,
                property_template_id,
                parent_instance_id: parent,
                instance_name: instance_name.trim().to_string(),
                x: origin.x(),
                y: origin.y(),
                width: 0.0,
                height,
            },
        );
        Ok(id)
    }

    pub fn detach_property(&mut self, id: InstanceId) -> Result<PropertyInstance, ModellerError> {
        self.properties
            .shift_remove(&id)
            .ok_or_else(|| ModellerError::not_found("property instance", id))
    }

    pub(crate) fn set_property_bounds(&mut self, id: InstanceId, bounds: Bounds) {
        if let Some(property) = self.properties.get_mut(&id) {
            property.x = bounds.min_x();
            property.y = bounds.min_y();
            property.width = bounds.width();
            property.height = bounds.height();
        }
    }

    /// Connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn connection(&self, id: InstanceId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Connections with `instance_id` as source or target.
    pub fn connections_of(&self, instance_id: InstanceId) -> Vec<&Connection> {
        self.connections
            .values()
            .filter(|c| c.touches(instance_id))
            .collect()
    }

    pub fn has_connection(&self, source: InstanceId, target: InstanceId, relationship_type: &str) -> bool {
        self.connections
            .values()
            .any(|c| c.key() == (source, target, relationship_type))
    }

    /// Add a connection unless the same triple already exists.
    ///
    /// Returns the new connection id, or `None` if the triple was present.
    ///
    /// # Errors
    ///
    /// Returns [`ModellerError::NotFound`] if an endpoint is missing and
    /// [`ModellerError::Validation`] for an empty relationship type or a
    /// connection from an instance to itself.
    pub fn add_connection(
        &mut self,
        source: InstanceId,
        target: InstanceId,
        relationship_type: &str,
        provenance: Provenance,
    ) -> Result<Option<InstanceId>, ModellerError> {
        if relationship_type.trim().is_empty() {
            return Err(ModellerError::validation("relationship type must not be empty"));
        }
        if source == target {
            return Err(ModellerError::validation(format!(
                "instance {source} cannot connect to itself"
            )));
        }
        for endpoint in [source, target] {
            if !self.elements.contains_key(&endpoint) {
                return Err(ModellerError::not_found("element instance", endpoint));
            }
        }
        if self.has_connection(source, target, relationship_type) {
            return Ok(None);
        }

        let id = self.allocate_id();
        self.connections.insert(
            id,
            Connection {
                id,
                source_instance_id: source,
                target_instance_id: target,
                relationship_type: relationship_type.to_string(),
                provenance,
            },
        );
        Ok(Some(id))
    }

    pub fn remove_connection(&mut self, id: InstanceId) -> Result<Connection, ModellerError> {
        self.connections
            .shift_remove(&id)
            .ok_or_else(|| ModellerError::not_found("connection", id))
    }

    pub(crate) fn retain_connections(&mut self, mut keep: impl FnMut(&Connection) -> bool) -> usize {
        let before = self.connections.len();
        self.connections.retain(|_, c| keep(c));
        before - self.connections.len()
    }

    /// Set the zoom factor.
    pub fn set_zoom(&mut self, zoom: f32) -> Result<(), ModellerError> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(ModellerError::validation(format!(
                "zoom must be positive, got {zoom}"
            )));
        }
        self.zoom = zoom;
        Ok(())
    }

    pub fn set_pan(&mut self, pan: Point) -> Result<(), ModellerError> {
        validate_point(pan)?;
        self.pan = pan;
        Ok(())
    }
}
