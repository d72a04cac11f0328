//! The persistence boundary.
//!
//! The engine reads catalogue rows and writes derived diagram state through
//! [`CatalogStore`]. Each call is atomic per row; callers that need
//! multi-row atomicity hold the per-id lock from [`crate::lock`] around the
//! sequence. [`MemoryStore`] is the in-process implementation used by the
//! CLI and the tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use modeller_core::catalogue::{Element, ElementId, Property, PropertyId, Relationship};

use crate::{
    canvas::{CanvasId, CanvasModel},
    compiler::DiagramLayout,
};

pub type DiagramId = u64;

/// Failures reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("store state poisoned by a panicked writer")]
    Poisoned,
}

/// A persisted composite diagram.
///
/// `markup_source`, `encoded_token` and the counters are derived from
/// `element_ids`, the catalogue relationships and `layout`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: DiagramId,
    pub title: String,
    pub markup_source: String,
    pub encoded_token: String,
    pub element_ids: BTreeSet<ElementId>,
    #[serde(default)]
    pub layout: DiagramLayout,
    #[serde(default)]
    pub enterprise_filter: Option<String>,
    #[serde(default)]
    pub elements_count: usize,
    #[serde(default)]
    pub relationships_count: usize,
}

/// The persisted single-element diagram of one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDiagram {
    pub element_id: ElementId,
    pub markup_source: String,
    pub encoded_token: String,
}

/// Catalogue rows as exchanged in a JSON catalogue file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalogue {
    pub elements: Vec<Element>,
    pub relationships: Vec<Relationship>,
    pub properties: Vec<Property>,
}

/// Row-level access to catalogue and diagram state.
pub trait CatalogStore: Send + Sync {
    fn element(&self, id: ElementId) -> Result<Option<Element>, StoreError>;

    /// All elements, ordered by id.
    fn elements(&self) -> Result<Vec<Element>, StoreError>;

    fn relationships(&self) -> Result<Vec<Relationship>, StoreError>;

    /// Relationships whose source and target are both in `element_ids`.
    fn relationships_among(
        &self,
        element_ids: &BTreeSet<ElementId>,
    ) -> Result<Vec<Relationship>, StoreError> {
        Ok(self
            .relationships()?
            .into_iter()
            .filter(|r| {
                element_ids.contains(&r.source_element_id)
                    && element_ids.contains(&r.target_element_id)
            })
            .collect())
    }

    /// Properties owned by `element_id`, ordered by id.
    fn properties_of(&self, element_id: ElementId) -> Result<Vec<Property>, StoreError>;

    /// Insert or replace the element's single-element diagram.
    fn upsert_element_diagram(&self, diagram: ElementDiagram) -> Result<(), StoreError>;

    fn element_diagram(&self, element_id: ElementId)
    -> Result<Option<ElementDiagram>, StoreError>;

    fn diagram(&self, id: DiagramId) -> Result<Option<Diagram>, StoreError>;

    fn upsert_diagram(&self, diagram: Diagram) -> Result<(), StoreError>;

    /// The membership rows of a diagram.
    fn diagram_members(&self, id: DiagramId) -> Result<BTreeSet<ElementId>, StoreError>;

    /// Rewrite the membership rows of a diagram to exactly `element_ids`.
    fn replace_diagram_members(
        &self,
        id: DiagramId,
        element_ids: &BTreeSet<ElementId>,
    ) -> Result<(), StoreError>;

    fn canvas(&self, id: CanvasId) -> Result<Option<CanvasModel>, StoreError>;

    fn save_canvas(&self, canvas: &CanvasModel) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    elements: BTreeMap<ElementId, Element>,
    relationships: Vec<Relationship>,
    properties: BTreeMap<PropertyId, Property>,
    element_diagrams: BTreeMap<ElementId, ElementDiagram>,
    diagrams: BTreeMap<DiagramId, Diagram>,
    members: BTreeMap<DiagramId, BTreeSet<ElementId>>,
    canvases: BTreeMap<CanvasId, CanvasModel>,
}

/// A [`CatalogStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the rows of `catalogue`.
    pub fn from_catalogue(catalogue: Catalogue) -> Self {
        let state = MemoryState {
            elements: catalogue
                .elements
                .into_iter()
                .map(|e| (e.id, e))
                .collect(),
            relationships: catalogue.relationships,
            properties: catalogue
                .properties
                .into_iter()
                .map(|p| (p.id, p))
                .collect(),
            ..MemoryState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn insert_element(&self, element: Element) -> Result<(), StoreError> {
        self.lock()?.elements.insert(element.id, element);
        Ok(())
    }

    pub fn insert_relationship(&self, relationship: Relationship) -> Result<(), StoreError> {
        self.lock()?.relationships.push(relationship);
        Ok(())
    }

    pub fn insert_property(&self, property: Property) -> Result<(), StoreError> {
        self.lock()?.properties.insert(property.id, property);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl CatalogStore for MemoryStore {
    fn element(&self, id: ElementId) -> Result<Option<Element>, StoreError> {
        Ok(self.lock()?.elements.get(&id).cloned())
    }

    fn elements(&self) -> Result<Vec<Element>, StoreError> {
        Ok(self.lock()?.elements.values().cloned().collect())
    }

    fn relationships(&self) -> Result<Vec<Relationship>, StoreError> {
        Ok(self.lock()?.relationships.clone())
    }

    fn properties_of(&self, element_id: ElementId) -> Result<Vec<Property>, StoreError> {
        Ok(self
            .lock()?
            .properties
            .values()
            .filter(|p| p.element_id == element_id)
            .cloned()
            .collect())
    }

    fn upsert_element_diagram(&self, diagram: ElementDiagram) -> Result<(), StoreError> {
        self.lock()?
            .element_diagrams
            .insert(diagram.element_id, diagram);
        Ok(())
    }

    fn element_diagram(
        &self,
        element_id: ElementId,
    ) -> Result<Option<ElementDiagram>, StoreError> {
        Ok(self.lock()?.element_diagrams.get(&element_id).cloned())
    }

    fn diagram(&self, id: DiagramId) -> Result<Option<Diagram>, StoreError> {
        Ok(self.lock()?.diagrams.get(&id).cloned())
    }

    fn upsert_diagram(&self, diagram: Diagram) -> Result<(), StoreError> {
        self.lock()?.diagrams.insert(diagram.id, diagram);
        Ok(())
    }

    fn diagram_members(&self, id: DiagramId) -> Result<BTreeSet<ElementId>, StoreError> {
        Ok(self.lock()?.members.get(&id).cloned().unwrap_or_default())
    }

    fn replace_diagram_members(
        &self,
        id: DiagramId,
        element_ids: &BTreeSet<ElementId>,
    ) -> Result<(), StoreError> {
        self.lock()?.members.insert(id, element_ids.clone());
        Ok(())
    }

    fn canvas(&self, id: CanvasId) -> Result<Option<CanvasModel>, StoreError> {
        Ok(self.lock()?.canvases.get(&id).cloned())
    }

    fn save_canvas(&self, canvas: &CanvasModel) -> Result<(), StoreError> {
        self.lock()?.canvases.insert(canvas.id(), canvas.clone());
        Ok(())
    }
}
