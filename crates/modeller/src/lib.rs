//! Modeller - diagram composition and canvas synchronization for
//! enterprise-architecture catalogues.
//!
//! Catalogue elements, relationships and properties are compiled into EDGY
//! PlantUML markup and encoded into tokens for a PlantUML rendering server.
//! The interactive canvas keeps placed instances, their property tags and
//! their rule-derived connections consistent with the catalogue.

pub mod cache;
pub mod canvas;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod encoder;
pub mod lock;
pub mod markup;
pub mod rules;
pub mod store;

mod error;

pub use modeller_core::{catalogue, geometry, identifier, text};

pub use error::ModellerError;

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use log::{debug, info};

use modeller_core::{
    catalogue::{ElementId, Relationship},
    geometry::Size,
};

use cache::ElementDiagramCache;
use canvas::{CanvasId, CanvasModel, CanvasSession};
use compiler::{CompileReport, CompositeCompiler, DiagramLayout};
use config::AppConfig;
use encoder::{ElementEncoder, ElementEntry};
use lock::KeyedLocks;
use store::{CatalogStore, Diagram, DiagramId, ElementDiagram};

/// Size of a canvas created on first use.
const DEFAULT_CANVAS_SIZE: Size = Size::new(1600.0, 1200.0);

/// What to compile into a persisted diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagramRequest {
    pub id: DiagramId,
    pub title: String,
    pub element_ids: BTreeSet<ElementId>,
    pub layout: DiagramLayout,
    pub enterprise_filter: Option<String>,
}

impl DiagramRequest {
    pub fn new(
        id: DiagramId,
        title: impl Into<String>,
        element_ids: impl IntoIterator<Item = ElementId>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            element_ids: element_ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Set the layout (builder style).
    pub fn with_layout(mut self, layout: DiagramLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Restrict the diagram to one enterprise (builder style).
    pub fn with_enterprise_filter(mut self, enterprise: impl Into<String>) -> Self {
        self.enterprise_filter = Some(enterprise.into());
        self
    }
}

/// A persisted diagram together with what its compile skipped or flagged.
#[derive(Debug, Clone)]
pub struct DiagramOutcome {
    pub diagram: Diagram,
    pub report: CompileReport,
}

/// Entry point for compiling diagrams and editing canvases over a store.
///
/// Operations on one diagram id, or one canvas id, run one at a time.
/// Operations on different ids may run in parallel.
///
/// # Examples
///
/// ```
/// use modeller::{
///     DiagramRequest, DiagramService,
///     catalogue::{Element, ElementType, Relationship},
///     config::AppConfig,
///     store::{Catalogue, MemoryStore},
/// };
///
/// let store = MemoryStore::from_catalogue(Catalogue {
///     elements: vec![
///         Element::new(1, "CustomerPortal", ElementType::Capability),
///         Element::new(2, "PaymentGateway", ElementType::Capability),
///     ],
///     relationships: vec![Relationship::new(1, 2, "uses")],
///     properties: vec![],
/// });
/// let service = DiagramService::new(AppConfig::default(), store);
///
/// let outcome = service
///     .compile_diagram(DiagramRequest::new(1, "Payments", [1, 2]))
///     .expect("compiles");
/// assert!(outcome
///     .diagram
///     .markup_source
///     .contains("$link(CustomerPortal, PaymentGateway, \"Uses\")"));
/// ```
#[derive(Debug)]
pub struct DiagramService<S> {
    config: AppConfig,
    store: S,
    cache: ElementDiagramCache,
    diagram_locks: KeyedLocks<DiagramId>,
    canvas_locks: KeyedLocks<CanvasId>,
}

impl<S: CatalogStore> DiagramService<S> {
    pub fn new(config: AppConfig, store: S) -> Self {
        Self {
            config,
            store,
            cache: ElementDiagramCache::new(),
            diagram_locks: KeyedLocks::new(),
            canvas_locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &ElementDiagramCache {
        &self.cache
    }

    fn compiler(&self) -> CompositeCompiler<'_> {
        let markup = self.config.markup();
        CompositeCompiler::new(
            ElementEncoder::new(markup.note_width()),
            markup.encode_options(),
            &self.cache,
        )
        .with_strict_identifiers(markup.strict_identifiers())
    }

    fn entry(&self, element_id: ElementId) -> Result<Option<ElementEntry>, ModellerError> {
        let Some(element) = self.store.element(element_id)? else {
            return Ok(None);
        };
        let properties = self.store.properties_of(element_id)?;
        Ok(Some(ElementEntry::new(element, properties)))
    }

    fn persist_element_diagram(&self, diagram: &cache::CachedElementDiagram) -> Result<(), ModellerError> {
        self.store.upsert_element_diagram(ElementDiagram {
            element_id: diagram.element_id(),
            markup_source: diagram.markup().to_string(),
            encoded_token: diagram.token().to_string(),
        })?;
        Ok(())
    }

    /// Generate (or reuse) the single-element diagram of one element and
    /// persist it.
    ///
    /// # Errors
    ///
    /// Returns [`ModellerError::NotFound`] if the element does not exist.
    pub fn element_diagram(&self, element_id: ElementId) -> Result<ElementDiagram, ModellerError> {
        let entry = self
            .entry(element_id)?
            .ok_or_else(|| ModellerError::not_found("element", element_id))?;
        let (diagram, regenerated) = self.stored_element_diagram(&entry)?;
        debug!(element_id, regenerated; "Element diagram ready");

        Ok(ElementDiagram {
            element_id,
            markup_source: diagram.markup().to_string(),
            encoded_token: diagram.token().to_string(),
        })
    }

    /// Generate (or reuse) an element diagram and upsert it into the store.
    ///
    /// The upsert also runs on cache hits.
    fn stored_element_diagram(
        &self,
        entry: &ElementEntry,
    ) -> Result<(Arc<cache::CachedElementDiagram>, bool), ModellerError> {
        let (diagram, regenerated) = self.compiler().element_diagram(entry)?;
        self.persist_element_diagram(&diagram)?;
        Ok((diagram, regenerated))
    }

    /// Drop the cached single-element diagram of an element, e.g. after it
    /// was deleted from the catalogue.
    pub fn invalidate_element(&self, element_id: ElementId) -> bool {
        self.cache.invalidate(element_id)
    }

    /// Compile and persist a diagram, replacing its membership with exactly
    /// the requested element ids.
    pub fn compile_diagram(&self, request: DiagramRequest) -> Result<DiagramOutcome, ModellerError> {
        let diagram_id = request.id;
        self.diagram_locks
            .with(&diagram_id, || self.compile_locked(request))
    }

    /// Add elements to a persisted diagram and regenerate it.
    pub fn add_elements(
        &self,
        diagram_id: DiagramId,
        element_ids: impl IntoIterator<Item = ElementId>,
    ) -> Result<DiagramOutcome, ModellerError> {
        self.diagram_locks.with(&diagram_id, || {
            let mut request = self.stored_request(diagram_id)?;
            request.element_ids.extend(element_ids);
            self.compile_locked(request)
        })
    }

    /// Remove elements from a persisted diagram and regenerate it.
    pub fn remove_elements(
        &self,
        diagram_id: DiagramId,
        element_ids: impl IntoIterator<Item = ElementId>,
    ) -> Result<DiagramOutcome, ModellerError> {
        self.diagram_locks.with(&diagram_id, || {
            let mut request = self.stored_request(diagram_id)?;
            for element_id in element_ids {
                request.element_ids.remove(&element_id);
            }
            self.compile_locked(request)
        })
    }

    /// Recompile a persisted diagram from its current membership.
    pub fn regenerate(&self, diagram_id: DiagramId) -> Result<DiagramOutcome, ModellerError> {
        self.diagram_locks.with(&diagram_id, || {
            let request = self.stored_request(diagram_id)?;
            self.compile_locked(request)
        })
    }

    pub fn diagram(&self, diagram_id: DiagramId) -> Result<Diagram, ModellerError> {
        self.store
            .diagram(diagram_id)?
            .ok_or_else(|| ModellerError::not_found("diagram", diagram_id))
    }

    /// URL at which the rendering service draws a diagram.
    pub fn render_url(&self, diagram: &Diagram) -> String {
        self.config.renderer().render_url(&diagram.encoded_token)
    }

    fn stored_request(&self, diagram_id: DiagramId) -> Result<DiagramRequest, ModellerError> {
        let diagram = self.diagram(diagram_id)?;
        let element_ids = self.store.diagram_members(diagram_id)?;
        Ok(DiagramRequest {
            id: diagram.id,
            title: diagram.title,
            element_ids,
            layout: diagram.layout,
            enterprise_filter: diagram.enterprise_filter,
        })
    }

    /// Must be called with the diagram lock held.
    fn compile_locked(&self, request: DiagramRequest) -> Result<DiagramOutcome, ModellerError> {
        let mut entries = BTreeMap::new();
        let mut included = BTreeSet::new();
        let mut filtered = Vec::new();

        for &element_id in &request.element_ids {
            let entry = self.entry(element_id)?;
            let excluded = match (&entry, request.enterprise_filter.as_deref()) {
                (Some(entry), Some(enterprise)) => !entry.element.in_enterprise(enterprise),
                _ => false,
            };
            if excluded {
                filtered.push(element_id);
                continue;
            }
            included.insert(element_id);
            if let Some(entry) = entry {
                entries.insert(element_id, entry);
            }
        }

        // Member element diagrams reach the store even if the composite is
        // rejected below.
        let mut regenerated = 0;
        for entry in entries.values() {
            if self.stored_element_diagram(entry)?.1 {
                regenerated += 1;
            }
        }

        let relationships: Vec<Relationship> = self.store.relationships_among(&included)?;
        let compiled = self
            .compiler()
            .compile(&included, &entries, &request.layout, &relationships)?;

        let encoded_token = codec::encode(&compiled.markup)?;
        let diagram = Diagram {
            id: request.id,
            title: request.title,
            markup_source: compiled.markup,
            encoded_token,
            element_ids: request.element_ids,
            layout: request.layout,
            enterprise_filter: request.enterprise_filter,
            elements_count: compiled.document.declaration_count(),
            relationships_count: compiled.document.link_count(),
        };

        self.store.upsert_diagram(diagram.clone())?;
        self.store
            .replace_diagram_members(diagram.id, &diagram.element_ids)?;

        let mut report = compiled.report;
        report.filtered_elements = filtered;

        info!(
            diagram_id = diagram.id,
            elements = diagram.elements_count,
            relationships = diagram.relationships_count,
            regenerated;
            "Diagram compiled"
        );
        Ok(DiagramOutcome { diagram, report })
    }

    /// Run `edit` against a canvas and persist the result.
    ///
    /// The canvas is created empty if the store has none with this id. The
    /// canvas is saved only when `edit` succeeds, so a failed edit leaves
    /// the persisted canvas untouched.
    pub fn with_canvas<T>(
        &self,
        canvas_id: CanvasId,
        edit: impl FnOnce(&mut CanvasSession) -> Result<T, ModellerError>,
    ) -> Result<T, ModellerError> {
        self.canvas_locks.with(&canvas_id, || {
            let model = self
                .store
                .canvas(canvas_id)?
                .unwrap_or_else(|| CanvasModel::new(canvas_id, DEFAULT_CANVAS_SIZE));
            let relationships = self.store.relationships()?;
            let mut session =
                CanvasSession::new(model, &relationships, self.config.canvas().clone());

            let result = edit(&mut session)?;

            self.store.save_canvas(session.model())?;
            info!(
                canvas_id,
                elements = session.model().elements().count(),
                connections = session.model().connections().count();
                "Canvas saved"
            );
            Ok(result)
        })
    }

    /// Propose the standard relationships the catalogue does not declare.
    pub fn derive_relationships(&self) -> Result<Vec<Relationship>, ModellerError> {
        let elements = self.store.elements()?;
        let existing = self.store.relationships()?;
        Ok(rules::derive_relationships(&elements, &existing))
    }
}
