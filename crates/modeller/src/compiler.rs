//! Composite diagrams: many element blocks plus the links between them.
//!
//! Compilation is deterministic. Elements are emitted in ascending id
//! order and links in ascending `(source, target, type)` order, so the same
//! selection and relationship set always produce byte-identical markup
//! regardless of the order the caller supplied them in.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use modeller_core::{
    catalogue::{ElementId, Relationship},
    identifier::Identifier,
    text,
};

use crate::{
    cache::{CachedElementDiagram, ElementDiagramCache},
    codec,
    encoder::{ElementEncoder, ElementEntry, EncodeOptions},
    error::ModellerError,
    markup::{Direction, MarkupDocument, Statement},
};

/// Presentation settings persisted with a diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramLayout {
    #[serde(default)]
    pub direction: Direction,
}

impl DiagramLayout {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }
}

/// Two or more elements of one composite that derive the same identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCollision {
    pub identifier: Identifier,
    pub element_ids: Vec<ElementId>,
}

/// What a compile skipped or flagged while still producing a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Requested elements with no catalogue entry.
    pub missing_elements: Vec<ElementId>,
    /// Requested elements excluded by the diagram's enterprise filter.
    pub filtered_elements: Vec<ElementId>,
    /// Relationships whose source or target is not in the diagram.
    pub skipped_relationships: usize,
    pub collisions: Vec<IdentifierCollision>,
}

impl CompileReport {
    /// Returns `true` if nothing was skipped or flagged.
    pub fn is_clean(&self) -> bool {
        self.missing_elements.is_empty()
            && self.filtered_elements.is_empty()
            && self.collisions.is_empty()
    }
}

/// The result of compiling a composite diagram.
#[derive(Debug, Clone)]
pub struct CompiledDiagram {
    pub document: MarkupDocument,
    pub markup: String,
    /// The identifier each rendered element is referenced by.
    pub identifiers: BTreeMap<ElementId, Identifier>,
    /// Element diagrams that had to be regenerated during this compile.
    pub regenerated: Vec<Arc<CachedElementDiagram>>,
    pub report: CompileReport,
}

/// Assembles element blocks and link statements into one document.
pub struct CompositeCompiler<'a> {
    encoder: ElementEncoder,
    options: EncodeOptions,
    strict_identifiers: bool,
    cache: &'a ElementDiagramCache,
}

impl<'a> CompositeCompiler<'a> {
    pub fn new(
        encoder: ElementEncoder,
        options: EncodeOptions,
        cache: &'a ElementDiagramCache,
    ) -> Self {
        Self {
            encoder,
            options,
            strict_identifiers: false,
            cache,
        }
    }

    /// Reject composites with identifier collisions (builder style).
    pub fn with_strict_identifiers(mut self, strict: bool) -> Self {
        self.strict_identifiers = strict;
        self
    }

    /// Returns the element's single-element diagram, regenerating and
    /// caching it if the cached copy is missing or stale.
    ///
    /// The boolean is `true` when the diagram was regenerated.
    ///
    /// # Errors
    ///
    /// Returns [`ModellerError::Codec`] if the token cannot be produced.
    pub fn element_diagram(
        &self,
        entry: &ElementEntry,
    ) -> Result<(Arc<CachedElementDiagram>, bool), ModellerError> {
        if let Some(cached) = self.cache.fresh(entry, self.options) {
            return Ok((cached, false));
        }

        let block = self.encoder.block(entry, self.options);
        let markup = block.standalone(Direction::TopToBottom);
        let token = codec::encode(&markup)?;
        debug!(element_id = entry.element.id; "Regenerated element diagram");

        let diagram = CachedElementDiagram::new(entry.clone(), self.options, block, markup, token);
        Ok((self.cache.upsert(diagram), true))
    }

    /// Compile the elements in `element_ids` and the relationships between
    /// them into one document.
    ///
    /// Ids without an entry in `entries` are skipped and listed in the
    /// report. Relationships with an endpoint outside the rendered set are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ModellerError::IdentifierCollision`] in strict mode when two
    /// rendered elements share an identifier, and [`ModellerError::Codec`]
    /// if an element diagram cannot be encoded.
    pub fn compile(
        &self,
        element_ids: &BTreeSet<ElementId>,
        entries: &BTreeMap<ElementId, ElementEntry>,
        layout: &DiagramLayout,
        relationships: &[Relationship],
    ) -> Result<CompiledDiagram, ModellerError> {
        let mut document = MarkupDocument::new(layout.direction);
        let mut identifiers = BTreeMap::new();
        let mut owners: BTreeMap<Identifier, Vec<ElementId>> = BTreeMap::new();
        let mut regenerated = Vec::new();
        let mut report = CompileReport::default();

        for &element_id in element_ids {
            let Some(entry) = entries.get(&element_id) else {
                warn!(element_id = element_id; "Element not found, skipping");
                report.missing_elements.push(element_id);
                continue;
            };

            let (diagram, was_regenerated) = self.element_diagram(entry)?;
            if was_regenerated {
                regenerated.push(Arc::clone(&diagram));
            }

            let block = diagram.block();
            if let Some(identifier) = block.declared_identifier() {
                owners
                    .entry(identifier.clone())
                    .or_default()
                    .push(element_id);
                identifiers.insert(element_id, identifier.clone());
            }
            document.extend(block.statements().iter().cloned());
        }

        report.collisions = owners
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(identifier, element_ids)| IdentifierCollision {
                identifier,
                element_ids,
            })
            .collect();

        for collision in &report.collisions {
            warn!(
                identifier:% = collision.identifier,
                element_ids:? = collision.element_ids;
                "Identifier shared by several elements"
            );
        }
        if let Some(collision) = report.collisions.first().filter(|_| self.strict_identifiers) {
            return Err(ModellerError::IdentifierCollision {
                identifier: collision.identifier.clone(),
                element_ids: collision.element_ids.clone(),
            });
        }

        let mut links = BTreeSet::new();
        for relationship in relationships {
            let (source, target) = (
                identifiers.get(&relationship.source_element_id),
                identifiers.get(&relationship.target_element_id),
            );
            match (source, target) {
                (Some(source), Some(target)) => {
                    links.insert((
                        relationship.key(),
                        source.clone(),
                        target.clone(),
                    ));
                }
                _ => {
                    debug!(
                        source_id = relationship.source_element_id,
                        target_id = relationship.target_element_id;
                        "Relationship endpoint outside diagram, skipping"
                    );
                    report.skipped_relationships += 1;
                }
            }
        }

        // Ordered by element ids, deduplicated on the rendered line.
        let mut rendered = BTreeSet::new();
        for ((_, _, relationship_type), source, target) in links {
            let label = text::relationship_label(relationship_type);
            if !rendered.insert((source.clone(), target.clone(), label.clone())) {
                continue;
            }
            document.push(Statement::Link {
                source,
                target,
                label,
            });
        }

        let markup = document.render();
        info!(
            elements = document.declaration_count(),
            links = document.link_count();
            "Composite diagram compiled"
        );
        trace!(markup = markup.as_str(); "Composite markup");

        Ok(CompiledDiagram {
            document,
            markup,
            identifiers,
            regenerated,
            report,
        })
    }
}
