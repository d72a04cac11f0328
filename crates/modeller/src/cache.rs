//! Explicit keyed cache of single-element diagrams.
//!
//! Each entry remembers the inputs it was generated from. A lookup only hits
//! when the element, its properties and the options are unchanged, so a
//! stale block is never embedded. Regenerating replaces the prior entry.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use log::debug;

use modeller_core::catalogue::ElementId;

use crate::{
    encoder::{ElementEntry, EncodeOptions},
    markup::MarkupBlock,
};

/// A generated single-element diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedElementDiagram {
    entry: ElementEntry,
    options: EncodeOptions,
    block: MarkupBlock,
    markup: String,
    token: String,
}

impl CachedElementDiagram {
    pub fn new(
        entry: ElementEntry,
        options: EncodeOptions,
        block: MarkupBlock,
        markup: String,
        token: String,
    ) -> Self {
        Self {
            entry,
            options,
            block,
            markup,
            token,
        }
    }

    pub fn element_id(&self) -> ElementId {
        self.entry.element.id
    }

    /// Borrow the markup block (fragment form).
    pub fn block(&self) -> &MarkupBlock {
        &self.block
    }

    /// The standalone markup document.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// The encoded token of [`Self::markup`].
    pub fn token(&self) -> &str {
        &self.token
    }

    fn generated_from(&self, entry: &ElementEntry, options: EncodeOptions) -> bool {
        self.options == options && &self.entry == entry
    }
}

/// Element id to generated diagram, shared across requests.
#[derive(Debug, Default)]
pub struct ElementDiagramCache {
    entries: Mutex<HashMap<ElementId, Arc<CachedElementDiagram>>>,
}

impl ElementDiagramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached diagram for `entry` if it is still current.
    pub fn fresh(
        &self,
        entry: &ElementEntry,
        options: EncodeOptions,
    ) -> Option<Arc<CachedElementDiagram>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let cached = entries.get(&entry.element.id)?;
        if cached.generated_from(entry, options) {
            debug!(element_id = entry.element.id; "Element diagram cache hit");
            Some(Arc::clone(cached))
        } else {
            None
        }
    }

    /// Insert or replace the entry for the diagram's element.
    pub fn upsert(&self, diagram: CachedElementDiagram) -> Arc<CachedElementDiagram> {
        let diagram = Arc::new(diagram);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(diagram.element_id(), Arc::clone(&diagram));
        diagram
    }

    /// Drop the entry for an element. Returns `true` if one existed.
    pub fn invalidate(&self, element_id: ElementId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&element_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use modeller_core::catalogue::{Element, ElementType};

    use super::*;

    fn cached(entry: &ElementEntry, markup: &str) -> CachedElementDiagram {
        CachedElementDiagram::new(
            entry.clone(),
            EncodeOptions::default(),
            MarkupBlock::default(),
            markup.to_string(),
            "token".to_string(),
        )
    }

    #[test]
    fn test_hit_requires_same_inputs() {
        let cache = ElementDiagramCache::new();
        let entry = ElementEntry::new(Element::new(1, "A", ElementType::Task), vec![]);
        cache.upsert(cached(&entry, "v1"));

        assert!(cache.fresh(&entry, EncodeOptions::default()).is_some());

        let renamed = ElementEntry::new(Element::new(1, "B", ElementType::Task), vec![]);
        assert!(cache.fresh(&renamed, EncodeOptions::default()).is_none());

        let options = EncodeOptions {
            include_notes: false,
            include_properties: true,
        };
        assert!(cache.fresh(&entry, options).is_none());
    }

    #[test]
    fn test_upsert_replaces() {
        let cache = ElementDiagramCache::new();
        let entry = ElementEntry::new(Element::new(1, "A", ElementType::Task), vec![]);
        cache.upsert(cached(&entry, "v1"));
        cache.upsert(cached(&entry, "v2"));

        assert_eq!(cache.len(), 1);
        let hit = cache.fresh(&entry, EncodeOptions::default()).unwrap();
        assert_eq!(hit.markup(), "v2");
    }

    #[test]
    fn test_invalidate() {
        let cache = ElementDiagramCache::new();
        let entry = ElementEntry::new(Element::new(1, "A", ElementType::Task), vec![]);
        cache.upsert(cached(&entry, "v1"));

        assert!(cache.invalidate(1));
        assert!(!cache.invalidate(1));
        assert!(cache.is_empty());
    }
}
