//! Catalogue records: elements, relationships and properties.
//!
//! These are the rows the persistence boundary hands to the engine. They
//! carry no markup or canvas state of their own.

use std::{collections::BTreeMap, convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Catalogue element identifier.
pub type ElementId = u64;

/// Catalogue property identifier.
pub type PropertyId = u64;

/// The type of a catalogued element.
///
/// The catalogue stores element types as free text, so parsing never fails:
/// names outside the known set are kept verbatim in [`ElementType::Other`]
/// and rendered with the default markup macro.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Capability,
    Asset,
    Process,
    Purpose,
    Content,
    Story,
    Channel,
    Journey,
    Task,
    Product,
    Organisation,
    Brand,
    People,
    Outcome,
    Object,
    /// A type name the catalogue knows but the markup library does not.
    Other(String),
}

impl ElementType {
    /// Every known element type, in declaration order.
    pub const KNOWN: [ElementType; 15] = [
        ElementType::Capability,
        ElementType::Asset,
        ElementType::Process,
        ElementType::Purpose,
        ElementType::Content,
        ElementType::Story,
        ElementType::Channel,
        ElementType::Journey,
        ElementType::Task,
        ElementType::Product,
        ElementType::Organisation,
        ElementType::Brand,
        ElementType::People,
        ElementType::Outcome,
        ElementType::Object,
    ];

    /// Returns the canonical type name.
    pub fn name(&self) -> &str {
        match self {
            ElementType::Capability => "Capability",
            ElementType::Asset => "Asset",
            ElementType::Process => "Process",
            ElementType::Purpose => "Purpose",
            ElementType::Content => "Content",
            ElementType::Story => "Story",
            ElementType::Channel => "Channel",
            ElementType::Journey => "Journey",
            ElementType::Task => "Task",
            ElementType::Product => "Product",
            ElementType::Organisation => "Organisation",
            ElementType::Brand => "Brand",
            ElementType::People => "People",
            ElementType::Outcome => "Outcome",
            ElementType::Object => "Object",
            ElementType::Other(name) => name,
        }
    }

    /// Returns the fixed markup variable for singleton types.
    ///
    /// The markup macros for Product, Organisation and Brand bind one
    /// variable per type, named after the type in lower case.
    pub fn singleton_variable(&self) -> Option<&'static str> {
        match self {
            ElementType::Product => Some("product"),
            ElementType::Organisation => Some("organisation"),
            ElementType::Brand => Some("brand"),
            _ => None,
        }
    }
}

impl FromStr for ElementType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let known = ElementType::KNOWN
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(trimmed))
            .cloned();
        Ok(known.unwrap_or_else(|| ElementType::Other(trimmed.to_string())))
    }
}

impl From<String> for ElementType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(element_type) => element_type,
            Err(never) => match never {},
        }
    }
}

impl From<ElementType> for String {
    fn from(value: ElementType) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Red/amber/green style status of a property.
///
/// Unrecognized or missing statuses read as [`RagStatus::Neutral`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RagStatus {
    Positive,
    Negative,
    Warning,
    #[default]
    Neutral,
}

impl RagStatus {
    /// Returns the canonical status name.
    pub fn name(self) -> &'static str {
        match self {
            RagStatus::Positive => "Positive",
            RagStatus::Negative => "Negative",
            RagStatus::Warning => "Warning",
            RagStatus::Neutral => "Neutral",
        }
    }
}

impl From<String> for RagStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => RagStatus::Positive,
            "negative" => RagStatus::Negative,
            "warning" => RagStatus::Warning,
            _ => RagStatus::Neutral,
        }
    }
}

impl From<RagStatus> for String {
    fn from(value: RagStatus) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for RagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A catalogued domain-model item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise: Option<String>,
}

impl Element {
    /// Create an element with no description, facet or enterprise.
    pub fn new(id: ElementId, name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            id,
            name: name.into(),
            element_type,
            description: String::new(),
            facet: None,
            enterprise: None,
        }
    }

    /// Set the description (builder style).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the enterprise (builder style).
    pub fn with_enterprise(mut self, enterprise: impl Into<String>) -> Self {
        self.enterprise = Some(enterprise.into());
        self
    }

    /// Returns `true` if this element belongs to `enterprise`, ignoring case.
    pub fn in_enterprise(&self, enterprise: &str) -> bool {
        self.enterprise
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(enterprise))
    }
}

/// A declared, typed, directed connection between two elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source_element_id: ElementId,
    pub target_element_id: ElementId,
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Relationship {
    pub fn new(
        source_element_id: ElementId,
        target_element_id: ElementId,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            source_element_id,
            target_element_id,
            relationship_type: relationship_type.into(),
            description: None,
        }
    }

    /// The `(source, target, type)` triple that identifies this relationship.
    pub fn key(&self) -> (ElementId, ElementId, &str) {
        (
            self.source_element_id,
            self.target_element_id,
            &self.relationship_type,
        )
    }
}

/// A tag-like annotation owned by one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub element_id: ElementId,
    #[serde(default)]
    pub rag_status: RagStatus,
    pub property_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Property {
    pub fn new(
        id: PropertyId,
        element_id: ElementId,
        rag_status: RagStatus,
        property_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            element_id,
            rag_status,
            property_name: property_name.into(),
            description: description.into(),
            image_ref: None,
        }
    }
}

/// Returns the ids of properties that duplicate an older property.
///
/// Two properties are duplicates when they share element, name, status,
/// description and image. The lowest id of each group is kept; the
/// returned ids are sorted ascending.
pub fn duplicate_properties(properties: &[Property]) -> Vec<PropertyId> {
    type Key<'a> = (ElementId, &'a str, RagStatus, &'a str, Option<&'a str>);

    let mut groups: BTreeMap<Key<'_>, Vec<PropertyId>> = BTreeMap::new();
    for property in properties {
        let key = (
            property.element_id,
            property.property_name.as_str(),
            property.rag_status,
            property.description.as_str(),
            property.image_ref.as_deref(),
        );
        groups.entry(key).or_default().push(property.id);
    }

    let mut duplicates: Vec<PropertyId> = groups
        .into_values()
        .flat_map(|mut ids| {
            ids.sort_unstable();
            ids.into_iter().skip(1)
        })
        .collect();
    duplicates.sort_unstable();
    duplicates
}
