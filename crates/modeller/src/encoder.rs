//! Markup for a single catalogued element.
//!
//! [`ElementEncoder::block`] is a pure function of the element, its
//! properties and the options. The identifier it binds comes from
//! [`Identifier::for_element`], the same function the composite compiler's
//! lookup table is built from.

use serde::{Deserialize, Serialize};

use modeller_core::{
    catalogue::{Element, Property},
    identifier::Identifier,
    text,
};

use crate::markup::{
    MarkupBlock, Statement,
    macros::{macro_for, rag_color},
};

/// Which optional notes an element block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeOptions {
    pub include_notes: bool,
    pub include_properties: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            include_notes: true,
            include_properties: true,
        }
    }
}

/// A catalogued element together with the properties it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementEntry {
    pub element: Element,
    pub properties: Vec<Property>,
}

impl ElementEntry {
    pub fn new(element: Element, properties: Vec<Property>) -> Self {
        Self {
            element,
            properties,
        }
    }
}

/// Builds the markup block for one element.
#[derive(Debug, Clone, Copy)]
pub struct ElementEncoder {
    note_width: usize,
}

impl ElementEncoder {
    /// Create an encoder that wraps notes at `note_width` characters.
    pub fn new(note_width: usize) -> Self {
        Self { note_width }
    }

    /// Build the declaration and notes for `entry`.
    ///
    /// Properties owned by a different element are ignored. Property notes
    /// follow the order of `entry.properties`.
    pub fn block(&self, entry: &ElementEntry, options: EncodeOptions) -> MarkupBlock {
        let element = &entry.element;
        let identifier = Identifier::for_element(&element.name, &element.element_type);

        let mut statements = vec![Statement::Declaration {
            macro_name: macro_for(&element.element_type),
            label: text::capitalize_first(&element.name),
            identifier: identifier.clone(),
        }];

        if options.include_notes && !element.description.trim().is_empty() {
            statements.push(Statement::Note {
                anchor: identifier.clone(),
                color: None,
                lines: text::wrap(&element.description, self.note_width),
            });
        }

        if options.include_properties {
            let owned = entry
                .properties
                .iter()
                .filter(|property| property.element_id == element.id);
            for property in owned {
                let body = format!("{}: {}", property.property_name, property.description);
                statements.push(Statement::Note {
                    anchor: identifier.clone(),
                    color: rag_color(property.rag_status),
                    lines: text::wrap(&body, self.note_width),
                });
            }
        }

        MarkupBlock::new(statements)
    }
}

#[cfg(test)]
mod tests {
    use modeller_core::catalogue::{ElementType, RagStatus};

    use super::*;
    use crate::markup::Direction;

    fn portal() -> ElementEntry {
        let element = Element::new(1, "customer portal", ElementType::Capability)
            .with_description("Self-service portal used by retail customers to manage accounts");
        let properties = vec![
            Property::new(10, 1, RagStatus::Negative, "Latency", "p99 above target"),
            Property::new(11, 1, RagStatus::Neutral, "Owner", "Digital team"),
            Property::new(12, 2, RagStatus::Positive, "Foreign", "belongs elsewhere"),
        ];
        ElementEntry::new(element, properties)
    }

    #[test]
    fn test_full_block() {
        let block = ElementEncoder::new(30).block(&portal(), EncodeOptions::default());
        assert_eq!(
            block.fragment(),
            "$capability(\"Customer portal\", customer_portal)\n\
             note right of customer_portal\n\
             \x20 Self-service portal used by\n\
             \x20 retail customers to manage\n\
             \x20 accounts\n\
             end note\n\
             note right of customer_portal #red\n\
             \x20 Latency: p99 above target\n\
             end note\n\
             note right of customer_portal\n\
             \x20 Owner: Digital team\n\
             end note\n"
        );
    }

    #[test]
    fn test_declaration_only() {
        let options = EncodeOptions {
            include_notes: false,
            include_properties: false,
        };
        let block = ElementEncoder::new(30).block(&portal(), options);
        assert_eq!(block.statements().len(), 1);
    }

    #[test]
    fn test_blank_description_has_no_note() {
        let entry = ElementEntry::new(Element::new(3, "Checkout", ElementType::Process), vec![]);
        let block = ElementEncoder::new(40).block(&entry, EncodeOptions::default());
        assert_eq!(block.fragment(), "$process(\"Checkout\", Checkout)\n");
    }

    #[test]
    fn test_singleton_binds_type_variable() {
        let entry = ElementEntry::new(
            Element::new(4, "acme widgets", ElementType::Product).with_description("Flagship"),
            vec![],
        );
        let block = ElementEncoder::new(40).block(&entry, EncodeOptions::default());
        assert_eq!(
            block.fragment(),
            "$product(\"Acme widgets\", product)\nnote right of product\n  Flagship\nend note\n"
        );
    }

    #[test]
    fn test_unknown_type_uses_default_macro() {
        let entry = ElementEntry::new(
            Element::new(5, "Onboard", ElementType::Other("Activity".into())),
            vec![],
        );
        let block = ElementEncoder::new(40).block(&entry, EncodeOptions::default());
        assert_eq!(block.fragment(), "$element(\"Onboard\", Onboard)\n");
    }

    #[test]
    fn test_identifier_keeps_name_case_while_label_is_capitalized() {
        let entry = ElementEntry::new(Element::new(6, "aPI Gateway", ElementType::Asset), vec![]);
        let block = ElementEncoder::new(40).block(&entry, EncodeOptions::default());
        assert_eq!(
            block.declared_identifier(),
            Some(&Identifier::derive("aPI Gateway"))
        );
        assert!(block.fragment().starts_with("$asset(\"API Gateway\", aPI_Gateway)"));
    }

    #[test]
    fn test_standalone_is_wrapped() {
        let block = ElementEncoder::new(40).block(&portal(), EncodeOptions::default());
        let doc = block.standalone(Direction::TopToBottom);
        assert!(doc.starts_with("@startuml\n"));
        assert!(doc.contains(&block.fragment()));
        assert!(doc.ends_with("@enduml\n"));
    }
}
