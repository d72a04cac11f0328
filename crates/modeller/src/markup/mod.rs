//! Markup syntax tree and its single formatting pass.
//!
//! Encoders never concatenate markup text themselves. They build a list of
//! typed [`Statement`]s and the formatter here turns the list into text, so
//! the identifier for an element is computed once and reused everywhere it
//! appears.
//!
//! A rendered document looks like:
//!
//! ```text
//! @startuml
//! !include <edgy/edgy>
//! $capability("CustomerPortal", CustomerPortal)
//! note right of CustomerPortal
//!   Self-service portal
//! end note
//! $link(CustomerPortal, PaymentGateway, "Uses")
//! @enduml
//! ```

pub mod macros;

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use modeller_core::identifier::Identifier;

/// First line of every standalone document.
pub const DOCUMENT_START: &str = "@startuml";

/// Last line of every standalone document.
pub const DOCUMENT_END: &str = "@enduml";

/// Library include emitted right after [`DOCUMENT_START`].
pub const LIBRARY_INCLUDE: &str = "!include <edgy/edgy>";

const LEFT_TO_RIGHT: &str = "left to right direction";

/// Overall flow direction of a rendered diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    TopToBottom,
    LeftToRight,
}

/// One markup statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `$macro("Label", identifier)`
    Declaration {
        macro_name: &'static str,
        label: String,
        identifier: Identifier,
    },
    /// A note block anchored to a declared identifier.
    Note {
        anchor: Identifier,
        color: Option<&'static str>,
        lines: Vec<String>,
    },
    /// `$link(source, target, "Label")`
    Link {
        source: Identifier,
        target: Identifier,
        label: String,
    },
}

impl Statement {
    /// Returns every identifier this statement references.
    pub fn identifiers(&self) -> Vec<&Identifier> {
        match self {
            Statement::Declaration { identifier, .. } => vec![identifier],
            Statement::Note { anchor, .. } => vec![anchor],
            Statement::Link { source, target, .. } => vec![source, target],
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Declaration {
                macro_name,
                label,
                identifier,
            } => writeln!(f, "{macro_name}(\"{}\", {identifier})", quote_safe(label)),
            Statement::Note {
                anchor,
                color,
                lines,
            } => {
                write!(f, "note right of {anchor}")?;
                if let Some(color) = color {
                    write!(f, " {color}")?;
                }
                f.write_char('\n')?;
                for line in lines {
                    writeln!(f, "  {line}")?;
                }
                writeln!(f, "end note")
            }
            Statement::Link {
                source,
                target,
                label,
            } => writeln!(
                f,
                "{}({source}, {target}, \"{}\")",
                macros::LINK_MACRO,
                quote_safe(label)
            ),
        }
    }
}

/// Labels are emitted inside double quotes, which the markup cannot escape.
fn quote_safe(label: &str) -> String {
    label.replace('"', "'")
}

/// The markup for a single element: its declaration and attached notes.
///
/// A block is a fragment. It renders either on its own
/// ([`MarkupBlock::fragment`]) for embedding into a composite, or wrapped in
/// document markers ([`MarkupBlock::standalone`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupBlock {
    statements: Vec<Statement>,
}

impl MarkupBlock {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Borrow the block's statements.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns the identifier bound by the block's declaration, if any.
    pub fn declared_identifier(&self) -> Option<&Identifier> {
        self.statements.iter().find_map(|statement| match statement {
            Statement::Declaration { identifier, .. } => Some(identifier),
            _ => None,
        })
    }

    /// Render the block without document markers.
    pub fn fragment(&self) -> String {
        render_statements(&self.statements)
    }

    /// Render the block as a complete document.
    pub fn standalone(&self, direction: Direction) -> String {
        let mut document = MarkupDocument::new(direction);
        document.extend(self.statements.iter().cloned());
        document.render()
    }
}

/// A complete markup document: header, statements, footer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupDocument {
    direction: Direction,
    statements: Vec<Statement>,
}

impl MarkupDocument {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            statements: Vec::new(),
        }
    }

    /// Append one statement.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Append a sequence of statements in order.
    pub fn extend(&mut self, statements: impl IntoIterator<Item = Statement>) {
        self.statements.extend(statements);
    }

    /// Borrow the document's statements.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Number of declarations in the document.
    pub fn declaration_count(&self) -> usize {
        self.statements
            .iter()
            .filter(|s| matches!(s, Statement::Declaration { .. }))
            .count()
    }

    /// Number of link statements in the document.
    pub fn link_count(&self) -> usize {
        self.statements
            .iter()
            .filter(|s| matches!(s, Statement::Link { .. }))
            .count()
    }

    /// Render the document to text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(DOCUMENT_START);
        out.push('\n');
        out.push_str(LIBRARY_INCLUDE);
        out.push('\n');
        if self.direction == Direction::LeftToRight {
            out.push_str(LEFT_TO_RIGHT);
            out.push('\n');
        }
        out.push_str(&render_statements(&self.statements));
        out.push_str(DOCUMENT_END);
        out.push('\n');
        out
    }
}

fn render_statements(statements: &[Statement]) -> String {
    statements.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> MarkupBlock {
        let id = Identifier::derive("API Gateway");
        MarkupBlock::new(vec![
            Statement::Declaration {
                macro_name: "$capability",
                label: "API \"Gateway\"".to_string(),
                identifier: id.clone(),
            },
            Statement::Note {
                anchor: id,
                color: Some("#red"),
                lines: vec!["Latency: high".to_string()],
            },
        ])
    }

    #[test]
    fn test_render_declaration_and_note() {
        let fragment = sample_block().fragment();
        assert_eq!(
            fragment,
            "$capability(\"API 'Gateway'\", API_Gateway)\n\
             note right of API_Gateway #red\n  Latency: high\nend note\n"
        );
    }

    #[test]
    fn test_render_link() {
        let link = Statement::Link {
            source: Identifier::derive("CustomerPortal"),
            target: Identifier::derive("PaymentGateway"),
            label: "Uses".to_string(),
        };
        assert_eq!(
            link.to_string(),
            "$link(CustomerPortal, PaymentGateway, \"Uses\")\n"
        );
    }

    #[test]
    fn test_standalone_has_markers() {
        let text = sample_block().standalone(Direction::TopToBottom);
        assert!(text.starts_with("@startuml\n!include <edgy/edgy>\n"));
        assert!(text.ends_with("@enduml\n"));
        assert!(!text.contains("left to right direction"));
    }

    #[test]
    fn test_left_to_right_header() {
        let text = sample_block().standalone(Direction::LeftToRight);
        assert!(text.contains("\nleft to right direction\n"));
    }

    #[test]
    fn test_declared_identifier() {
        assert_eq!(
            sample_block().declared_identifier(),
            Some(&Identifier::derive("API Gateway"))
        );
        assert_eq!(MarkupBlock::default().declared_identifier(), None);
    }

    #[test]
    fn test_empty_note_renders_empty_body() {
        let note = Statement::Note {
            anchor: Identifier::derive("X"),
            color: None,
            lines: vec![],
        };
        assert_eq!(note.to_string(), "note right of X\nend note\n");
    }
}
