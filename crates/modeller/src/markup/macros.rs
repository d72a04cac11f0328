//! Fixed lookup tables from catalogue enums to markup vocabulary.

use modeller_core::catalogue::{ElementType, RagStatus};

/// Macro used for element types the markup library does not define.
pub const DEFAULT_MACRO: &str = "$element";

/// Macro that draws a relationship line between two declared elements.
pub const LINK_MACRO: &str = "$link";

/// Returns the declaration macro for an element type.
pub fn macro_for(element_type: &ElementType) -> &'static str {
    match element_type {
        ElementType::Capability => "$capability",
        ElementType::Asset => "$asset",
        ElementType::Process => "$process",
        ElementType::Purpose => "$purpose",
        ElementType::Content => "$content",
        ElementType::Story => "$story",
        ElementType::Channel => "$channel",
        ElementType::Journey => "$journey",
        ElementType::Task => "$task",
        ElementType::Product => "$product",
        ElementType::Organisation => "$organisation",
        ElementType::Brand => "$brand",
        ElementType::People => "$people",
        ElementType::Outcome => "$outcome",
        ElementType::Object => "$object",
        ElementType::Other(_) => DEFAULT_MACRO,
    }
}

/// Returns the note color for a property status, `None` for no color.
pub fn rag_color(status: RagStatus) -> Option<&'static str> {
    match status {
        RagStatus::Negative => Some("#red"),
        RagStatus::Positive => Some("#green"),
        RagStatus::Warning => Some("#yellow"),
        RagStatus::Neutral => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_known_types_have_distinct_macros() {
        let macros: HashSet<_> = ElementType::KNOWN.iter().map(macro_for).collect();
        assert_eq!(macros.len(), ElementType::KNOWN.len());
        assert!(!macros.contains(DEFAULT_MACRO));
    }

    #[test]
    fn test_unknown_type_uses_default() {
        assert_eq!(macro_for(&ElementType::Other("Activity".into())), DEFAULT_MACRO);
    }

    #[test]
    fn test_rag_colors() {
        assert_eq!(rag_color(RagStatus::Negative), Some("#red"));
        assert_eq!(rag_color(RagStatus::Positive), Some("#green"));
        assert_eq!(rag_color(RagStatus::Warning), Some("#yellow"));
        assert_eq!(rag_color(RagStatus::Neutral), None);
    }
}
