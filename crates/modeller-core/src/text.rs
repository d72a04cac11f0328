//! Text helpers for markup generation: note wrapping and label casing.

/// Greedily wraps `text` into lines of at most `max_width` characters.
///
/// Words are separated by any run of whitespace and joined with single
/// spaces. A word is never split: a single word longer than `max_width`
/// is emitted on its own over-long line. Blank input yields no lines.
///
/// # Examples
///
/// ```
/// use modeller_core::text::wrap;
///
/// let lines = wrap("the quick brown fox jumps", 10);
/// assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
/// ```
pub fn wrap(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Upper-cases the first character of `name`, leaving the rest untouched.
///
/// ```
/// use modeller_core::text::capitalize_first;
///
/// assert_eq!(capitalize_first("customer portal"), "Customer portal");
/// assert_eq!(capitalize_first("iPhone app"), "IPhone app");
/// ```
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turns a relationship type into a human-readable link label.
///
/// Underscores become spaces and every word is title-cased.
///
/// ```
/// use modeller_core::text::relationship_label;
///
/// assert_eq!(relationship_label("uses"), "Uses");
/// assert_eq!(relationship_label("is_part_of"), "Is Part Of");
/// assert_eq!(relationship_label("features in"), "Features In");
/// ```
pub fn relationship_label(relationship_type: &str) -> String {
    relationship_type
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_exact_width() {
        assert_eq!(wrap("aaaa bbbb", 9), vec!["aaaa bbbb"]);
        assert_eq!(wrap("aaaa bbbb", 8), vec!["aaaa", "bbbb"]);
    }

    #[test]
    fn test_wrap_long_word_is_not_split() {
        assert_eq!(
            wrap("supercalifragilistic is long", 5),
            vec!["supercalifragilistic", "is", "long"]
        );
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        assert_eq!(wrap("  a \n\t b  ", 40), vec!["a b"]);
    }

    #[test]
    fn test_wrap_blank_input() {
        assert!(wrap("", 10).is_empty());
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_wrap_zero_width_puts_each_word_on_its_own_line() {
        assert_eq!(wrap("a b c", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_capitalize_first_only() {
        assert_eq!(capitalize_first("pAYMENT gateway"), "PAYMENT gateway");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("épicerie"), "Épicerie");
    }

    #[test]
    fn test_relationship_label_lowercases_tail() {
        assert_eq!(relationship_label("APPEARS_IN"), "Appears In");
        assert_eq!(relationship_label("__"), "");
    }
}
