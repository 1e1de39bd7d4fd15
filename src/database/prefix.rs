//! Field-name to term-prefix mapping and stored value slots.
//!
//! The prefix letters are shared with sup so indexes built by either tool
//! read the same way.

/// Longest term the index accepts. Longer terms are dropped, never truncated.
pub const MAX_TERM_BYTES: usize = 245;

/// Fields whose values are lowercased and split into words before indexing.
const NORMAL_PREFIX: &[(&str, &str)] = &[
    ("subject", "S"),
    ("body", "B"),
    ("from_name", "FN"),
    ("to_name", "TN"),
    ("name", "N"),
    ("attachment", "A"),
];

/// Fields indexed verbatim as a single exact term.
const BOOLEAN_PREFIX: &[(&str, &str)] = &[
    ("type", "K"),
    ("from_email", "FE"),
    ("to_email", "TE"),
    ("email", "E"),
    ("date", "D"),
    ("label", "L"),
    ("source_id", "I"),
    ("attachment_extension", "O"),
    ("msgid", "Q"),
    ("thread", "H"),
    ("ref", "R"),
];

/// Fixed stored-value slots on every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSlot {
    MessageId = 0,
    Thread = 1,
    Date = 2,
}

impl ValueSlot {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Look up the term prefix for `name`.
///
/// Unknown names map to the empty prefix, so their terms land unprefixed and
/// can collide with other unknown fields.
pub fn find_prefix(name: &str) -> &'static str {
    NORMAL_PREFIX
        .iter()
        .chain(BOOLEAN_PREFIX.iter())
        .find(|(field, _)| *field == name)
        .map(|(_, prefix)| *prefix)
        .unwrap_or("")
}

pub fn is_boolean(name: &str) -> bool {
    BOOLEAN_PREFIX.iter().any(|(field, _)| *field == name)
}

pub fn is_known(name: &str) -> bool {
    is_boolean(name) || NORMAL_PREFIX.iter().any(|(field, _)| *field == name)
}

/// Build the prefixed term for `value` under field `name`.
///
/// Returns `None` when the result would exceed [`MAX_TERM_BYTES`].
pub fn make_term(name: &str, value: &str) -> Option<String> {
    let prefix = find_prefix(name);
    if prefix.len() + value.len() > MAX_TERM_BYTES {
        log::debug!("dropping {} byte term for field {}", prefix.len() + value.len(), name);
        return None;
    }
    let mut term = String::with_capacity(prefix.len() + value.len());
    term.push_str(prefix);
    term.push_str(value);
    Some(term)
}

/// Split free text into lowercase words the way normal fields are indexed.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_prefixes() {
        assert_eq!(find_prefix("subject"), "S");
        assert_eq!(find_prefix("from_name"), "FN");
        assert_eq!(find_prefix("msgid"), "Q");
        assert_eq!(find_prefix("thread"), "H");
        assert_eq!(find_prefix("ref"), "R");
        assert_eq!(find_prefix("attachment_extension"), "O");
    }

    #[test]
    fn unknown_field_maps_to_empty_prefix() {
        assert_eq!(find_prefix("colour"), "");
        assert_eq!(make_term("colour", "red").as_deref(), Some("red"));
        assert!(!is_known("colour"));
    }

    #[test]
    fn boolean_and_normal_fields_are_distinguished() {
        assert!(is_boolean("thread"));
        assert!(!is_boolean("subject"));
        assert!(is_known("subject"));
    }

    #[test]
    fn overlong_terms_are_dropped() {
        let value = "x".repeat(MAX_TERM_BYTES - 1);
        assert_eq!(make_term("msgid", &value).map(|t| t.len()), Some(MAX_TERM_BYTES));
        let value = "x".repeat(MAX_TERM_BYTES);
        assert!(make_term("msgid", &value).is_none());
    }

    #[test]
    fn value_slots_are_fixed() {
        assert_eq!(ValueSlot::MessageId.index(), 0);
        assert_eq!(ValueSlot::Thread.index(), 1);
        assert_eq!(ValueSlot::Date.index(), 2);
    }

    #[test]
    fn words_are_lowercased() {
        let collected: Vec<String> = words("Re: Fix the BUG, please").collect();
        assert_eq!(collected, vec!["re", "fix", "the", "bug", "please"]);
    }
}
