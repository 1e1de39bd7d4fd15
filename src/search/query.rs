//! Query-string parsing.
//!
//! Clauses are separated by whitespace and must all match. Supported forms:
//!
//! - `field:value` for any registered field; boolean fields match the value
//!   verbatim, free-text fields match every word of it
//! - `from:`, `to:`, `id:`, `tag:` as aliases of `from_email`, `to_email`,
//!   `msgid`, `label`
//! - `date:A..B` with unix seconds or any date `dateparser` accepts on either
//!   side (either side may be empty)
//! - bare words, matched against subject and body
//! - a leading `-` to exclude a clause
//! - `*` or the empty string for every message

use std::ops::Bound;

use crate::database::engine::EngineQuery;
use crate::database::prefix::{is_boolean, is_known, make_term, words};
use crate::error::{DatabaseError, DatabaseResult};

fn resolve_alias(field: &str) -> &str {
    match field {
        "from" => "from_email",
        "to" => "to_email",
        "id" | "mid" => "msgid",
        "tag" => "label",
        other => other,
    }
}

fn term_query(field: &str, value: &str) -> EngineQuery {
    // An overlong term can never be in the index; match it against nothing.
    match make_term(field, value) {
        Some(term) => EngineQuery::Term(term),
        None => EngineQuery::Or(Vec::new()),
    }
}

fn word_query(field: &str, text: &str) -> DatabaseResult<EngineQuery> {
    let clauses: Vec<EngineQuery> = words(text).map(|word| term_query(field, &word)).collect();
    match clauses.len() {
        0 => Err(DatabaseError::InvalidQuery(format!("no words in `{}:{}`", field, text))),
        1 => Ok(clauses.into_iter().next().unwrap_or(EngineQuery::All)),
        _ => Ok(EngineQuery::And(clauses)),
    }
}

/// Parse a `date:` bound: unix seconds or a date string.
fn parse_date_bound(raw: &str) -> DatabaseResult<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(seconds) = raw.parse::<i64>() {
        return Ok(Some(seconds));
    }
    dateparser::parse(raw)
        .map(|dt| Some(dt.timestamp()))
        .map_err(|err| DatabaseError::InvalidQuery(format!("invalid date `{}`: {}", raw, err)))
}

fn date_query(value: &str) -> DatabaseResult<EngineQuery> {
    match value.split_once("..") {
        Some((from, to)) => {
            let from = parse_date_bound(from)?.map_or(Bound::Unbounded, Bound::Included);
            let to = parse_date_bound(to)?.map_or(Bound::Unbounded, Bound::Included);
            Ok(EngineQuery::DateRange { from, to })
        }
        // A single day is matched through its `date` term.
        None => Ok(term_query("date", value)),
    }
}

fn parse_clause(clause: &str) -> DatabaseResult<EngineQuery> {
    if let Some((field, value)) = clause.split_once(':') {
        let field = resolve_alias(field);
        if value.is_empty() {
            return Err(DatabaseError::InvalidQuery(format!("empty value for `{}`", field)));
        }
        if field == "date" {
            return date_query(value);
        }
        if is_boolean(field) {
            let value = if field.ends_with("email") {
                value.to_lowercase()
            } else {
                value.to_string()
            };
            return Ok(term_query(field, &value));
        }
        if is_known(field) {
            return word_query(field, value);
        }
        log::debug!("unknown field `{}`, searching free text", field);
    }

    let clauses: Vec<EngineQuery> = words(clause)
        .map(|word| {
            EngineQuery::Or(vec![
                term_query("subject", &word),
                term_query("body", &word),
            ])
        })
        .collect();
    match clauses.len() {
        0 => Err(DatabaseError::InvalidQuery(format!("nothing to search for in `{}`", clause))),
        1 => Ok(clauses.into_iter().next().unwrap_or(EngineQuery::All)),
        _ => Ok(EngineQuery::And(clauses)),
    }
}

/// Parse a query string into an engine query.
pub fn parse_query(query: &str) -> DatabaseResult<EngineQuery> {
    let mut clauses = Vec::new();
    for token in query.split_whitespace() {
        if token == "*" {
            continue;
        }
        match token.strip_prefix('-') {
            Some(rest) if !rest.is_empty() => {
                clauses.push(EngineQuery::Not(Box::new(parse_clause(rest)?)));
            }
            _ => clauses.push(parse_clause(token)?),
        }
    }

    Ok(match clauses.len() {
        0 => EngineQuery::All,
        1 => match clauses.pop() {
            Some(EngineQuery::Not(inner)) => EngineQuery::And(vec![EngineQuery::Not(inner)]),
            Some(clause) => clause,
            None => EngineQuery::All,
        },
        _ => EngineQuery::And(clauses),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(t: &str) -> EngineQuery {
        EngineQuery::Term(t.to_string())
    }

    #[test]
    fn empty_and_star_match_everything() {
        assert_eq!(parse_query("").unwrap(), EngineQuery::All);
        assert_eq!(parse_query("  * ").unwrap(), EngineQuery::All);
    }

    #[test]
    fn boolean_fields_and_aliases() {
        assert_eq!(parse_query("thread:abc").unwrap(), term("Habc"));
        assert_eq!(parse_query("id:x@y").unwrap(), term("Qx@y"));
        assert_eq!(parse_query("from:Ann@Example.com").unwrap(), term("FEann@example.com"));
        assert_eq!(parse_query("tag:inbox").unwrap(), term("Linbox"));
    }

    #[test]
    fn bare_words_search_subject_and_body() {
        assert_eq!(
            parse_query("Lunch").unwrap(),
            EngineQuery::Or(vec![term("Slunch"), term("Blunch")])
        );
    }

    #[test]
    fn free_text_field_splits_words() {
        assert_eq!(
            parse_query("subject:lunch-plans").unwrap(),
            EngineQuery::And(vec![term("Slunch"), term("Splans")])
        );
    }

    #[test]
    fn clauses_are_conjunctive_and_negatable() {
        assert_eq!(
            parse_query("thread:a -tag:spam").unwrap(),
            EngineQuery::And(vec![
                term("Ha"),
                EngineQuery::Not(Box::new(term("Lspam")))
            ])
        );
        assert_eq!(
            parse_query("-tag:spam").unwrap(),
            EngineQuery::And(vec![EngineQuery::Not(Box::new(term("Lspam")))])
        );
    }

    #[test]
    fn date_ranges() {
        assert_eq!(
            parse_query("date:100..200").unwrap(),
            EngineQuery::DateRange {
                from: Bound::Included(100),
                to: Bound::Included(200)
            }
        );
        assert_eq!(
            parse_query("date:..200").unwrap(),
            EngineQuery::DateRange {
                from: Bound::Unbounded,
                to: Bound::Included(200)
            }
        );
        assert_eq!(parse_query("date:2003-07-01").unwrap(), term("D2003-07-01"));
        assert!(parse_query("date:yesterday-ish..").is_err());
    }

    #[test]
    fn rejects_empty_values() {
        assert!(parse_query("thread:").is_err());
        assert!(parse_query("subject:!!!").is_err());
    }
}
