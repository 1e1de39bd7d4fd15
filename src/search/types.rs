use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Order of search results by message timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::NewestFirst
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::NewestFirst => "newest",
            SortOrder::OldestFirst => "oldest",
        })
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" | "newest-first" | "" => Ok(SortOrder::NewestFirst),
            "oldest" | "oldest-first" => Ok(SortOrder::OldestFirst),
            other => Err(format!("invalid sort order '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sort_order() {
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::NewestFirst);
        assert_eq!("Oldest".parse::<SortOrder>().unwrap(), SortOrder::OldestFirst);
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::OldestFirst.to_string(), "oldest");
    }
}
