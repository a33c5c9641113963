//! Shared domain enumerations selectable from configuration and query strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Ordering applied to a post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most recently updated (or published) first.
    #[default]
    Date,
    /// Most viewed first.
    Views,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Date => "date",
            SortOrder::Views => "views",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortOrder::Date),
            "views" => Ok(SortOrder::Views),
            other => Err(DomainError::validation(format!(
                "unknown sort order `{other}` (expected `date` or `views`)"
            ))),
        }
    }
}

/// How the "posts you might like" section is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedPostsStrategy {
    /// Rank by number of shared tags, falling back to a random sample.
    #[default]
    TagOverlap,
    /// Uniform random sample of other posts.
    Random,
}

impl FromStr for RelatedPostsStrategy {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tag_overlap" | "tags" => Ok(RelatedPostsStrategy::TagOverlap),
            "random" => Ok(RelatedPostsStrategy::Random),
            other => Err(DomainError::validation(format!(
                "unknown related posts strategy `{other}`"
            ))),
        }
    }
}

/// Kind of the database property that carries the publication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPropertyKind {
    #[default]
    Status,
    Select,
}

impl StatusPropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusPropertyKind::Status => "status",
            StatusPropertyKind::Select => "select",
        }
    }
}

impl FromStr for StatusPropertyKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(StatusPropertyKind::Status),
            "select" => Ok(StatusPropertyKind::Select),
            other => Err(DomainError::validation(format!(
                "unknown status property kind `{other}`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("Views".parse::<SortOrder>().expect("views"), SortOrder::Views);
        assert_eq!(" date ".parse::<SortOrder>().expect("date"), SortOrder::Date);
        assert!("title".parse::<SortOrder>().is_err());
    }

    #[test]
    fn related_strategy_accepts_hyphenated_names() {
        assert_eq!(
            "tag-overlap".parse::<RelatedPostsStrategy>().expect("strategy"),
            RelatedPostsStrategy::TagOverlap
        );
        assert_eq!(
            "random".parse::<RelatedPostsStrategy>().expect("strategy"),
            RelatedPostsStrategy::Random
        );
    }
}
