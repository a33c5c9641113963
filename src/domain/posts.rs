use serde::Serialize;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use super::reading_time::ReadingTime;

pub const HUMAN_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:long] [day], [year]");

/// Read-only view-model of one blog post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub author: Author,
    pub icon: Option<PostIcon>,
    pub banner: String,
    pub description: String,
    pub views: u64,
    pub tags: Vec<String>,
    pub reading_time: ReadingTime,
}

impl Post {
    /// Timestamp used for date ordering: last update, else publication.
    pub fn effective_date(&self) -> OffsetDateTime {
        self.updated_at.unwrap_or(self.published_at)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.tags.iter().any(|candidate| candidate.to_lowercase() == needle)
    }

    pub fn published_label(&self) -> String {
        format_human_date(self.published_at)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub avatar_url: String,
    pub email: String,
}

/// Either an image or a short glyph, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PostIcon {
    Image(String),
    Glyph(String),
}

/// Normalise raw labels: trim, drop empties, drop case-insensitive duplicates
/// while keeping the first spelling.
pub fn normalize_tags<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = Vec::<String>::new();
    let mut tags = Vec::new();
    for label in labels {
        let trimmed = label.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        let folded = trimmed.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        tags.push(trimmed.to_string());
    }
    tags
}

/// Parse a comma-joined tag string into the normalised list form.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

pub fn format_human_date(value: OffsetDateTime) -> String {
    value
        .date()
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| value.date().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn normalize_tags_trims_and_dedupes() {
        let tags = normalize_tags([" Rust", "rust", "", "  ", "Web "]);
        assert_eq!(tags, vec!["Rust".to_string(), "Web".to_string()]);
    }

    #[test]
    fn parse_tag_list_splits_commas() {
        assert_eq!(
            parse_tag_list("dotnet, Clean Architecture,,nuget"),
            vec!["dotnet", "Clean Architecture", "nuget"]
        );
        assert!(parse_tag_list("").is_empty());
    }

    #[test]
    fn human_date_uses_long_month() {
        assert_eq!(
            format_human_date(datetime!(2024-03-07 10:00 UTC)),
            "March 07, 2024"
        );
    }
}
