//! Conversion of raw workspace records into [`Post`] view-models.

use std::sync::Arc;

use quire_content_types::{FileOrEmoji, PageRecord, PropertyValue, RichTextRun};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::domain::{
    posts::{Author, Post, PostIcon, normalize_tags},
    reading_time::ReadingTimeEstimator,
    slug::derive_slug,
};

/// Names of the database properties read by the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    pub title: String,
    pub slug: String,
    pub author: String,
    pub views: String,
    pub description: String,
    pub tags: String,
    pub status: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Content Title".to_string(),
            slug: "Slug".to_string(),
            author: "Author".to_string(),
            views: "Views".to_string(),
            description: "Description".to_string(),
            tags: "Blog Category".to_string(),
            status: "Status".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ContentRecordMapper {
    properties: PropertyNames,
    estimator: Arc<dyn ReadingTimeEstimator>,
}

impl ContentRecordMapper {
    pub fn new(properties: PropertyNames, estimator: Arc<dyn ReadingTimeEstimator>) -> Self {
        Self {
            properties,
            estimator,
        }
    }

    /// Build a post from a record and the concatenated text of its blocks.
    /// Absent or malformed fields fall back to empty values.
    pub fn map(&self, record: &PageRecord, body_text: &str) -> Post {
        let names = &self.properties;
        let title = first_run(record.property(&names.title), |value| &value.title);
        let explicit_slug = first_run(record.property(&names.slug), |value| &value.rich_text);

        Post {
            id: record.id.clone(),
            slug: resolve_slug(&explicit_slug, &title, &record.id),
            title,
            published_at: parse_timestamp(record.created_time.as_deref())
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
            updated_at: parse_timestamp(record.last_edited_time.as_deref()),
            author: author(record.property(&names.author)),
            icon: record.icon.as_ref().and_then(icon),
            banner: record.cover.as_ref().and_then(file_url).unwrap_or_default(),
            description: first_run(record.property(&names.description), |value| {
                &value.rich_text
            }),
            views: views(record.property(&names.views)),
            tags: record
                .property(&names.tags)
                .map(|value| normalize_tags(value.multi_select.iter().map(|option| &option.name)))
                .unwrap_or_default(),
            reading_time: self.estimator.estimate(body_text),
        }
    }
}

fn first_run<F>(value: Option<&PropertyValue>, runs: F) -> String
where
    F: Fn(&PropertyValue) -> &Vec<RichTextRun>,
{
    value
        .and_then(|value| runs(value).first())
        .map(|run| run.content().to_string())
        .unwrap_or_default()
}

fn resolve_slug(explicit: &str, title: &str, id: &str) -> String {
    if let Ok(slug) = derive_slug(explicit) {
        return slug;
    }
    if title.trim().is_empty() {
        return String::new();
    }
    derive_slug(title)
        .or_else(|_| derive_slug(id))
        .unwrap_or_else(|_| "post".to_string())
}

fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    raw.and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok())
}

fn author(value: Option<&PropertyValue>) -> Author {
    let Some(person) = value.and_then(|value| value.people.first()) else {
        return Author::default();
    };
    Author {
        name: person.name.clone().unwrap_or_default(),
        avatar_url: person.avatar_url.clone().unwrap_or_default(),
        email: person
            .person
            .as_ref()
            .and_then(|detail| detail.email.clone())
            .unwrap_or_default(),
    }
}

fn views(value: Option<&PropertyValue>) -> u64 {
    match value.and_then(|value| value.number) {
        Some(number) if number.is_finite() && number > 0.0 => number.round() as u64,
        _ => 0,
    }
}

fn file_url(reference: &FileOrEmoji) -> Option<String> {
    reference
        .external
        .as_ref()
        .or(reference.file.as_ref())
        .and_then(|file| file.url.clone())
        .filter(|url| !url.is_empty())
}

fn icon(reference: &FileOrEmoji) -> Option<PostIcon> {
    if let Some(url) = file_url(reference) {
        return Some(PostIcon::Image(url));
    }
    reference
        .emoji
        .clone()
        .filter(|emoji| !emoji.is_empty())
        .map(PostIcon::Glyph)
}
