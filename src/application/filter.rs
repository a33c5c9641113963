//! Search, tag filtering and ordering of post listings.
//!
//! Everything here is synchronous and recomputed from its inputs; nothing is
//! cached between calls.

use serde::Serialize;

use crate::domain::{posts::Post, types::SortOrder};

/// Filter `posts` by `query` and order them by `sort`.
///
/// A post matches when the lowercased query is a substring of its title or
/// description, or when every whitespace-separated query token is one of its
/// tags. Sorting is stable, so ties keep input order.
pub fn apply(posts: &[Post], query: &str, sort: SortOrder) -> Vec<Post> {
    let needle = query.to_lowercase();
    let tokens: Vec<&str> = needle.split_whitespace().collect();

    let mut matched: Vec<Post> = posts
        .iter()
        .filter(|post| matches(post, &needle, &tokens))
        .cloned()
        .collect();

    sort_posts(&mut matched, sort);
    matched
}

fn matches(post: &Post, needle: &str, tokens: &[&str]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if post.title.to_lowercase().contains(needle)
        || post.description.to_lowercase().contains(needle)
    {
        return true;
    }
    tokens.iter().all(|token| post.has_tag(token))
}

pub fn sort_posts(posts: &mut [Post], sort: SortOrder) {
    match sort {
        SortOrder::Date => posts.sort_by(|a, b| b.effective_date().cmp(&a.effective_date())),
        SortOrder::Views => posts.sort_by(|a, b| b.views.cmp(&a.views)),
    }
}

/// Remove `tag` from the query when present, otherwise append it.
pub fn toggle_tag(query: &str, tag: &str) -> String {
    let tag = tag.trim();
    if tag.is_empty() {
        return query.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    let mut tokens: Vec<&str> = query.split_whitespace().collect();
    if is_tag_active(query, tag) {
        let folded = tag.to_lowercase();
        tokens.retain(|token| token.to_lowercase() != folded);
    } else {
        tokens.push(tag);
    }
    tokens.join(" ")
}

pub fn is_tag_active(query: &str, tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    !tag.is_empty()
        && query
            .split_whitespace()
            .any(|token| token.to_lowercase() == tag)
}

/// Every distinct tag across `posts`, most used first. Ties keep the order of
/// first appearance and the first spelling seen.
pub fn collect_tags(posts: &[Post]) -> Vec<String> {
    let mut counted: Vec<(String, String, usize)> = Vec::new();
    for tag in posts.iter().flat_map(|post| post.tags.iter()) {
        let folded = tag.to_lowercase();
        match counted.iter_mut().find(|(key, _, _)| *key == folded) {
            Some((_, _, count)) => *count += 1,
            None => counted.push((folded, tag.clone(), 1)),
        }
    }
    counted.sort_by(|a, b| b.2.cmp(&a.2));
    counted.into_iter().map(|(_, tag, _)| tag).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChip {
    pub name: String,
    /// Present in the filtered result and toggled on in the query.
    pub active: bool,
    /// Absent from the filtered result.
    pub disabled: bool,
}

pub fn tag_chips(all: &[Post], filtered: &[Post], query: &str) -> Vec<TagChip> {
    collect_tags(all)
        .into_iter()
        .map(|name| {
            let disabled = !filtered.iter().any(|post| post.has_tag(&name));
            let active = !disabled && is_tag_active(query, &name);
            TagChip {
                name,
                active,
                disabled,
            }
        })
        .collect()
}

/// Listing inputs whose derived result is recomputed on every read.
#[derive(Debug, Clone, Default)]
pub struct PostListing {
    posts: Vec<Post>,
    query: String,
    sort: SortOrder,
}

impl PostListing {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn set_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.query = toggle_tag(&self.query, tag);
    }

    pub fn results(&self) -> Vec<Post> {
        apply(&self.posts, &self.query, self.sort)
    }

    pub fn tag_chips(&self) -> Vec<TagChip> {
        tag_chips(&self.posts, &self.results(), &self.query)
    }
}
