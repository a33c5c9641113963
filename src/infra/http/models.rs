use serde::{Deserialize, Serialize};

use crate::{
    application::{
        blog::{BlogListing, PostDetail},
        seo::{MetaTag, PageMeta},
    },
    domain::toc::{HeadingEntry, indent_px},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListingQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToggleQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub query: String,
    pub tag: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct MetaView {
    #[serde(flatten)]
    pub page: PageMeta,
    pub tags: Vec<MetaTag>,
}

impl From<PageMeta> for MetaView {
    fn from(page: PageMeta) -> Self {
        let tags = page.meta_tags();
        Self { page, tags }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub listing: BlogListing,
    pub meta: MetaView,
}

/// Table-of-contents entry as the page renders it.
#[derive(Debug, Serialize)]
pub struct TocItem {
    pub id: String,
    pub level: u8,
    pub text: String,
    pub indent_px: u32,
}

impl TocItem {
    pub fn from_entry(entry: &HeadingEntry, min_level: u8) -> Self {
        Self {
            id: entry.id.clone(),
            level: entry.level,
            text: entry.display_text(),
            indent_px: indent_px(entry.level, min_level),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub detail: PostDetail,
    pub toc_items: Vec<TocItem>,
    pub meta: MetaView,
}

impl PostDetailResponse {
    pub fn new(detail: PostDetail, meta: PageMeta) -> Self {
        let toc_items = detail
            .toc
            .iter()
            .map(|entry| TocItem::from_entry(entry, detail.min_level))
            .collect();
        Self {
            detail,
            toc_items,
            meta: meta.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
