#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use quire::{
    application::{
        blog::{BlogService, RelatedOptions},
        content::{ContentSource, SourceError},
        mapper::{ContentRecordMapper, PropertyNames},
    },
    domain::{blocks::ContentBlock, reading_time::WordsPerMinute, types::RelatedPostsStrategy},
};
use quire_content_types::PageRecord;
use serde_json::json;

#[derive(Default)]
pub struct FakeSource {
    pub pages: Vec<PageRecord>,
    pub blocks: HashMap<String, Vec<ContentBlock>>,
    pub failing: AtomicBool,
    pub query_calls: AtomicUsize,
    pub slug_calls: AtomicUsize,
    pub block_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_pages(pages: Vec<PageRecord>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn blocks_for(mut self, page_id: &str, blocks: Vec<ContentBlock>) -> Self {
        self.blocks.insert(page_id.to_string(), blocks);
        self
    }

    fn check(&self) -> Result<(), SourceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn query_published_pages(&self) -> Result<Vec<PageRecord>, SourceError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.pages.clone())
    }

    async fn fetch_page_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, SourceError> {
        self.slug_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .pages
            .iter()
            .find(|page| {
                page.property("Slug")
                    .and_then(|value| value.rich_text.first())
                    .is_some_and(|run| run.content() == slug)
            })
            .cloned())
    }

    async fn fetch_page_blocks(&self, page_id: &str) -> Result<Vec<ContentBlock>, SourceError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.blocks.get(page_id).cloned().unwrap_or_default())
    }
}

/// A published page record in the default workspace schema.
pub fn page(id: &str, title: &str, created: &str, views: f64, tags: &[&str]) -> PageRecord {
    let tags: Vec<_> = tags.iter().map(|tag| json!({ "name": tag })).collect();
    serde_json::from_value(json!({
        "id": id,
        "created_time": created,
        "properties": {
            "Content Title": { "type": "title", "title": [{ "plain_text": title }] },
            "Views": { "type": "number", "number": views },
            "Blog Category": { "type": "multi_select", "multi_select": tags },
            "Status": { "type": "status", "status": { "name": "Published" } }
        }
    }))
    .expect("page record")
}

pub fn with_slug(mut record: PageRecord, slug: &str) -> PageRecord {
    record.properties.insert(
        "Slug".to_string(),
        serde_json::from_value(json!({
            "type": "rich_text",
            "rich_text": [{ "plain_text": slug }]
        }))
        .expect("slug property"),
    );
    record
}

pub fn service(source: Arc<FakeSource>) -> BlogService {
    let mapper = ContentRecordMapper::new(PropertyNames::default(), Arc::new(WordsPerMinute::default()));
    BlogService::new(
        source,
        mapper,
        RelatedOptions {
            strategy: RelatedPostsStrategy::TagOverlap,
            count: 3,
            seed: Some(7),
        },
    )
}

/// Three posts: two sharing the `rust` tag, one duplicate title.
pub fn sample_source() -> FakeSource {
    FakeSource::with_pages(vec![
        page("p1", "Clean Architecture", "2024-01-10T00:00:00.000Z", 10.0, &["dotnet", "architecture"]),
        page("p2", "Async Rust", "2024-03-01T00:00:00.000Z", 50.0, &["rust", "async"]),
        page("p3", "Clean Architecture", "2024-02-01T00:00:00.000Z", 5.0, &["rust", "architecture"]),
    ])
    .blocks_for(
        "p2",
        vec![
            ContentBlock::heading("h1", 1, "Intro"),
            ContentBlock::paragraph("b1", "tokio runs futures"),
            ContentBlock::heading("h2", 2, "**Setup** steps"),
        ],
    )
}
