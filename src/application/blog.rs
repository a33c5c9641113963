//! Blog read service: listings and post detail pages.

use std::sync::Arc;

use futures::future::try_join_all;
use quire_content_types::PageRecord;
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    application::{
        content::{ContentSource, SourceError},
        filter::{self, TagChip},
        mapper::ContentRecordMapper,
        related::select_related,
        request_cache::RequestCache,
    },
    domain::{
        blocks::{ContentBlock, body_text},
        posts::Post,
        slug::SlugRegistry,
        toc::{HeadingEntry, build_table_of_contents, min_level},
        types::{RelatedPostsStrategy, SortOrder},
    },
};

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("no published post has slug `{slug}`")]
    NotFound { slug: String },
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone, Copy)]
pub struct RelatedOptions {
    pub strategy: RelatedPostsStrategy,
    pub count: usize,
    /// Fixed seed for the random sampler; entropy-seeded when `None`.
    pub seed: Option<u64>,
}

impl Default for RelatedOptions {
    fn default() -> Self {
        Self {
            strategy: RelatedPostsStrategy::default(),
            count: 3,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogListing {
    pub query: String,
    pub sort: SortOrder,
    pub total: usize,
    pub posts: Vec<Post>,
    pub tags: Vec<TagChip>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub blocks: Vec<ContentBlock>,
    pub toc: Vec<HeadingEntry>,
    pub min_level: u8,
    pub related: Vec<Post>,
}

#[derive(Clone)]
pub struct BlogService {
    source: Arc<dyn ContentSource>,
    mapper: ContentRecordMapper,
    related: RelatedOptions,
}

impl BlogService {
    pub fn new(
        source: Arc<dyn ContentSource>,
        mapper: ContentRecordMapper,
        related: RelatedOptions,
    ) -> Self {
        Self {
            source,
            mapper,
            related,
        }
    }

    #[instrument(skip(self, cache))]
    pub async fn listing(
        &self,
        cache: &RequestCache,
        query: &str,
        sort: SortOrder,
    ) -> Result<BlogListing, BlogError> {
        let posts = self.posts(cache).await?;
        let filtered = filter::apply(&posts, query, sort);
        let tags = filter::tag_chips(&posts, &filtered, query);

        debug!(total = posts.len(), matched = filtered.len(), "built blog listing");

        Ok(BlogListing {
            query: query.to_string(),
            sort,
            total: posts.len(),
            posts: filtered,
            tags,
        })
    }

    #[instrument(skip(self, cache))]
    pub async fn post_detail(
        &self,
        cache: &RequestCache,
        slug: &str,
    ) -> Result<PostDetail, BlogError> {
        let (direct, posts) = tokio::try_join!(self.lookup_slug(cache, slug), self.posts(cache))?;

        // Listing slugs are the routing keys; a direct hit only counts when
        // its assigned slug is the one requested.
        let direct = match direct {
            Some(record) => match posts.iter().find(|post| post.id == record.id) {
                Some(post) => (post.slug == slug).then(|| post.clone()),
                None => {
                    let blocks = self.page_blocks(cache, &record.id).await?;
                    let post = self.mapper.map(&record, &body_text(&blocks));
                    (post.slug == slug).then_some(post)
                }
            },
            None => None,
        };
        let post = match direct {
            Some(post) => post,
            None => posts
                .iter()
                .find(|post| post.slug == slug)
                .cloned()
                .ok_or_else(|| BlogError::NotFound {
                    slug: slug.to_string(),
                })?,
        };

        let blocks = self.page_blocks(cache, &post.id).await?;
        let toc = build_table_of_contents(&blocks);
        let min_level = min_level(&toc);

        let mut rng = match self.related.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let related = select_related(
            self.related.strategy,
            &posts,
            &post.slug,
            &post.tags,
            self.related.count,
            &mut rng,
        );

        Ok(PostDetail {
            post,
            blocks: blocks.as_ref().clone(),
            toc,
            min_level,
            related,
        })
    }

    /// Every published post, mapped, with collision-free slugs in source order.
    pub async fn posts(&self, cache: &RequestCache) -> Result<Arc<Vec<Post>>, BlogError> {
        let posts = cache
            .posts
            .get_or_try_init((), || self.load_posts(cache))
            .await?;
        Ok(posts)
    }

    async fn load_posts(&self, cache: &RequestCache) -> Result<Arc<Vec<Post>>, SourceError> {
        let records = cache
            .published
            .get_or_try_init((), || async {
                self.source.query_published_pages().await.map(Arc::new)
            })
            .await?;

        let bodies = try_join_all(records.iter().map(|record| async move {
            let blocks = self.fetch_blocks(cache, &record.id).await?;
            Ok::<_, SourceError>(body_text(&blocks))
        }))
        .await?;

        let mut registry = SlugRegistry::new();
        let posts = records
            .iter()
            .zip(bodies)
            .map(|(record, body)| {
                let mut post = self.mapper.map(record, &body);
                post.slug = registry.claim(&post.slug);
                post
            })
            .collect();

        Ok(Arc::new(posts))
    }

    async fn lookup_slug(
        &self,
        cache: &RequestCache,
        slug: &str,
    ) -> Result<Option<PageRecord>, BlogError> {
        let record = cache
            .by_slug
            .get_or_try_init(slug.to_string(), || self.source.fetch_page_by_slug(slug))
            .await?;
        Ok(record)
    }

    async fn page_blocks(
        &self,
        cache: &RequestCache,
        page_id: &str,
    ) -> Result<Arc<Vec<ContentBlock>>, BlogError> {
        Ok(self.fetch_blocks(cache, page_id).await?)
    }

    async fn fetch_blocks(
        &self,
        cache: &RequestCache,
        page_id: &str,
    ) -> Result<Arc<Vec<ContentBlock>>, SourceError> {
        cache
            .blocks
            .get_or_try_init(page_id.to_string(), || async {
                self.source.fetch_page_blocks(page_id).await.map(Arc::new)
            })
            .await
    }
}
