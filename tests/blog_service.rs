mod support;

use std::sync::{Arc, atomic::Ordering};

use quire::{
    application::{blog::BlogError, request_cache::RequestCache},
    domain::types::SortOrder,
};

use support::{FakeSource, page, sample_source, service, with_slug};

fn slugs(posts: &[quire::domain::posts::Post]) -> Vec<&str> {
    posts.iter().map(|post| post.slug.as_str()).collect()
}

#[tokio::test]
async fn listing_sorts_by_date_and_dedupes_slugs() {
    let source = Arc::new(sample_source());
    let blog = service(source.clone());
    let cache = RequestCache::new();

    let listing = blog.listing(&cache, "", SortOrder::Date).await.expect("listing");

    assert_eq!(listing.total, 3);
    assert_eq!(
        slugs(&listing.posts),
        vec!["async-rust", "clean-architecture-2", "clean-architecture"]
    );
    assert_eq!(listing.tags[0].name, "architecture");
}

#[tokio::test]
async fn listing_filters_by_every_tag_and_flags_chips() {
    let blog = service(Arc::new(sample_source()));
    let cache = RequestCache::new();

    let listing = blog
        .listing(&cache, "rust architecture", SortOrder::Views)
        .await
        .expect("listing");

    assert_eq!(slugs(&listing.posts), vec!["clean-architecture-2"]);
    let dotnet = listing
        .tags
        .iter()
        .find(|chip| chip.name == "dotnet")
        .expect("dotnet chip");
    assert!(dotnet.disabled);
    let rust = listing.tags.iter().find(|chip| chip.name == "rust").expect("rust chip");
    assert!(rust.active);
}

#[tokio::test]
async fn request_cache_deduplicates_upstream_fetches() {
    let source = Arc::new(sample_source());
    let blog = service(source.clone());
    let cache = RequestCache::new();

    blog.listing(&cache, "", SortOrder::Date).await.expect("first");
    blog.listing(&cache, "rust", SortOrder::Views).await.expect("second");
    blog.post_detail(&cache, "async-rust").await.expect("detail");

    assert_eq!(source.query_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.block_calls.load(Ordering::SeqCst), 3);

    let fresh = RequestCache::new();
    blog.listing(&fresh, "", SortOrder::Date).await.expect("fresh request");
    assert_eq!(source.query_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn detail_builds_outline_and_related_posts() {
    let blog = service(Arc::new(sample_source()));
    let cache = RequestCache::new();

    let detail = blog.post_detail(&cache, "async-rust").await.expect("detail");

    assert_eq!(detail.post.title, "Async Rust");
    assert_eq!(detail.post.reading_time.words, 6);
    assert_eq!(detail.toc.len(), 2);
    assert_eq!(detail.toc[0].id, "intro");
    assert_eq!(detail.toc[1].id, "**setup**-steps");
    assert_eq!(detail.min_level, 1);
    assert_eq!(slugs(&detail.related), vec!["clean-architecture-2"]);
}

#[tokio::test]
async fn detail_prefers_explicit_slug_lookup() {
    let source = Arc::new(FakeSource::with_pages(vec![
        with_slug(
            page("p9", "Anything", "2024-01-01T00:00:00.000Z", 0.0, &[]),
            "hand-picked",
        ),
        page("p8", "Other", "2024-01-02T00:00:00.000Z", 0.0, &[]),
    ]));
    let blog = service(source.clone());
    let cache = RequestCache::new();

    let detail = blog.post_detail(&cache, "hand-picked").await.expect("detail");

    assert_eq!(detail.post.id, "p9");
    assert_eq!(detail.post.slug, "hand-picked");
    assert_eq!(source.slug_calls.load(Ordering::SeqCst), 1);
    assert_eq!(slugs(&detail.related), vec!["other"]);
}

#[tokio::test]
async fn detail_follows_listing_slugs_when_explicit_slug_collides() {
    let source = Arc::new(FakeSource::with_pages(vec![
        page("pa", "Clean Architecture", "2024-01-01T00:00:00.000Z", 0.0, &[]),
        with_slug(
            page("pb", "Other Title", "2024-01-02T00:00:00.000Z", 0.0, &[]),
            "clean-architecture",
        ),
    ]));
    let blog = service(source);
    let cache = RequestCache::new();

    let listing = blog.listing(&cache, "", SortOrder::Date).await.expect("listing");
    let assigned: Vec<(&str, &str)> = listing
        .posts
        .iter()
        .map(|post| (post.id.as_str(), post.slug.as_str()))
        .collect();
    assert!(assigned.contains(&("pa", "clean-architecture")));
    assert!(assigned.contains(&("pb", "clean-architecture-2")));

    let first = blog
        .post_detail(&cache, "clean-architecture")
        .await
        .expect("first detail");
    assert_eq!(first.post.id, "pa");
    assert_eq!(first.post.slug, "clean-architecture");

    let second = blog
        .post_detail(&cache, "clean-architecture-2")
        .await
        .expect("second detail");
    assert_eq!(second.post.id, "pb");
    assert_eq!(second.post.slug, "clean-architecture-2");
}

#[tokio::test]
async fn unknown_slug_is_not_found() {
    let blog = service(Arc::new(sample_source()));
    let cache = RequestCache::new();

    let err = blog.post_detail(&cache, "missing").await.expect_err("missing post");
    assert!(matches!(err, BlogError::NotFound { slug } if slug == "missing"));
}

#[tokio::test]
async fn upstream_failure_propagates_and_is_not_cached() {
    let source = Arc::new(sample_source());
    source.failing.store(true, Ordering::SeqCst);
    let blog = service(source.clone());
    let cache = RequestCache::new();

    let err = blog.listing(&cache, "", SortOrder::Date).await.expect_err("failure");
    assert!(matches!(err, BlogError::Source(_)));

    source.failing.store(false, Ordering::SeqCst);
    let listing = blog.listing(&cache, "", SortOrder::Date).await.expect("recovered");
    assert_eq!(listing.total, 3);
    assert_eq!(source.query_calls.load(Ordering::SeqCst), 2);
}
