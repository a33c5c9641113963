use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    application::{
        error::HttpError,
        filter,
        request_cache::RequestCache,
        seo::{PageMeta, SeoInput},
    },
    domain::types::SortOrder,
};

use super::{
    HttpState,
    models::{
        HealthResponse, ListingQuery, ListingResponse, PostDetailResponse, ToggleQuery,
        ToggleResponse,
    },
};

pub(super) async fn listing(
    State(state): State<HttpState>,
    Query(params): Query<ListingQuery>,
) -> Result<Json<ListingResponse>, HttpError> {
    let sort = match params.sort.as_deref().filter(|sort| !sort.is_empty()) {
        Some(raw) => SortOrder::from_str(raw)?,
        None => state.default_sort,
    };
    let query = params.q.unwrap_or_default();

    let cache = RequestCache::new();
    let listing = state.blog.listing(&cache, &query, sort).await?;

    let meta = PageMeta::build(
        &state.site,
        &SeoInput {
            template_title: Some("Blog".to_string()),
            pathname: "/blog".to_string(),
            ..SeoInput::default()
        },
    );

    Ok(Json(ListingResponse {
        listing,
        meta: meta.into(),
    }))
}

pub(super) async fn post_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Json<PostDetailResponse>, HttpError> {
    let cache = RequestCache::new();
    let detail = state.blog.post_detail(&cache, &slug).await?;

    let post = &detail.post;
    let meta = PageMeta::build(
        &state.site,
        &SeoInput {
            template_title: Some(post.title.clone()),
            description: Some(post.description.clone()),
            pathname: format!("/blog/{}", post.slug),
            date: Some(post.published_at),
            is_blog: true,
            banner: Some(post.banner.clone()),
            tags: post.tags.clone(),
            ..SeoInput::default()
        },
    );

    Ok(Json(PostDetailResponse::new(detail, meta)))
}

pub(super) async fn toggle_tag(
    Query(params): Query<ToggleQuery>,
) -> Result<Json<ToggleResponse>, HttpError> {
    let tag = params
        .tag
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .ok_or_else(|| {
            HttpError::new(
                "infra::http::blog::toggle_tag",
                StatusCode::BAD_REQUEST,
                "Missing tag",
                "query parameter `tag` is required",
            )
        })?;

    let query = filter::toggle_tag(params.q.as_deref().unwrap_or_default(), &tag);
    let active = filter::is_tag_active(&query, &tag);

    Ok(Json(ToggleResponse { query, tag, active }))
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
