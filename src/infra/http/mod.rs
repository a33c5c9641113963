//! JSON read API over the blog service.

mod blog;
mod middleware;
pub mod models;

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::{
    application::{blog::BlogService, seo::SiteMeta},
    domain::types::SortOrder,
};

pub use middleware::{REQUEST_ID_HEADER, RequestContext};

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub site: Arc<SiteMeta>,
    pub default_sort: SortOrder,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/blog", get(blog::listing))
        .route("/blog/tags/toggle", get(blog::toggle_tag))
        .route("/blog/{slug}", get(blog::post_detail))
        .route("/_health", get(blog::health))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
