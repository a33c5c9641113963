use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request, Uri},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::{error, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const DETAIL_ROUTE: &str = "/blog/{slug}";
const UNMATCHED_ROUTE: &str = "unmatched";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// Route template the router matched, e.g. `/blog/{slug}`.
    pub route: String,
}

/// Blog-specific inputs of a request, recorded on failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogTarget {
    pub slug: Option<String>,
    pub query: Option<String>,
    pub sort: Option<String>,
    pub tag: Option<String>,
}

impl BlogTarget {
    pub fn from_uri(route: &str, uri: &Uri) -> Self {
        let mut target = Self {
            slug: (route == DETAIL_ROUTE)
                .then(|| uri.path().rsplit('/').next().map(str::to_string))
                .flatten(),
            ..Self::default()
        };

        let pairs = form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes());
        for (key, value) in pairs {
            let value = Some(value.into_owned()).filter(|value| !value.is_empty());
            match key.as_ref() {
                "q" => target.query = value,
                "sort" => target.sort = value,
                "tag" => target.tag = value,
                _ => {}
            }
        }
        target
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
    let ctx = RequestContext {
        request_id: request_id.clone(),
        route,
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| RequestContext {
            request_id: String::new(),
            route: UNMATCHED_ROUTE.to_string(),
        });
    let target = BlogTarget::from_uri(&ctx.route, request.uri());

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    counter!(
        "quire_http_error_total",
        "route" => ctx.route.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    let elapsed_ms = start.elapsed().as_millis();
    let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());
    let slug = target.slug.as_deref().unwrap_or("");
    let query = target.query.as_deref().unwrap_or("");
    let sort = target.sort.as_deref().unwrap_or("");
    let tag = target.tag.as_deref().unwrap_or("");

    if status.is_server_error() {
        error!(
            target: "quire::http::response",
            status = status.as_u16(),
            route = %ctx.route,
            slug,
            query,
            sort,
            elapsed_ms,
            source,
            detail = %detail,
            chain = ?messages,
            request_id = %ctx.request_id,
            "blog request failed upstream",
        );
    } else {
        warn!(
            target: "quire::http::response",
            status = status.as_u16(),
            route = %ctx.route,
            slug,
            query,
            sort,
            tag,
            elapsed_ms,
            source,
            detail = %detail,
            request_id = %ctx.request_id,
            "blog request rejected",
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_route_records_slug() {
        let uri: Uri = "/blog/clean-architecture".parse().expect("uri");
        let target = BlogTarget::from_uri(DETAIL_ROUTE, &uri);

        assert_eq!(target.slug.as_deref(), Some("clean-architecture"));
        assert!(target.sort.is_none());
    }

    #[test]
    fn listing_route_records_query_sort_and_tag() {
        let uri: Uri = "/blog?q=rust%20web&sort=popular&tag=&other=1"
            .parse()
            .expect("uri");
        let target = BlogTarget::from_uri("/blog", &uri);

        assert_eq!(
            target,
            BlogTarget {
                slug: None,
                query: Some("rust web".to_string()),
                sort: Some("popular".to_string()),
                tag: None,
            }
        );
    }

    #[test]
    fn unmatched_routes_never_claim_a_slug() {
        let uri: Uri = "/nowhere/at-all".parse().expect("uri");
        assert!(BlogTarget::from_uri(UNMATCHED_ROUTE, &uri).slug.is_none());
    }
}
