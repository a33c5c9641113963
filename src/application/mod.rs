//! Application services layer.

pub mod blog;
pub mod content;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod related;
pub mod request_cache;
pub mod scroll_spy;
pub mod seo;
