//! Domain layer types and invariants.

pub mod blocks;
pub mod error;
pub mod posts;
pub mod reading_time;
pub mod slug;
pub mod toc;
pub mod types;
