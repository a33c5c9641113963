//! Request-scoped memoization of upstream fetches.
//!
//! A [`RequestCache`] is created for one request (or one CLI invocation),
//! passed down explicitly and dropped with it. Values are keyed by the call
//! arguments; concurrent callers for the same key share one in-flight fetch
//! and failures are never stored.

use std::{collections::HashMap, future::Future, hash::Hash, sync::Arc};

use metrics::counter;
use quire_content_types::PageRecord;
use tokio::sync::{Mutex, OnceCell};

use crate::domain::{blocks::ContentBlock, posts::Post};

/// Single-flight memo table.
pub struct Memo<K, V> {
    name: &'static str,
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cells: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(value) = cell.get() {
            counter!("quire_request_cache_hit_total", "memo" => self.name).increment(1);
            return Ok(value.clone());
        }

        counter!("quire_request_cache_miss_total", "memo" => self.name).increment(1);
        cell.get_or_try_init(init).await.cloned()
    }

    pub async fn len(&self) -> usize {
        self.cells
            .lock()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }
}

pub struct RequestCache {
    pub(crate) published: Memo<(), Arc<Vec<PageRecord>>>,
    pub(crate) by_slug: Memo<String, Option<PageRecord>>,
    pub(crate) blocks: Memo<String, Arc<Vec<ContentBlock>>>,
    pub(crate) posts: Memo<(), Arc<Vec<Post>>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self {
            published: Memo::new("published"),
            by_slug: Memo::new("by_slug"),
            blocks: Memo::new("blocks"),
            posts: Memo::new("posts"),
        }
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn memo_runs_init_once_per_key() {
        let memo: Memo<String, usize> = Memo::new("test");
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for _ in 0..3 {
            let value = memo
                .get_or_try_init("a".to_string(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::convert::Infallible>(7)
                })
                .await
                .expect("value");
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.len().await, 1);
    }

    #[tokio::test]
    async fn memo_does_not_store_failures() {
        let memo: Memo<(), usize> = Memo::new("test");

        let first = memo
            .get_or_try_init((), || async { Err::<usize, _>("boom") })
            .await;
        assert_eq!(first, Err("boom"));
        assert_eq!(memo.len().await, 0);

        let second = memo
            .get_or_try_init((), || async { Ok::<_, &str>(3) })
            .await;
        assert_eq!(second, Ok(3));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let memo: Memo<u8, u8> = Memo::new("test");
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<_, std::convert::Infallible>(1)
        };

        let (a, b) = tokio::join!(
            memo.get_or_try_init(9, fetch),
            memo.get_or_try_init(9, fetch)
        );
        assert_eq!((a.expect("a"), b.expect("b")), (1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
