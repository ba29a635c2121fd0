//! Reconciles graph results with the Resource Authority

use crate::authority::{AuthorityScope, ResourceAuthority};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Offset/limit window applied after filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Page {
    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }
}

/// Drops ids the authority does not confirm, keeping input order
pub struct ResultFilter {
    authority: Arc<dyn ResourceAuthority>,
}

impl ResultFilter {
    pub fn new(authority: Arc<dyn ResourceAuthority>) -> Self {
        Self { authority }
    }

    /// Candidates the authority confirms, in their original order.
    ///
    /// An empty list never reaches the authority. A failed authority call
    /// fails the whole filter; unfiltered ids are never returned.
    pub async fn filter(&self, candidates: &[String], scope: &AuthorityScope) -> Result<Vec<String>> {
        self.retain_visible(candidates.to_vec(), |id| id.as_str(), scope)
            .await
    }

    /// Keep the items whose id the authority confirms, in their original order
    pub async fn retain_visible<T, F>(
        &self,
        items: Vec<T>,
        id_of: F,
        scope: &AuthorityScope,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&T) -> &str + Send,
    {
        if items.is_empty() {
            return Ok(items);
        }

        let ids: Vec<String> = items.iter().map(|item| id_of(item).to_string()).collect();
        let visible: HashSet<String> = self
            .authority
            .filter_ids(&ids, scope)
            .await?
            .into_iter()
            .collect();

        let before = items.len();
        let kept: Vec<T> = items
            .into_iter()
            .filter(|item| visible.contains(id_of(item)))
            .collect();
        tracing::debug!(before, after = kept.len(), "Filtered through resource authority");
        Ok(kept)
    }

    /// Apply an offset/limit window
    pub fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
        let window = items.into_iter().skip(page.offset);
        match page.limit {
            Some(limit) => window.take(limit).collect(),
            None => window.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::mock::MockAuthority;
    use crate::error::ErrorKind;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_filter_preserves_input_order() {
        let authority = Arc::new(MockAuthority::new(&["d5", "d1", "d3"]));
        let filter = ResultFilter::new(authority.clone());

        let kept = filter
            .filter(&ids(&["d5", "d4", "d3", "d2", "d1"]), &AuthorityScope::new())
            .await
            .unwrap();

        // The mock answers in reverse order; the input order must win
        assert_eq!(kept, ids(&["d5", "d3", "d1"]));
        assert_eq!(authority.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_input_skips_authority() {
        let authority = Arc::new(MockAuthority::new(&["d1"]));
        let filter = ResultFilter::new(authority.clone());
        assert!(filter
            .filter(&[], &AuthorityScope::new())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(authority.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_scope_is_forwarded() {
        let authority = Arc::new(MockAuthority::new(&["d1"]));
        let filter = ResultFilter::new(authority.clone());
        let scope = AuthorityScope::new().with("published", "true");

        filter.filter(&ids(&["d1"]), &scope).await.unwrap();

        let requests = authority.requests.read().await;
        assert_eq!(requests[0].1.get("published"), Some("true"));
    }

    #[tokio::test]
    async fn test_authority_failure_is_an_error_not_unfiltered_ids() {
        let filter = ResultFilter::new(Arc::new(MockAuthority::failing()));
        let err = filter
            .filter(&ids(&["d1", "d2"]), &AuthorityScope::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn test_retain_visible_keeps_pairs() {
        let filter = ResultFilter::new(Arc::new(MockAuthority::new(&["b"])));
        let pairs = vec![("a".to_string(), 3), ("b".to_string(), 2)];
        let kept = filter
            .retain_visible(pairs, |(id, _)| id.as_str(), &AuthorityScope::new())
            .await
            .unwrap();
        assert_eq!(kept, vec![("b".to_string(), 2)]);
    }

    #[test]
    fn test_paginate() {
        let all = ids(&["a", "b", "c", "d"]);
        assert_eq!(
            ResultFilter::paginate(all.clone(), Page::new(1, Some(2))),
            ids(&["b", "c"])
        );
        assert_eq!(ResultFilter::paginate(all.clone(), Page::default()), all);
        assert!(ResultFilter::paginate(all, Page::new(10, None)).is_empty());
    }
}
