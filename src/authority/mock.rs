//! In-memory mock of the Resource Authority for testing.

use super::traits::{AuthorityScope, ResourceAuthority};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Mock authority that confirms a fixed set of ids and records every request.
pub struct MockAuthority {
    pub visible: RwLock<HashSet<String>>,
    pub requests: RwLock<Vec<(Vec<String>, AuthorityScope)>>,
    pub fail: AtomicBool,
}

impl MockAuthority {
    /// Authority that knows about `visible` and nothing else
    pub fn new(visible: &[&str]) -> Self {
        Self {
            visible: RwLock::new(visible.iter().map(|s| s.to_string()).collect()),
            requests: RwLock::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Authority that fails every request
    pub fn failing() -> Self {
        let mock = Self::new(&[]);
        mock.fail.store(true, Ordering::SeqCst);
        mock
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl ResourceAuthority for MockAuthority {
    async fn filter_ids(&self, ids: &[String], scope: &AuthorityScope) -> Result<Vec<String>> {
        self.requests
            .write()
            .await
            .push((ids.to_vec(), scope.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::authority("mock authority unavailable"));
        }
        let visible = self.visible.read().await;
        // Answers in reverse request order
        Ok(ids
            .iter()
            .rev()
            .filter(|id| visible.contains(*id))
            .cloned()
            .collect())
    }
}
