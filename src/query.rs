//! Boundary pipelines: application default, graph read, authority filter

use crate::authority::AuthorityScope;
use crate::counters::{CounterService, PopularitySort};
use crate::error::Result;
use crate::filter::{Page, ResultFilter};
use crate::neo4j::models::{Concept, ConceptFilter, ConceptSummary, DatasetCount, SimilarDataset};
use crate::search::SearchEngine;
use crate::similarity::SimilarityRanker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A dataset search as it arrives at the boundary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Up to three concept groups (OR inside a group, AND across groups)
    pub groups: Vec<Vec<String>>,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    /// Optional popularity sort applied to the hits, e.g. `-most-viewed`
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Page,
}

/// Settings the pipelines fall back on when a request leaves them out
#[derive(Debug, Clone)]
pub struct QueryDefaults {
    pub application: String,
    pub depth: u32,
    pub similar_limit: usize,
}

/// Runs read components and pipes every dataset-returning result through
/// the [`ResultFilter`] before it leaves the crate.
pub struct QueryService {
    search: Arc<SearchEngine>,
    similarity: Arc<SimilarityRanker>,
    counters: Arc<CounterService>,
    filter: Arc<ResultFilter>,
    defaults: QueryDefaults,
}

impl QueryService {
    pub fn new(
        search: Arc<SearchEngine>,
        similarity: Arc<SimilarityRanker>,
        counters: Arc<CounterService>,
        filter: Arc<ResultFilter>,
        defaults: QueryDefaults,
    ) -> Self {
        Self {
            search,
            similarity,
            counters,
            filter,
            defaults,
        }
    }

    /// Resolve an optional application against the configured default
    pub fn application<'a>(&'a self, application: Option<&'a str>) -> &'a str {
        application
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(self.defaults.application.as_str())
    }

    /// Concept-group search, optionally sorted by popularity, then filtered and paged
    pub async fn search_datasets(
        &self,
        request: &SearchRequest,
        scope: &AuthorityScope,
    ) -> Result<Vec<String>> {
        let sort = request
            .sort
            .as_deref()
            .map(str::parse::<PopularitySort>)
            .transpose()?;
        let application = self.application(request.application.as_deref());
        let depth = request.depth.unwrap_or(self.defaults.depth);

        let mut hits = self
            .search
            .search(&request.groups, application, depth)
            .await?;
        if let Some(sort) = sort {
            hits = self
                .counters
                .sort_by_popularity(sort, Some(hits.as_slice()))
                .await?;
        }

        let visible = self.filter.filter(&hits, scope).await?;
        Ok(ResultFilter::paginate(visible, request.page))
    }

    /// Dataset ids ranked by a sort expression such as `-most-viewed`
    pub async fn sorted_datasets(
        &self,
        sort: &str,
        restrict_to: Option<&[String]>,
        scope: &AuthorityScope,
    ) -> Result<Vec<String>> {
        let sort: PopularitySort = sort.parse()?;
        let ranked = self.counters.sort_by_popularity(sort, restrict_to).await?;
        self.filter.filter(&ranked, scope).await
    }

    /// Datasets tagged with a concept whose label or synonym matches a term
    pub async fn search_by_label(
        &self,
        terms: &[String],
        application: Option<&str>,
        scope: &AuthorityScope,
    ) -> Result<Vec<String>> {
        let hits = self
            .search
            .search_by_label(terms, self.application(application))
            .await?;
        self.filter.filter(&hits, scope).await
    }

    /// Similar datasets; authority filtering happens before the limit is applied
    pub async fn similar_datasets(
        &self,
        dataset_ids: &[String],
        application: Option<&str>,
        limit: Option<usize>,
        expand_hierarchy: bool,
        scope: &AuthorityScope,
    ) -> Result<Vec<SimilarDataset>> {
        let ranked = self
            .similarity
            .rank(dataset_ids, self.application(application), expand_hierarchy)
            .await?;
        let mut visible = self
            .filter
            .retain_visible(ranked, |s| s.dataset.as_str(), scope)
            .await?;
        visible.truncate(limit.unwrap_or(self.defaults.similar_limit));
        Ok(visible)
    }

    pub async fn most_liked(
        &self,
        application: Option<&str>,
        scope: &AuthorityScope,
    ) -> Result<Vec<DatasetCount>> {
        let counts = self
            .counters
            .most_liked(self.application(application))
            .await?;
        self.visible_counts(counts, scope).await
    }

    pub async fn most_viewed(
        &self,
        application: Option<&str>,
        scope: &AuthorityScope,
    ) -> Result<Vec<DatasetCount>> {
        let counts = self
            .counters
            .most_viewed(self.application(application))
            .await?;
        self.visible_counts(counts, scope).await
    }

    pub async fn most_viewed_by(
        &self,
        user_id: &str,
        application: Option<&str>,
        scope: &AuthorityScope,
    ) -> Result<Vec<DatasetCount>> {
        let counts = self
            .counters
            .most_viewed_by(user_id, self.application(application))
            .await?;
        self.visible_counts(counts, scope).await
    }

    /// Concept listing; concepts are not authority-managed
    pub async fn concepts(
        &self,
        application: Option<&str>,
        filter: ConceptFilter,
    ) -> Result<Vec<ConceptSummary>> {
        self.search
            .list_concepts(self.application(application), filter)
            .await
    }

    pub async fn inferred_concepts(&self, concept_ids: &[String]) -> Result<Vec<Concept>> {
        self.search.concepts_inferred(concept_ids).await
    }

    async fn visible_counts(
        &self,
        counts: Vec<DatasetCount>,
        scope: &AuthorityScope,
    ) -> Result<Vec<DatasetCount>> {
        self.filter
            .retain_visible(counts, |c| c.dataset.as_str(), scope)
            .await
    }
}
