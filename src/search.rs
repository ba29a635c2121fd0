//! Dataset search over concept groups, concept listing and label search

use crate::error::{Error, Result};
use crate::hierarchy::ConceptHierarchyIndex;
use crate::neo4j::models::{Concept, ConceptFilter, ConceptSummary};
use crate::neo4j::GraphStore;
use std::sync::Arc;

/// Most concept groups a single search may carry
pub const MAX_CONCEPT_GROUPS: usize = 3;

/// Evaluates concept-group searches against the tagging graph.
///
/// Concepts inside a group are ORed (with their descendants), groups are
/// ANDed: each group only narrows the candidates left by the previous one.
pub struct SearchEngine {
    neo4j: Arc<dyn GraphStore>,
    hierarchy: Arc<ConceptHierarchyIndex>,
}

impl SearchEngine {
    pub fn new(neo4j: Arc<dyn GraphStore>, hierarchy: Arc<ConceptHierarchyIndex>) -> Self {
        Self { neo4j, hierarchy }
    }

    /// Dataset ids matching every group, sorted and deduplicated.
    ///
    /// No groups yields nothing; there is no implicit match-all.
    pub async fn search(
        &self,
        groups: &[Vec<String>],
        application: &str,
        depth: u32,
    ) -> Result<Vec<String>> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        if groups.len() > MAX_CONCEPT_GROUPS {
            return Err(Error::invalid(format!(
                "at most {} concept groups are supported, got {}",
                MAX_CONCEPT_GROUPS,
                groups.len()
            )));
        }
        if let Some(i) = groups
            .iter()
            .position(|g| g.iter().all(|c| c.trim().is_empty()))
        {
            return Err(Error::invalid(format!("concept group {} is empty", i + 1)));
        }

        let mut candidates: Option<Vec<String>> = None;
        for (i, group) in groups.iter().enumerate() {
            let seeds: Vec<String> = group
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            let expanded: Vec<String> = self
                .hierarchy
                .descendants_of(&seeds, depth)
                .await?
                .into_iter()
                .collect();

            let matched = self
                .neo4j
                .datasets_tagged_with(&expanded, application, candidates.as_deref())
                .await?;
            tracing::debug!(
                group = i + 1,
                concepts = expanded.len(),
                matched = matched.len(),
                "Evaluated concept group"
            );
            if matched.is_empty() {
                return Ok(Vec::new());
            }
            candidates = Some(matched);
        }

        let mut result = candidates.unwrap_or_default();
        result.sort();
        result.dedup();
        Ok(result)
    }

    /// Every concept with its tagged datasets for `application`
    pub async fn list_concepts(
        &self,
        application: &str,
        filter: ConceptFilter,
    ) -> Result<Vec<ConceptSummary>> {
        let filter = filter.normalized();
        let mut summaries = self.neo4j.list_concepts(application, &filter).await?;
        summaries.sort_by(|a, b| {
            b.number_of_datasets_tagged
                .cmp(&a.number_of_datasets_tagged)
                .then_with(|| a.concept.id.cmp(&b.concept.id))
        });
        Ok(summaries)
    }

    /// Datasets tagged with a concept whose label or synonym contains any term
    pub async fn search_by_label(&self, terms: &[String], application: &str) -> Result<Vec<String>> {
        let terms: Vec<String> = terms
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(Error::invalid("at least one search term is required"));
        }
        let mut ids = self.neo4j.datasets_matching_terms(&terms, application).await?;
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Seeds plus every ancestor concept, sorted by id
    pub async fn concepts_inferred(&self, concept_ids: &[String]) -> Result<Vec<Concept>> {
        if concept_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.hierarchy.ancestors_of(concept_ids).await
    }
}
