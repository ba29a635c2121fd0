//! Dataset similarity by shared concepts

use crate::error::Result;
use crate::hierarchy::ConceptHierarchyIndex;
use crate::neo4j::models::SimilarDataset;
use crate::neo4j::GraphStore;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Default number of similar datasets returned
pub const DEFAULT_SIMILAR_LIMIT: usize = 3;

/// Ranks datasets by how many concepts they share with a reference set
pub struct SimilarityRanker {
    neo4j: Arc<dyn GraphStore>,
    hierarchy: Arc<ConceptHierarchyIndex>,
}

impl SimilarityRanker {
    pub fn new(neo4j: Arc<dyn GraphStore>, hierarchy: Arc<ConceptHierarchyIndex>) -> Self {
        Self { neo4j, hierarchy }
    }

    /// Top `limit` datasets similar to the reference set
    pub async fn similar_to(
        &self,
        dataset_ids: &[String],
        application: &str,
        limit: usize,
        expand_hierarchy: bool,
    ) -> Result<Vec<SimilarDataset>> {
        let mut ranked = self.rank(dataset_ids, application, expand_hierarchy).await?;
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Full ranking: shared count descending, then dataset id ascending.
    ///
    /// Reference datasets never appear in their own ranking. With
    /// `expand_hierarchy`, a candidate tag also counts when it is an ancestor
    /// or descendant of a reference tag.
    pub async fn rank(
        &self,
        dataset_ids: &[String],
        application: &str,
        expand_hierarchy: bool,
    ) -> Result<Vec<SimilarDataset>> {
        let reference: BTreeSet<String> = dataset_ids.iter().cloned().collect();
        if reference.is_empty() {
            return Ok(Vec::new());
        }
        let reference_ids: Vec<String> = reference.iter().cloned().collect();

        let reference_concepts: BTreeSet<String> = self
            .neo4j
            .dataset_tag_rows(&reference_ids, application)
            .await?
            .into_iter()
            .map(|row| row.concept)
            .collect();
        if reference_concepts.is_empty() {
            return Ok(Vec::new());
        }
        let reference_concepts: Vec<String> = reference_concepts.into_iter().collect();

        let matchable: Vec<String> = if expand_hierarchy {
            self.hierarchy
                .related_within(&reference_concepts, self.hierarchy.ceiling())
                .await?
                .into_iter()
                .collect()
        } else {
            reference_concepts
        };

        let mut shared: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in self
            .neo4j
            .tag_rows_for_concepts(&matchable, application)
            .await?
        {
            if !reference.contains(&row.dataset) {
                shared.entry(row.dataset).or_default().insert(row.concept);
            }
        }

        let mut ranked: Vec<SimilarDataset> = shared
            .into_iter()
            .map(|(dataset, concepts)| SimilarDataset {
                dataset,
                count: concepts.len(),
                shared_concepts: concepts.into_iter().collect(),
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.dataset.cmp(&b.dataset)));

        tracing::debug!(
            reference = reference.len(),
            candidates = ranked.len(),
            expand_hierarchy,
            "Ranked similar datasets"
        );
        Ok(ranked)
    }
}
