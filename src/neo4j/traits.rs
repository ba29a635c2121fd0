//! GraphStore trait definition
//!
//! Defines the abstract interface for all Neo4j graph operations.
//! This trait mirrors the public async methods of `Neo4jClient`,
//! enabling testing with mock implementations and future backend swaps.
//!
//! Every method is a single round trip. Multi-hop logic (hierarchy closures,
//! progressive search, similarity scoring) lives in the components above, so
//! traversal bounds are enforced in Rust rather than delegated to the store.

use crate::error::Result;
use crate::neo4j::models::*;
use async_trait::async_trait;

/// Abstract interface for all graph database operations.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ========================================================================
    // Resource nodes
    // ========================================================================

    /// Check whether a resource node exists
    async fn resource_exists(&self, resource: &ResourceRef) -> Result<bool>;

    /// Merge a DATASET node, initialising `views` to 0 on creation
    async fn merge_dataset(&self, id: &str) -> Result<()>;

    /// Merge `child` and a BELONGS_TO edge to `parent`.
    /// Returns false (and writes nothing) when the parent does not exist.
    async fn merge_child(&self, child: &ResourceRef, parent: &ResourceRef) -> Result<bool>;

    /// Delete a resource and every node reaching it through BELONGS_TO
    /// within `max_depth` hops. Returns the number of nodes deleted.
    async fn delete_resource_tree(&self, resource: &ResourceRef, max_depth: u32) -> Result<u64>;

    // ========================================================================
    // Tag and favourite edges
    // ========================================================================

    /// Merge the concept (if absent) and a TAGGED_WITH edge for `application`
    async fn merge_tag(&self, resource: &ResourceRef, concept_id: &str, application: &str)
        -> Result<()>;

    /// Delete TAGGED_WITH edges of a resource, for one application or all
    async fn delete_tags(&self, resource: &ResourceRef, application: Option<&str>) -> Result<()>;

    /// Concept ids a resource is tagged with, for one application or all
    async fn resource_tags(
        &self,
        resource: &ResourceRef,
        application: Option<&str>,
    ) -> Result<Vec<String>>;

    /// Merge the user (if absent) and a FAVOURITE edge for `application`
    async fn merge_favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()>;

    /// Delete the FAVOURITE edge for `application`
    async fn delete_favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()>;

    // ========================================================================
    // Concepts and hierarchy
    // ========================================================================

    /// Merge a concept node with its label, synonyms and category labels
    async fn merge_concept(&self, concept: &Concept) -> Result<()>;

    /// Merge a hierarchy edge child -[relation]-> parent (both concepts merged)
    async fn merge_hierarchy_edge(
        &self,
        child: &str,
        parent: &str,
        relation: HierarchyRelation,
    ) -> Result<()>;

    /// Fetch concepts by id; unknown ids are skipped
    async fn get_concepts(&self, ids: &[String]) -> Result<Vec<Concept>>;

    /// One-hop outward edges (child → parent) from any of `ids`
    async fn parent_edges(&self, ids: &[String]) -> Result<Vec<HierarchyEdge>>;

    /// One-hop inward edges (parent ← child) into any of `ids`
    async fn child_edges(&self, ids: &[String]) -> Result<Vec<HierarchyEdge>>;

    /// All concepts accepted by `filter` with their tagged datasets for `application`
    async fn list_concepts(
        &self,
        application: &str,
        filter: &ConceptFilter,
    ) -> Result<Vec<ConceptSummary>>;

    // ========================================================================
    // Tag queries
    // ========================================================================

    /// Distinct datasets tagged for `application` with any of `concept_ids`,
    /// optionally restricted to the `within` candidate set
    async fn datasets_tagged_with(
        &self,
        concept_ids: &[String],
        application: &str,
        within: Option<&[String]>,
    ) -> Result<Vec<String>>;

    /// Tag rows of the given datasets for `application`
    async fn dataset_tag_rows(&self, dataset_ids: &[String], application: &str)
        -> Result<Vec<TagRow>>;

    /// Tag rows of any dataset tagged with one of `concept_ids` for `application`
    async fn tag_rows_for_concepts(
        &self,
        concept_ids: &[String],
        application: &str,
    ) -> Result<Vec<TagRow>>;

    /// Distinct datasets tagged for `application` with a concept whose label
    /// or synonym contains any of `terms`, case-insensitively
    async fn datasets_matching_terms(&self, terms: &[String], application: &str)
        -> Result<Vec<String>>;

    // ========================================================================
    // Counters
    // ========================================================================

    /// Increment a dataset's `views`. Returns false if the dataset is missing.
    async fn increment_dataset_views(&self, dataset_id: &str) -> Result<bool>;

    /// Upsert the user's VIEWED edge (1 on create, +1 on match), merging the
    /// user. Returns false if the dataset is missing.
    async fn record_user_view(&self, dataset_id: &str, user_id: &str) -> Result<bool>;

    /// Current `views` of a dataset
    async fn dataset_views(&self, dataset_id: &str) -> Result<Option<i64>>;

    /// Current `views` on the user's VIEWED edge to a dataset
    async fn user_dataset_views(&self, user_id: &str, dataset_id: &str) -> Result<Option<i64>>;

    /// Datasets with at least one favourite for `application`, with counts
    async fn favourite_counts(&self, application: &str) -> Result<Vec<DatasetCount>>;

    /// Every dataset (or those in `within`) with its favourite count across
    /// all applications, zero included
    async fn favourite_totals(&self, within: Option<&[String]>) -> Result<Vec<DatasetCount>>;

    /// Every dataset (or those in `within`) with its `views`
    async fn view_counts(&self, within: Option<&[String]>) -> Result<Vec<DatasetCount>>;

    /// Datasets viewed by a user with the per-user view count
    async fn user_view_counts(&self, user_id: &str) -> Result<Vec<DatasetCount>>;
}
