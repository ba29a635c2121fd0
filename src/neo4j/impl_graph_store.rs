//! `GraphStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;

use super::client::Neo4jClient;
use super::models::*;
use super::traits::GraphStore;
use crate::error::Result;

#[async_trait]
impl GraphStore for Neo4jClient {
    // ========================================================================
    // Resource nodes
    // ========================================================================

    async fn resource_exists(&self, resource: &ResourceRef) -> Result<bool> {
        self.resource_exists(resource).await
    }

    async fn merge_dataset(&self, id: &str) -> Result<()> {
        self.merge_dataset(id).await
    }

    async fn merge_child(&self, child: &ResourceRef, parent: &ResourceRef) -> Result<bool> {
        self.merge_child(child, parent).await
    }

    async fn delete_resource_tree(&self, resource: &ResourceRef, max_depth: u32) -> Result<u64> {
        self.delete_resource_tree(resource, max_depth).await
    }

    // ========================================================================
    // Tag and favourite edges
    // ========================================================================

    async fn merge_tag(
        &self,
        resource: &ResourceRef,
        concept_id: &str,
        application: &str,
    ) -> Result<()> {
        self.merge_tag(resource, concept_id, application).await
    }

    async fn delete_tags(&self, resource: &ResourceRef, application: Option<&str>) -> Result<()> {
        self.delete_tags(resource, application).await
    }

    async fn resource_tags(
        &self,
        resource: &ResourceRef,
        application: Option<&str>,
    ) -> Result<Vec<String>> {
        self.resource_tags(resource, application).await
    }

    async fn merge_favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()> {
        self.merge_favourite(user_id, resource, application).await
    }

    async fn delete_favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()> {
        self.delete_favourite(user_id, resource, application).await
    }

    // ========================================================================
    // Concepts and hierarchy
    // ========================================================================

    async fn merge_concept(&self, concept: &Concept) -> Result<()> {
        self.merge_concept(concept).await
    }

    async fn merge_hierarchy_edge(
        &self,
        child: &str,
        parent: &str,
        relation: HierarchyRelation,
    ) -> Result<()> {
        self.merge_hierarchy_edge(child, parent, relation).await
    }

    async fn get_concepts(&self, ids: &[String]) -> Result<Vec<Concept>> {
        self.get_concepts(ids).await
    }

    async fn parent_edges(&self, ids: &[String]) -> Result<Vec<HierarchyEdge>> {
        self.parent_edges(ids).await
    }

    async fn child_edges(&self, ids: &[String]) -> Result<Vec<HierarchyEdge>> {
        self.child_edges(ids).await
    }

    async fn list_concepts(
        &self,
        application: &str,
        filter: &ConceptFilter,
    ) -> Result<Vec<ConceptSummary>> {
        self.list_concepts(application, filter).await
    }

    // ========================================================================
    // Tag queries
    // ========================================================================

    async fn datasets_tagged_with(
        &self,
        concept_ids: &[String],
        application: &str,
        within: Option<&[String]>,
    ) -> Result<Vec<String>> {
        self.datasets_tagged_with(concept_ids, application, within)
            .await
    }

    async fn dataset_tag_rows(
        &self,
        dataset_ids: &[String],
        application: &str,
    ) -> Result<Vec<TagRow>> {
        self.dataset_tag_rows(dataset_ids, application).await
    }

    async fn tag_rows_for_concepts(
        &self,
        concept_ids: &[String],
        application: &str,
    ) -> Result<Vec<TagRow>> {
        self.tag_rows_for_concepts(concept_ids, application).await
    }

    async fn datasets_matching_terms(
        &self,
        terms: &[String],
        application: &str,
    ) -> Result<Vec<String>> {
        self.datasets_matching_terms(terms, application).await
    }

    // ========================================================================
    // Counters
    // ========================================================================

    async fn increment_dataset_views(&self, dataset_id: &str) -> Result<bool> {
        self.increment_dataset_views(dataset_id).await
    }

    async fn record_user_view(&self, dataset_id: &str, user_id: &str) -> Result<bool> {
        self.record_user_view(dataset_id, user_id).await
    }

    async fn dataset_views(&self, dataset_id: &str) -> Result<Option<i64>> {
        self.dataset_views(dataset_id).await
    }

    async fn user_dataset_views(&self, user_id: &str, dataset_id: &str) -> Result<Option<i64>> {
        self.user_dataset_views(user_id, dataset_id).await
    }

    async fn favourite_counts(&self, application: &str) -> Result<Vec<DatasetCount>> {
        self.favourite_counts(application).await
    }

    async fn favourite_totals(&self, within: Option<&[String]>) -> Result<Vec<DatasetCount>> {
        self.favourite_totals(within).await
    }

    async fn view_counts(&self, within: Option<&[String]>) -> Result<Vec<DatasetCount>> {
        self.view_counts(within).await
    }

    async fn user_view_counts(&self, user_id: &str) -> Result<Vec<DatasetCount>> {
        self.user_view_counts(user_id).await
    }
}
