//! Resource nodes and their BELONGS_TO tree

use crate::error::{Error, Result};
use crate::neo4j::models::{ResourceRef, ResourceType};
use crate::neo4j::GraphStore;
use std::sync::Arc;

/// Mirrors datasets, widgets, layers and metadata into the graph
pub struct ResourceRegistry {
    neo4j: Arc<dyn GraphStore>,
    max_depth: u32,
}

impl ResourceRegistry {
    /// `max_depth` bounds the BELONGS_TO walk of a cascade delete
    pub fn new(neo4j: Arc<dyn GraphStore>, max_depth: u32) -> Self {
        Self { neo4j, max_depth }
    }

    /// Create a dataset node with a zero view counter (no-op if it exists)
    pub async fn create_dataset(&self, id: &str) -> Result<ResourceRef> {
        if id.trim().is_empty() {
            return Err(Error::invalid("dataset id must not be empty"));
        }
        self.neo4j.merge_dataset(id).await?;
        tracing::info!(dataset_id = id, "Created dataset node");
        Ok(ResourceRef::dataset(id))
    }

    /// Attach `child` under `parent`, creating the child node if needed.
    ///
    /// Widgets and layers hang off datasets; metadata hangs off datasets,
    /// widgets or layers.
    pub async fn attach(&self, child: &ResourceRef, parent: &ResourceRef) -> Result<()> {
        if child.id.trim().is_empty() || parent.id.trim().is_empty() {
            return Err(Error::invalid("resource ids must not be empty"));
        }
        if !child.resource_type.can_belong_to(parent.resource_type) {
            return Err(Error::invalid(format!(
                "a {} cannot belong to a {}",
                child.resource_type, parent.resource_type
            )));
        }

        if !self.neo4j.merge_child(child, parent).await? {
            return Err(Error::not_found(parent.resource_type, parent.id.clone()));
        }
        tracing::info!(%child, %parent, "Attached resource");
        Ok(())
    }

    /// Delete a resource and everything that transitively belongs to it.
    ///
    /// Returns the number of nodes removed; deleting an absent resource removes nothing.
    pub async fn delete(&self, resource: &ResourceRef) -> Result<u64> {
        let removed = self
            .neo4j
            .delete_resource_tree(resource, self.max_depth)
            .await?;
        tracing::info!(%resource, removed, "Deleted resource tree");
        Ok(removed)
    }

    pub async fn exists(&self, resource: &ResourceRef) -> Result<bool> {
        self.neo4j.resource_exists(resource).await
    }

    /// Shorthand for `exists` on a dataset
    pub async fn dataset_exists(&self, id: &str) -> Result<bool> {
        self.exists(&ResourceRef::new(ResourceType::Dataset, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hierarchy::DEFAULT_MAX_DEPTH;
    use crate::neo4j::mock::MockGraphStore;

    fn registry(store: MockGraphStore) -> (ResourceRegistry, Arc<MockGraphStore>) {
        let store = Arc::new(store);
        (ResourceRegistry::new(store.clone(), DEFAULT_MAX_DEPTH), store)
    }

    #[tokio::test]
    async fn test_create_dataset_starts_at_zero_views() {
        let (registry, store) = registry(MockGraphStore::new());
        registry.create_dataset("d1").await.unwrap();
        registry.create_dataset("d1").await.unwrap();

        assert!(registry.dataset_exists("d1").await.unwrap());
        assert_eq!(store.dataset_views("d1").await.unwrap(), Some(0));
        assert_eq!(store.resources.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_attach_requires_existing_parent() {
        let (registry, _) = registry(MockGraphStore::new());
        let err = registry
            .attach(
                &ResourceRef::new(ResourceType::Widget, "w1"),
                &ResourceRef::dataset("ghost"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "DATASET ghost not found");
    }

    #[tokio::test]
    async fn test_attach_rejects_invalid_pairings() {
        let (registry, store) = registry(MockGraphStore::new().with_dataset("d1").await);
        let widget = ResourceRef::new(ResourceType::Widget, "w1");
        let layer = ResourceRef::new(ResourceType::Layer, "l1");
        let metadata = ResourceRef::new(ResourceType::Metadata, "m1");

        for (child, parent) in [
            (&layer, &widget),
            (&metadata, &metadata),
            (&ResourceRef::dataset("d2"), &ResourceRef::dataset("d1")),
        ] {
            let err = registry.attach(child, parent).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_through_tree() {
        let (registry, store) = registry(
            MockGraphStore::new()
                .with_tagged_dataset("d1", &["ocean"], "rw")
                .await
                .with_dataset("d2")
                .await,
        );
        let d1 = ResourceRef::dataset("d1");
        let widget = ResourceRef::new(ResourceType::Widget, "w1");
        let layer = ResourceRef::new(ResourceType::Layer, "l1");
        let meta = ResourceRef::new(ResourceType::Metadata, "m1");

        registry.attach(&widget, &d1).await.unwrap();
        registry.attach(&layer, &d1).await.unwrap();
        registry.attach(&meta, &widget).await.unwrap();

        let removed = registry.delete(&d1).await.unwrap();
        assert_eq!(removed, 4);
        for r in [&d1, &widget, &layer, &meta] {
            assert!(!registry.exists(r).await.unwrap());
        }
        assert!(registry.dataset_exists("d2").await.unwrap());
        assert!(store.tags.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_leaf_keeps_parent() {
        let (registry, _) = registry(MockGraphStore::new().with_dataset("d1").await);
        let layer = ResourceRef::new(ResourceType::Layer, "l1");
        registry.attach(&layer, &ResourceRef::dataset("d1")).await.unwrap();

        assert_eq!(registry.delete(&layer).await.unwrap(), 1);
        assert!(registry.dataset_exists("d1").await.unwrap());
        assert_eq!(registry.delete(&layer).await.unwrap(), 0);
    }
}
