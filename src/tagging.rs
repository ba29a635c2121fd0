//! Tag and favourite edge management

use crate::error::{Error, Result};
use crate::neo4j::models::ResourceRef;
use crate::neo4j::GraphStore;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Default number of in-flight tag upserts per `tag` call
pub const DEFAULT_TAG_CONCURRENCY: usize = 8;

/// Manager for TAGGED_WITH and FAVOURITE edges
pub struct TaggingEngine {
    neo4j: Arc<dyn GraphStore>,
    concurrency: usize,
}

impl TaggingEngine {
    /// Create a new tagging engine
    pub fn new(neo4j: Arc<dyn GraphStore>, concurrency: usize) -> Self {
        Self {
            neo4j,
            concurrency: concurrency.max(1),
        }
    }

    async fn require(&self, resource: &ResourceRef) -> Result<()> {
        if self.neo4j.resource_exists(resource).await? {
            Ok(())
        } else {
            Err(Error::not_found(resource.resource_type, resource.id.clone()))
        }
    }

    // ========================================================================
    // Tags
    // ========================================================================

    /// Tag a resource with concepts for an application.
    ///
    /// Duplicate ids are collapsed before any write, unknown concepts are
    /// created on demand. Returns the distinct concept ids applied, sorted.
    pub async fn tag(
        &self,
        resource: &ResourceRef,
        concepts: &[String],
        application: &str,
    ) -> Result<Vec<String>> {
        if concepts.is_empty() {
            return Err(Error::invalid("at least one concept is required"));
        }
        if concepts.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::invalid("concept ids must not be empty"));
        }
        let unique: BTreeSet<&str> = concepts.iter().map(|c| c.trim()).collect();

        self.require(resource).await?;

        stream::iter(unique.iter())
            .map(|concept| self.neo4j.merge_tag(resource, concept, application))
            .buffer_unordered(self.concurrency)
            .try_collect::<Vec<()>>()
            .await?;

        tracing::info!(
            %resource,
            application,
            concepts = unique.len(),
            "Tagged resource"
        );
        Ok(unique.into_iter().map(String::from).collect())
    }

    /// Remove a resource's tags for one application, or all of them
    pub async fn untag(&self, resource: &ResourceRef, application: Option<&str>) -> Result<()> {
        self.require(resource).await?;
        self.neo4j.delete_tags(resource, application).await?;
        tracing::info!(%resource, ?application, "Removed tags");
        Ok(())
    }

    /// Concept ids a resource is tagged with, sorted
    pub async fn tags_of(
        &self,
        resource: &ResourceRef,
        application: Option<&str>,
    ) -> Result<Vec<String>> {
        self.require(resource).await?;
        let mut tags = self.neo4j.resource_tags(resource, application).await?;
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    // ========================================================================
    // Favourites
    // ========================================================================

    /// Mark a resource as a user's favourite
    pub async fn favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(Error::invalid("user id must not be empty"));
        }
        self.require(resource).await?;
        self.neo4j
            .merge_favourite(user_id, resource, application)
            .await?;
        tracing::info!(user_id, %resource, application, "Added favourite");
        Ok(())
    }

    /// Remove a favourite edge; a missing edge is not an error
    pub async fn unfavourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(Error::invalid("user id must not be empty"));
        }
        self.require(resource).await?;
        self.neo4j
            .delete_favourite(user_id, resource, application)
            .await?;
        tracing::info!(user_id, %resource, application, "Removed favourite");
        Ok(())
    }
}
