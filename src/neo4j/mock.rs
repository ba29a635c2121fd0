//! In-memory mock implementation of GraphStore for testing.
//!
//! Provides a complete mock of all graph operations using
//! `tokio::sync::RwLock<HashMap<K, V>>` collections.
//! Conditionally compiled with `#[cfg(test)]`.

use crate::error::{Error, Result};
use crate::neo4j::models::*;
use crate::neo4j::traits::GraphStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory mock implementation of GraphStore for testing.
pub struct MockGraphStore {
    // Nodes
    pub resources: RwLock<HashSet<ResourceRef>>,
    pub dataset_views: RwLock<HashMap<String, i64>>,
    pub concepts: RwLock<HashMap<String, Concept>>,
    pub users: RwLock<HashSet<String>>,

    // Relationships
    /// (child, parent)
    pub belongs_to: RwLock<HashSet<(ResourceRef, ResourceRef)>>,
    /// (child concept, parent concept, relation)
    pub hierarchy: RwLock<HashSet<(String, String, HierarchyRelation)>>,
    /// (resource, concept, application)
    pub tags: RwLock<HashSet<(ResourceRef, String, String)>>,
    /// (user, resource, application)
    pub favourites: RwLock<HashSet<(String, ResourceRef, String)>>,
    /// (user, dataset) -> views
    pub user_views: RwLock<HashMap<(String, String), i64>>,

    /// Number of store round trips issued
    pub calls: AtomicUsize,
    /// When set, every call fails as if the store were unreachable
    pub fail: AtomicBool,
}

impl Default for MockGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self {
            resources: RwLock::new(HashSet::new()),
            dataset_views: RwLock::new(HashMap::new()),
            concepts: RwLock::new(HashMap::new()),
            users: RwLock::new(HashSet::new()),
            belongs_to: RwLock::new(HashSet::new()),
            hierarchy: RwLock::new(HashSet::new()),
            tags: RwLock::new(HashSet::new()),
            favourites: RwLock::new(HashSet::new()),
            user_views: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // Builder / seeding methods for tests
    // ========================================================================

    /// Seed a dataset node.
    pub async fn with_dataset(self, id: &str) -> Self {
        self.resources.write().await.insert(ResourceRef::dataset(id));
        self.dataset_views.write().await.insert(id.to_string(), 0);
        self
    }

    /// Seed a dataset tagged with `concepts` for `application`.
    pub async fn with_tagged_dataset(self, id: &str, concepts: &[&str], application: &str) -> Self {
        let this = self.with_dataset(id).await;
        for concept in concepts {
            this.concepts
                .write()
                .await
                .entry(concept.to_string())
                .or_insert_with(|| Concept::bare(*concept));
            this.tags.write().await.insert((
                ResourceRef::dataset(id),
                concept.to_string(),
                application.to_string(),
            ));
        }
        this
    }

    /// Seed a concept.
    pub async fn with_concept(self, concept: Concept) -> Self {
        self.concepts
            .write()
            .await
            .insert(concept.id.clone(), concept);
        self
    }

    /// Seed a hierarchy edge child -[IS_A]-> parent, creating bare concepts.
    pub async fn with_hierarchy(self, child: &str, parent: &str) -> Self {
        self.with_relation(child, parent, HierarchyRelation::IsA).await
    }

    /// Seed a hierarchy edge with an explicit relation.
    pub async fn with_relation(self, child: &str, parent: &str, relation: HierarchyRelation) -> Self {
        {
            let mut concepts = self.concepts.write().await;
            for id in [child, parent] {
                concepts
                    .entry(id.to_string())
                    .or_insert_with(|| Concept::bare(id));
            }
        }
        self.hierarchy
            .write()
            .await
            .insert((child.to_string(), parent.to_string(), relation));
        self
    }

    /// Seed a favourite edge (user is created implicitly).
    pub async fn with_favourite(self, user: &str, dataset: &str, application: &str) -> Self {
        self.users.write().await.insert(user.to_string());
        self.favourites.write().await.insert((
            user.to_string(),
            ResourceRef::dataset(dataset),
            application.to_string(),
        ));
        self
    }

    /// Number of round trips issued so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Number of tag edges on a resource for an application
    pub async fn tag_edge_count(&self, resource: &ResourceRef, application: &str) -> usize {
        self.tags
            .read()
            .await
            .iter()
            .filter(|(r, _, app)| r == resource && app == application)
            .count()
    }

    fn touch(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::graph("mock graph store unavailable"))
        } else {
            Ok(())
        }
    }

    async fn dataset_ids(&self, within: Option<&[String]>) -> Vec<String> {
        self.resources
            .read()
            .await
            .iter()
            .filter(|r| r.resource_type == ResourceType::Dataset)
            .filter(|r| within.map_or(true, |w| w.contains(&r.id)))
            .map(|r| r.id.clone())
            .collect()
    }
}

fn sorted_unique(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut v: Vec<String> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
    v.sort();
    v
}

#[async_trait]
impl GraphStore for MockGraphStore {
    // ========================================================================
    // Resource nodes
    // ========================================================================

    async fn resource_exists(&self, resource: &ResourceRef) -> Result<bool> {
        self.touch()?;
        Ok(self.resources.read().await.contains(resource))
    }

    async fn merge_dataset(&self, id: &str) -> Result<()> {
        self.touch()?;
        self.resources.write().await.insert(ResourceRef::dataset(id));
        self.dataset_views
            .write()
            .await
            .entry(id.to_string())
            .or_insert(0);
        Ok(())
    }

    async fn merge_child(&self, child: &ResourceRef, parent: &ResourceRef) -> Result<bool> {
        self.touch()?;
        let mut resources = self.resources.write().await;
        if !resources.contains(parent) {
            return Ok(false);
        }
        resources.insert(child.clone());
        self.belongs_to
            .write()
            .await
            .insert((child.clone(), parent.clone()));
        Ok(true)
    }

    async fn delete_resource_tree(&self, resource: &ResourceRef, max_depth: u32) -> Result<u64> {
        self.touch()?;
        let mut resources = self.resources.write().await;
        if !resources.contains(resource) {
            return Ok(0);
        }

        let mut belongs_to = self.belongs_to.write().await;
        let mut doomed: HashSet<ResourceRef> = HashSet::from([resource.clone()]);
        let mut queue = VecDeque::from([(resource.clone(), 0u32)]);
        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth.max(1) {
                continue;
            }
            for (child, parent) in belongs_to.iter() {
                if parent == &node && doomed.insert(child.clone()) {
                    queue.push_back((child.clone(), depth + 1));
                }
            }
        }

        belongs_to.retain(|(c, p)| !doomed.contains(c) && !doomed.contains(p));
        resources.retain(|r| !doomed.contains(r));
        self.tags
            .write()
            .await
            .retain(|(r, _, _)| !doomed.contains(r));
        self.favourites
            .write()
            .await
            .retain(|(_, r, _)| !doomed.contains(r));
        let dead_datasets: HashSet<String> = doomed
            .iter()
            .filter(|r| r.resource_type == ResourceType::Dataset)
            .map(|r| r.id.clone())
            .collect();
        self.dataset_views
            .write()
            .await
            .retain(|id, _| !dead_datasets.contains(id));
        self.user_views
            .write()
            .await
            .retain(|(_, d), _| !dead_datasets.contains(d));

        Ok(doomed.len() as u64)
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
        self.touch()?;
        if !self.resources.read().await.contains(resource) {
            return Ok(());
        }
        self.concepts
            .write()
            .await
            .entry(concept_id.to_string())
            .or_insert_with(|| Concept::bare(concept_id));
        self.tags.write().await.insert((
            resource.clone(),
            concept_id.to_string(),
            application.to_string(),
        ));
        Ok(())
    }

    async fn delete_tags(&self, resource: &ResourceRef, application: Option<&str>) -> Result<()> {
        self.touch()?;
        self.tags
            .write()
            .await
            .retain(|(r, _, app)| !(r == resource && application.map_or(true, |a| a == app)));
        Ok(())
    }

    async fn resource_tags(
        &self,
        resource: &ResourceRef,
        application: Option<&str>,
    ) -> Result<Vec<String>> {
        self.touch()?;
        let tags = self.tags.read().await;
        Ok(sorted_unique(
            tags.iter()
                .filter(|(r, _, app)| r == resource && application.map_or(true, |a| a == app))
                .map(|(_, c, _)| c.clone()),
        ))
    }

    async fn merge_favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()> {
        self.touch()?;
        if !self.resources.read().await.contains(resource) {
            return Ok(());
        }
        self.users.write().await.insert(user_id.to_string());
        self.favourites.write().await.insert((
            user_id.to_string(),
            resource.clone(),
            application.to_string(),
        ));
        Ok(())
    }

    async fn delete_favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()> {
        self.touch()?;
        self.favourites.write().await.remove(&(
            user_id.to_string(),
            resource.clone(),
            application.to_string(),
        ));
        Ok(())
    }

    // ========================================================================
    // Concepts and hierarchy
    // ========================================================================

    async fn merge_concept(&self, concept: &Concept) -> Result<()> {
        self.touch()?;
        let mut concepts = self.concepts.write().await;
        let entry = concepts
            .entry(concept.id.clone())
            .or_insert_with(|| Concept::bare(concept.id.clone()));
        entry.label = concept.label.clone();
        entry.synonyms = concept.synonyms.clone();
        for label in &concept.labels {
            if !entry.labels.contains(label) {
                entry.labels.push(label.clone());
            }
        }
        Ok(())
    }

    async fn merge_hierarchy_edge(
        &self,
        child: &str,
        parent: &str,
        relation: HierarchyRelation,
    ) -> Result<()> {
        self.touch()?;
        {
            let mut concepts = self.concepts.write().await;
            for id in [child, parent] {
                concepts
                    .entry(id.to_string())
                    .or_insert_with(|| Concept::bare(id));
            }
        }
        self.hierarchy
            .write()
            .await
            .insert((child.to_string(), parent.to_string(), relation));
        Ok(())
    }

    async fn get_concepts(&self, ids: &[String]) -> Result<Vec<Concept>> {
        self.touch()?;
        let concepts = self.concepts.read().await;
        Ok(ids.iter().filter_map(|id| concepts.get(id).cloned()).collect())
    }

    async fn parent_edges(&self, ids: &[String]) -> Result<Vec<HierarchyEdge>> {
        self.touch()?;
        let edges: HashSet<HierarchyEdge> = self
            .hierarchy
            .read()
            .await
            .iter()
            .filter(|(child, _, _)| ids.contains(child))
            .map(|(child, parent, _)| HierarchyEdge {
                child: child.clone(),
                parent: parent.clone(),
            })
            .collect();
        Ok(edges.into_iter().collect())
    }

    async fn child_edges(&self, ids: &[String]) -> Result<Vec<HierarchyEdge>> {
        self.touch()?;
        let edges: HashSet<HierarchyEdge> = self
            .hierarchy
            .read()
            .await
            .iter()
            .filter(|(_, parent, _)| ids.contains(parent))
            .map(|(child, parent, _)| HierarchyEdge {
                child: child.clone(),
                parent: parent.clone(),
            })
            .collect();
        Ok(edges.into_iter().collect())
    }

    async fn list_concepts(
        &self,
        application: &str,
        filter: &ConceptFilter,
    ) -> Result<Vec<ConceptSummary>> {
        self.touch()?;
        let concepts = self.concepts.read().await;
        let tags = self.tags.read().await;
        let mut summaries: Vec<ConceptSummary> = concepts
            .values()
            .filter(|c| filter.accepts(c))
            .map(|c| {
                let datasets = sorted_unique(
                    tags.iter()
                        .filter(|(r, concept, app)| {
                            r.resource_type == ResourceType::Dataset
                                && concept == &c.id
                                && app == application
                        })
                        .map(|(r, _, _)| r.id.clone()),
                );
                ConceptSummary {
                    concept: c.clone(),
                    number_of_datasets_tagged: datasets.len() as i64,
                    datasets,
                }
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.number_of_datasets_tagged
                .cmp(&a.number_of_datasets_tagged)
                .then_with(|| a.concept.id.cmp(&b.concept.id))
        });
        Ok(summaries)
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
        self.touch()?;
        let tags = self.tags.read().await;
        Ok(sorted_unique(
            tags.iter()
                .filter(|(r, c, app)| {
                    r.resource_type == ResourceType::Dataset
                        && app == application
                        && concept_ids.contains(c)
                        && within.map_or(true, |w| w.contains(&r.id))
                })
                .map(|(r, _, _)| r.id.clone()),
        ))
    }

    async fn dataset_tag_rows(
        &self,
        dataset_ids: &[String],
        application: &str,
    ) -> Result<Vec<TagRow>> {
        self.touch()?;
        let tags = self.tags.read().await;
        Ok(tags
            .iter()
            .filter(|(r, _, app)| {
                r.resource_type == ResourceType::Dataset
                    && app == application
                    && dataset_ids.contains(&r.id)
            })
            .map(|(r, c, _)| TagRow {
                dataset: r.id.clone(),
                concept: c.clone(),
            })
            .collect())
    }

    async fn tag_rows_for_concepts(
        &self,
        concept_ids: &[String],
        application: &str,
    ) -> Result<Vec<TagRow>> {
        self.touch()?;
        let tags = self.tags.read().await;
        Ok(tags
            .iter()
            .filter(|(r, c, app)| {
                r.resource_type == ResourceType::Dataset
                    && app == application
                    && concept_ids.contains(c)
            })
            .map(|(r, c, _)| TagRow {
                dataset: r.id.clone(),
                concept: c.clone(),
            })
            .collect())
    }

    async fn datasets_matching_terms(
        &self,
        terms: &[String],
        application: &str,
    ) -> Result<Vec<String>> {
        self.touch()?;
        let concepts = self.concepts.read().await;
        let tags = self.tags.read().await;
        Ok(sorted_unique(
            tags.iter()
                .filter(|(r, c, app)| {
                    r.resource_type == ResourceType::Dataset
                        && app == application
                        && concepts.get(c).is_some_and(|c| c.matches_any_term(terms))
                })
                .map(|(r, _, _)| r.id.clone()),
        ))
    }

    // ========================================================================
    // Counters
    // ========================================================================

    async fn increment_dataset_views(&self, dataset_id: &str) -> Result<bool> {
        self.touch()?;
        if !self
            .resources
            .read()
            .await
            .contains(&ResourceRef::dataset(dataset_id))
        {
            return Ok(false);
        }
        *self
            .dataset_views
            .write()
            .await
            .entry(dataset_id.to_string())
            .or_insert(0) += 1;
        Ok(true)
    }

    async fn record_user_view(&self, dataset_id: &str, user_id: &str) -> Result<bool> {
        self.touch()?;
        if !self
            .resources
            .read()
            .await
            .contains(&ResourceRef::dataset(dataset_id))
        {
            return Ok(false);
        }
        self.users.write().await.insert(user_id.to_string());
        *self
            .user_views
            .write()
            .await
            .entry((user_id.to_string(), dataset_id.to_string()))
            .or_insert(0) += 1;
        Ok(true)
    }

    async fn dataset_views(&self, dataset_id: &str) -> Result<Option<i64>> {
        self.touch()?;
        Ok(self.dataset_views.read().await.get(dataset_id).copied())
    }

    async fn user_dataset_views(&self, user_id: &str, dataset_id: &str) -> Result<Option<i64>> {
        self.touch()?;
        Ok(self
            .user_views
            .read()
            .await
            .get(&(user_id.to_string(), dataset_id.to_string()))
            .copied())
    }

    async fn favourite_counts(&self, application: &str) -> Result<Vec<DatasetCount>> {
        self.touch()?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for (_, r, app) in self.favourites.read().await.iter() {
            if r.resource_type == ResourceType::Dataset && app == application {
                *counts.entry(r.id.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(dataset, count)| DatasetCount { dataset, count })
            .collect())
    }

    async fn favourite_totals(&self, within: Option<&[String]>) -> Result<Vec<DatasetCount>> {
        self.touch()?;
        let favourites = self.favourites.read().await;
        Ok(self
            .dataset_ids(within)
            .await
            .into_iter()
            .map(|id| {
                let count = favourites
                    .iter()
                    .filter(|(_, r, _)| r.resource_type == ResourceType::Dataset && r.id == id)
                    .count() as i64;
                DatasetCount { dataset: id, count }
            })
            .collect())
    }

    async fn view_counts(&self, within: Option<&[String]>) -> Result<Vec<DatasetCount>> {
        self.touch()?;
        let views = self.dataset_views.read().await;
        Ok(self
            .dataset_ids(within)
            .await
            .into_iter()
            .map(|id| {
                let count = views.get(&id).copied().unwrap_or(0);
                DatasetCount { dataset: id, count }
            })
            .collect())
    }

    async fn user_view_counts(&self, user_id: &str) -> Result<Vec<DatasetCount>> {
        self.touch()?;
        Ok(self
            .user_views
            .read()
            .await
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((_, dataset), views)| DatasetCount::new(dataset.clone(), *views))
            .collect())
    }
}
