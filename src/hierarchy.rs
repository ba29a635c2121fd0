//! Concept hierarchy closures
//!
//! Ancestor and descendant sets are computed hop by hop: each hop is one
//! store round trip for the whole frontier, a visited set drops concepts
//! already seen, and the hop counter is capped. The taxonomy may contain
//! cycles, so termination must never depend on the store's path matching.

use crate::error::{Error, Result};
use crate::neo4j::models::{Concept, HierarchyRelation};
use crate::neo4j::GraphStore;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Hop ceiling applied to every hierarchy traversal
pub const DEFAULT_MAX_DEPTH: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// child → parent
    Up,
    /// parent → child
    Down,
}

/// Resolves ancestor/descendant closures over PART_OF / IS_A / QUALITY_OF / TYPE_OF edges
pub struct ConceptHierarchyIndex {
    neo4j: Arc<dyn GraphStore>,
    ceiling: u32,
}

impl ConceptHierarchyIndex {
    /// Create an index whose traversals never exceed `ceiling` hops
    pub fn new(neo4j: Arc<dyn GraphStore>, ceiling: u32) -> Self {
        Self { neo4j, ceiling }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Upsert a concept's label, synonyms and categories
    pub async fn define_concept(&self, concept: &Concept) -> Result<()> {
        if concept.id.trim().is_empty() {
            return Err(Error::invalid("concept id must not be empty"));
        }
        tracing::debug!(concept = %concept.id, "Defining concept");
        self.neo4j.merge_concept(concept).await
    }

    /// Add a hierarchy edge `child -[relation]-> parent`
    pub async fn link(&self, child: &str, parent: &str, relation: HierarchyRelation) -> Result<()> {
        if child.is_empty() || parent.is_empty() {
            return Err(Error::invalid("hierarchy edge endpoints must not be empty"));
        }
        if child == parent {
            return Err(Error::invalid(format!("concept '{}' cannot be its own parent", child)));
        }
        tracing::debug!(child, parent, relation = relation.rel_type(), "Linking concepts");
        self.neo4j.merge_hierarchy_edge(child, parent, relation).await
    }

    /// All concepts reachable child → parent from `concept_ids`, seeds included
    pub async fn ancestors_of(&self, concept_ids: &[String]) -> Result<Vec<Concept>> {
        let ids = self.closure(concept_ids, self.ceiling, Direction::Up).await?;
        let ids: Vec<String> = ids.into_iter().collect();
        let mut concepts = self.neo4j.get_concepts(&ids).await?;
        concepts.sort_by(|a, b| a.id.cmp(&b.id));
        concepts.dedup_by(|a, b| a.id == b.id);
        Ok(concepts)
    }

    /// Concept ids reachable parent → child within `max_depth` hops, seeds included.
    ///
    /// `max_depth` is clamped to the index ceiling.
    pub async fn descendants_of(
        &self,
        concept_ids: &[String],
        max_depth: u32,
    ) -> Result<BTreeSet<String>> {
        self.closure(concept_ids, max_depth, Direction::Down).await
    }

    /// Union of ancestors and descendants within `max_depth` hops, seeds included
    pub async fn related_within(
        &self,
        concept_ids: &[String],
        max_depth: u32,
    ) -> Result<BTreeSet<String>> {
        let (up, down) = tokio::try_join!(
            self.closure(concept_ids, max_depth, Direction::Up),
            self.closure(concept_ids, max_depth, Direction::Down),
        )?;
        Ok(up.into_iter().chain(down).collect())
    }

    async fn closure(
        &self,
        seeds: &[String],
        max_depth: u32,
        direction: Direction,
    ) -> Result<BTreeSet<String>> {
        let depth = max_depth.min(self.ceiling);
        let mut visited: BTreeSet<String> = seeds.iter().cloned().collect();
        let mut frontier: Vec<String> = visited.iter().cloned().collect();

        for hop in 0..depth {
            if frontier.is_empty() {
                break;
            }
            let edges = match direction {
                Direction::Up => self.neo4j.parent_edges(&frontier).await?,
                Direction::Down => self.neo4j.child_edges(&frontier).await?,
            };
            frontier = edges
                .into_iter()
                .map(|e| match direction {
                    Direction::Up => e.parent,
                    Direction::Down => e.child,
                })
                .filter(|id| visited.insert(id.clone()))
                .collect();
            tracing::trace!(hop, ?direction, next = frontier.len(), "Hierarchy hop");
        }

        Ok(visited)
    }
}
