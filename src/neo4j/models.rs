//! Graph models for resources, concepts and ranking rows

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tenant scope applied when a caller does not name one
pub const DEFAULT_APPLICATION: &str = "rw";

// ============================================================================
// Resources
// ============================================================================

/// Kind of resource node. The label is the only schema token ever spliced into
/// Cypher text, so it must come from this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    Dataset,
    Widget,
    Layer,
    Metadata,
}

impl ResourceType {
    /// Graph label for this resource type
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Dataset => "DATASET",
            ResourceType::Widget => "WIDGET",
            ResourceType::Layer => "LAYER",
            ResourceType::Metadata => "METADATA",
        }
    }

    /// Whether a node of this type may hang below `parent` in a BELONGS_TO tree
    pub fn can_belong_to(&self, parent: ResourceType) -> bool {
        match self {
            ResourceType::Widget | ResourceType::Layer => parent == ResourceType::Dataset,
            ResourceType::Metadata => parent != ResourceType::Metadata,
            ResourceType::Dataset => false,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    /// Path segments arrive in any case ("dataset", "Widget"); they are
    /// upper-cased before matching.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DATASET" => Ok(ResourceType::Dataset),
            "WIDGET" => Ok(ResourceType::Widget),
            "LAYER" => Ok(ResourceType::Layer),
            "METADATA" => Ok(ResourceType::Metadata),
            other => Err(Error::invalid(format!("unsupported resource type '{}'", other))),
        }
    }
}

/// Typed reference to a resource node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub id: String,
}

impl ResourceRef {
    pub fn new(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            id: id.into(),
        }
    }

    pub fn dataset(id: impl Into<String>) -> Self {
        Self::new(ResourceType::Dataset, id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

// ============================================================================
// Concepts
// ============================================================================

/// Hierarchy edge kinds between concepts, always pointing child → parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HierarchyRelation {
    PartOf,
    IsA,
    QualityOf,
    TypeOf,
}

impl HierarchyRelation {
    pub const ALL: [HierarchyRelation; 4] = [
        HierarchyRelation::PartOf,
        HierarchyRelation::IsA,
        HierarchyRelation::QualityOf,
        HierarchyRelation::TypeOf,
    ];

    pub fn rel_type(&self) -> &'static str {
        match self {
            HierarchyRelation::PartOf => "PART_OF",
            HierarchyRelation::IsA => "IS_A",
            HierarchyRelation::QualityOf => "QUALITY_OF",
            HierarchyRelation::TypeOf => "TYPE_OF",
        }
    }

    /// Relationship type alternation for a Cypher pattern, e.g. `PART_OF|IS_A|...`
    pub fn cypher_alternation() -> String {
        Self::ALL
            .iter()
            .map(|r| r.rel_type())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl FromStr for HierarchyRelation {
    type Err = Error;

    /// Accepts `IS_A`, `is-a`, `is_a`, ...
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|r| r.rel_type() == normalized)
            .ok_or_else(|| Error::invalid(format!("unknown hierarchy relation '{}'", s)))
    }
}

/// A taxonomy node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Graph labels of the node (always includes `CONCEPT`, plus any category)
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Concept {
    /// Concept created on demand by tagging: label mirrors the id
    pub fn bare(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            synonyms: Vec::new(),
            labels: vec!["CONCEPT".to_string()],
        }
    }

    /// Case-insensitive substring match on label or any synonym
    pub fn matches_any_term(&self, terms: &[String]) -> bool {
        let label = self.label.to_lowercase();
        terms.iter().map(|t| t.to_lowercase()).any(|term| {
            label.contains(&term) || self.synonyms.iter().any(|s| s.to_lowercase().contains(&term))
        })
    }

    pub fn has_any_category(&self, categories: &[String]) -> bool {
        self.labels.iter().any(|l| categories.contains(l))
    }
}

/// A concept together with the datasets tagged with it for one application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptSummary {
    #[serde(flatten)]
    pub concept: Concept,
    pub number_of_datasets_tagged: i64,
    pub datasets: Vec<String>,
}

/// Filters for concept listing. Both filters, when present, must hold.
#[derive(Debug, Clone, Default)]
pub struct ConceptFilter {
    pub include_categories: Option<Vec<String>>,
    pub search_terms: Option<Vec<String>>,
}

impl ConceptFilter {
    /// Filters given as empty lists are treated as absent
    pub fn normalized(self) -> Self {
        Self {
            include_categories: self.include_categories.filter(|c| !c.is_empty()),
            search_terms: self.search_terms.filter(|s| !s.is_empty()),
        }
    }

    pub fn accepts(&self, concept: &Concept) -> bool {
        if let Some(ref cats) = self.include_categories {
            if !concept.has_any_category(cats) {
                return false;
            }
        }
        if let Some(ref terms) = self.search_terms {
            if !concept.matches_any_term(terms) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// Ranking rows
// ============================================================================

/// One-hop hierarchy edge as returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierarchyEdge {
    pub child: String,
    pub parent: String,
}

/// (dataset, concept) tag pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagRow {
    pub dataset: String,
    pub concept: String,
}

/// Dataset ranked by similarity to a reference set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarDataset {
    pub dataset: String,
    pub shared_concepts: Vec<String>,
    pub count: usize,
}

/// Dataset with an aggregated counter (favourites or views)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCount {
    pub dataset: String,
    pub count: i64,
}

impl DatasetCount {
    pub fn new(dataset: impl Into<String>, count: i64) -> Self {
        Self {
            dataset: dataset.into(),
            count,
        }
    }
}

/// Sort rows descending by count, ties by dataset id
pub fn sort_counts_desc(rows: &mut [DatasetCount]) {
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.dataset.cmp(&b.dataset)));
}
