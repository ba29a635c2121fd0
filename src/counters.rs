//! View and favourite counters, popularity rankings

use crate::error::{Error, Result};
use crate::neo4j::models::{sort_counts_desc, DatasetCount, ResourceType};
use crate::neo4j::GraphStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Counter a popularity sort ranks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortCriterion {
    MostViewed,
    MostFavorited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A parsed sort expression: `most-viewed`, `-most-favorited`, ...
///
/// A leading `-` means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularitySort {
    pub criterion: SortCriterion,
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortCriterion::MostViewed => "most-viewed",
            SortCriterion::MostFavorited => "most-favorited",
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "most-viewed" => Ok(SortCriterion::MostViewed),
            "most-favorited" => Ok(SortCriterion::MostFavorited),
            other => Err(Error::invalid(format!("unsupported sort criterion '{}'", other))),
        }
    }
}

impl FromStr for PopularitySort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (direction, criterion) = match s.strip_prefix('-') {
            Some(rest) => (SortDirection::Desc, rest),
            None => (SortDirection::Asc, s),
        };
        Ok(Self {
            criterion: criterion.parse()?,
            direction,
        })
    }
}

/// Dataset view counters, user view edges and popularity rankings
pub struct CounterService {
    neo4j: Arc<dyn GraphStore>,
}

impl CounterService {
    pub fn new(neo4j: Arc<dyn GraphStore>) -> Self {
        Self { neo4j }
    }

    /// Count a visit to a dataset, and to the user's view edge when a user is given.
    ///
    /// Both counters are bumped concurrently; the dataset counter does not
    /// depend on the user edge.
    pub async fn visit(&self, dataset_id: &str, user_id: Option<&str>) -> Result<()> {
        if dataset_id.trim().is_empty() {
            return Err(Error::invalid("dataset id must not be empty"));
        }
        let user_id = user_id.map(str::trim).filter(|u| !u.is_empty());

        let (dataset, user) = tokio::join!(
            self.neo4j.increment_dataset_views(dataset_id),
            async {
                match user_id {
                    Some(user) => self.neo4j.record_user_view(dataset_id, user).await.map(Some),
                    None => Ok(None),
                }
            }
        );

        let dataset_found = dataset?;
        if let Err(e) = user {
            tracing::warn!(dataset_id, ?user_id, error = %e, "Failed to record user view");
            return Err(e);
        }
        if !dataset_found {
            return Err(Error::not_found(ResourceType::Dataset, dataset_id));
        }

        tracing::debug!(dataset_id, ?user_id, "Recorded visit");
        Ok(())
    }

    /// Datasets by favourite count for an application, most liked first
    pub async fn most_liked(&self, application: &str) -> Result<Vec<DatasetCount>> {
        let mut counts = self.neo4j.favourite_counts(application).await?;
        sort_counts_desc(&mut counts);
        Ok(counts)
    }

    /// Datasets by view count, most viewed first.
    ///
    /// View counters are global, so `application` does not narrow the result.
    pub async fn most_viewed(&self, application: &str) -> Result<Vec<DatasetCount>> {
        tracing::debug!(application, "Ranking datasets by views");
        let mut counts = self.neo4j.view_counts(None).await?;
        sort_counts_desc(&mut counts);
        Ok(counts)
    }

    /// Datasets a user viewed, by that user's view count
    pub async fn most_viewed_by(
        &self,
        user_id: &str,
        application: &str,
    ) -> Result<Vec<DatasetCount>> {
        if user_id.trim().is_empty() {
            return Err(Error::invalid("user id must not be empty"));
        }
        tracing::debug!(user_id, application, "Ranking datasets by user views");
        let mut counts = self.neo4j.user_view_counts(user_id).await?;
        sort_counts_desc(&mut counts);
        Ok(counts)
    }

    /// Dataset ids ranked by a counter, optionally restricted to `restrict_to`.
    ///
    /// Favourites are counted across all applications; datasets without any
    /// rank as zero. Ties are broken by id ascending in both directions.
    pub async fn sort_by_popularity(
        &self,
        sort: PopularitySort,
        restrict_to: Option<&[String]>,
    ) -> Result<Vec<String>> {
        if restrict_to.is_some_and(|r| r.is_empty()) {
            return Ok(Vec::new());
        }
        let mut counts = match sort.criterion {
            SortCriterion::MostViewed => self.neo4j.view_counts(restrict_to).await?,
            SortCriterion::MostFavorited => self.neo4j.favourite_totals(restrict_to).await?,
        };
        match sort.direction {
            SortDirection::Desc => sort_counts_desc(&mut counts),
            SortDirection::Asc => counts.sort_by(|a, b| {
                a.count.cmp(&b.count).then_with(|| a.dataset.cmp(&b.dataset))
            }),
        }
        Ok(counts.into_iter().map(|c| c.dataset).collect())
    }
}
