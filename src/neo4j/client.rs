//! Neo4j client for interacting with the tagging graph

use super::models::*;
use crate::error::{Error, Result, Upstream};
use neo4rs::{query, Graph, Query, Row};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Client for Neo4j operations
///
/// `neo4rs::Graph` is a connection pool: every call checks out a connection,
/// runs one auto-commit transaction and returns it, so the client is safe to
/// share across concurrent requests.
pub struct Neo4jClient {
    graph: Arc<Graph>,
    timeout: Duration,
}

/// Builder for dynamic WHERE clauses in Cypher queries.
///
/// Conditions only ever reference `$parameters`; values are never spliced in.
#[derive(Default)]
pub struct WhereBuilder {
    conditions: Vec<String>,
}

impl WhereBuilder {
    /// Create a new empty WhereBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw condition
    pub fn add(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Restrict `alias.id` to the `$param` list
    pub fn add_id_in(&mut self, alias: &str, param: &str) -> &mut Self {
        self.add(format!("{}.id IN ${}", alias, param))
    }

    /// Require at least one graph label of `alias` to be in `$param`
    pub fn add_label_filter(&mut self, alias: &str, param: &str) -> &mut Self {
        self.add(format!("any(x IN labels({}) WHERE x IN ${})", alias, param))
    }

    /// Case-insensitive CONTAINS of any `$param` term on label or synonyms
    pub fn add_term_filter(&mut self, alias: &str, param: &str) -> &mut Self {
        self.add(format!(
            "any(part IN ${1} WHERE toLower(coalesce({0}.label, {0}.id)) CONTAINS toLower(part) \
             OR any(s IN coalesce({0}.synonyms, []) WHERE toLower(s) CONTAINS toLower(part)))",
            alias, param
        ))
    }

    /// Build the WHERE clause (returns empty string if no conditions)
    pub fn build(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }
}

/// Category labels become node labels, which Cypher cannot parameterise.
/// Only `[A-Za-z0-9_]` labels are accepted.
fn validate_category_label(label: &str) -> Result<&str> {
    if !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(label)
    } else {
        Err(Error::invalid(format!("invalid concept category '{}'", label)))
    }
}

/// Await `fut` for at most `after`, reporting expiry as a graph store timeout
async fn deadline<T, F>(after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(after, fut).await.map_err(|_| {
        tracing::warn!(?after, "Neo4j call timed out");
        Error::Timeout {
            service: Upstream::GraphStore,
            after,
        }
    })
}

fn string_column(rows: &[Row], key: &str) -> Result<Vec<String>> {
    rows.iter()
        .map(|row| row.get::<String>(key).map_err(Error::from))
        .collect()
}

fn count_rows(rows: &[Row]) -> Result<Vec<DatasetCount>> {
    rows.iter()
        .map(|row| {
            Ok(DatasetCount {
                dataset: row.get("dataset")?,
                count: row.get("count")?,
            })
        })
        .collect()
}

fn tag_rows(rows: &[Row]) -> Result<Vec<TagRow>> {
    rows.iter()
        .map(|row| {
            Ok(TagRow {
                dataset: row.get("dataset")?,
                concept: row.get("concept")?,
            })
        })
        .collect()
}

fn edge_rows(rows: &[Row]) -> Result<Vec<HierarchyEdge>> {
    rows.iter()
        .map(|row| {
            Ok(HierarchyEdge {
                child: row.get("child")?,
                parent: row.get("parent")?,
            })
        })
        .collect()
}

fn row_to_concept(row: &Row) -> Result<Concept> {
    Ok(Concept {
        id: row.get("id")?,
        label: row.get("label")?,
        synonyms: row.get("synonyms")?,
        labels: row.get("labels")?,
    })
}

impl Neo4jClient {
    /// Create a new Neo4j client.
    ///
    /// `timeout` bounds the connect, each schema statement and every later query.
    pub async fn new(uri: &str, user: &str, password: &str, timeout: Duration) -> Result<Self> {
        let graph = deadline(timeout, Graph::new(uri, user, password))
            .await?
            .map_err(|e| Error::graph(format!("failed to connect to Neo4j at {}: {}", uri, e)))?;

        let client = Self {
            graph: Arc::new(graph),
            timeout,
        };

        // Initialize schema
        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize the graph schema with uniqueness constraints on every merge key
    async fn init_schema(&self) -> Result<()> {
        let constraints = vec![
            "CREATE CONSTRAINT dataset_id IF NOT EXISTS FOR (d:DATASET) REQUIRE d.id IS UNIQUE",
            "CREATE CONSTRAINT widget_id IF NOT EXISTS FOR (w:WIDGET) REQUIRE w.id IS UNIQUE",
            "CREATE CONSTRAINT layer_id IF NOT EXISTS FOR (l:LAYER) REQUIRE l.id IS UNIQUE",
            "CREATE CONSTRAINT metadata_id IF NOT EXISTS FOR (m:METADATA) REQUIRE m.id IS UNIQUE",
            "CREATE CONSTRAINT concept_id IF NOT EXISTS FOR (c:CONCEPT) REQUIRE c.id IS UNIQUE",
            "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:USER) REQUIRE u.id IS UNIQUE",
        ];

        for constraint in constraints {
            match self.run(query(constraint)).await {
                Ok(()) => {}
                Err(e @ Error::Timeout { .. }) => return Err(e),
                Err(e) => tracing::warn!("Constraint may already exist: {}", e),
            }
        }

        Ok(())
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, neo4rs::Error>>,
    {
        deadline(self.timeout, fut).await?.map_err(Error::from)
    }

    /// Execute a parameterized Cypher query and collect every row
    pub(crate) async fn execute_with_params(&self, q: Query) -> Result<Vec<Row>> {
        self.with_timeout(async {
            let mut result = self.graph.execute(q).await?;
            let mut rows = Vec::new();
            while let Some(row) = result.next().await? {
                rows.push(row);
            }
            Ok::<_, neo4rs::Error>(rows)
        })
        .await
    }

    /// Run a parameterized Cypher statement, discarding rows
    pub(crate) async fn run(&self, q: Query) -> Result<()> {
        self.with_timeout(self.graph.run(q)).await
    }

    // ========================================================================
    // Resource nodes
    // ========================================================================

    /// Check whether a resource node exists
    pub async fn resource_exists(&self, resource: &ResourceRef) -> Result<bool> {
        let cypher = format!(
            "MATCH (n:{} {{id: $id}}) RETURN count(n) AS found",
            resource.resource_type.label()
        );
        let rows = self
            .execute_with_params(query(&cypher).param("id", resource.id.clone()))
            .await?;
        let found = match rows.first() {
            Some(row) => row.get::<i64>("found")?,
            None => 0,
        };
        Ok(found > 0)
    }

    /// Merge a DATASET node, initialising `views` to 0 on creation
    pub async fn merge_dataset(&self, id: &str) -> Result<()> {
        let q = query(
            r#"
            MERGE (d:DATASET {id: $id})
            ON CREATE SET d.views = 0
            "#,
        )
        .param("id", id);
        self.run(q).await
    }

    /// Merge `child` and its BELONGS_TO edge to `parent`
    pub async fn merge_child(&self, child: &ResourceRef, parent: &ResourceRef) -> Result<bool> {
        let cypher = format!(
            r#"
            MATCH (parent:{parent} {{id: $parent_id}})
            MERGE (child:{child} {{id: $child_id}})
            MERGE (child)-[:BELONGS_TO]->(parent)
            RETURN count(parent) AS linked
            "#,
            parent = parent.resource_type.label(),
            child = child.resource_type.label(),
        );
        let q = query(&cypher)
            .param("parent_id", parent.id.clone())
            .param("child_id", child.id.clone());
        let rows = self.execute_with_params(q).await?;
        let linked = match rows.first() {
            Some(row) => row.get::<i64>("linked")?,
            None => 0,
        };
        Ok(linked > 0)
    }

    /// Delete a resource and its BELONGS_TO subtree
    pub async fn delete_resource_tree(&self, resource: &ResourceRef, max_depth: u32) -> Result<u64> {
        let cypher = format!(
            r#"
            MATCH (root:{label} {{id: $id}})
            OPTIONAL MATCH (n)-[:BELONGS_TO*1..{depth}]->(root)
            WITH root, collect(DISTINCT n) AS children
            WITH children + [root] AS nodes
            FOREACH (x IN nodes | DETACH DELETE x)
            RETURN size(nodes) AS deleted
            "#,
            label = resource.resource_type.label(),
            depth = max_depth.max(1),
        );
        let rows = self
            .execute_with_params(query(&cypher).param("id", resource.id.clone()))
            .await?;
        let deleted = match rows.first() {
            Some(row) => row.get::<i64>("deleted")?,
            None => 0,
        };
        Ok(deleted.max(0) as u64)
    }

    // ========================================================================
    // Tag and favourite edges
    // ========================================================================

    /// Merge the concept and a TAGGED_WITH edge scoped to `application`
    pub async fn merge_tag(
        &self,
        resource: &ResourceRef,
        concept_id: &str,
        application: &str,
    ) -> Result<()> {
        let cypher = format!(
            r#"
            MATCH (resource:{} {{id: $resource_id}})
            MERGE (concept:CONCEPT {{id: $concept_id}})
            ON CREATE SET concept.label = $concept_id, concept.synonyms = []
            MERGE (resource)-[:TAGGED_WITH {{application: $application}}]->(concept)
            "#,
            resource.resource_type.label()
        );
        let q = query(&cypher)
            .param("resource_id", resource.id.clone())
            .param("concept_id", concept_id)
            .param("application", application);
        self.run(q).await
    }

    /// Delete TAGGED_WITH edges, for one application or all
    pub async fn delete_tags(&self, resource: &ResourceRef, application: Option<&str>) -> Result<()> {
        let label = resource.resource_type.label();
        let q = match application {
            Some(app) => query(&format!(
                r#"
                MATCH (resource:{} {{id: $resource_id}})-[r:TAGGED_WITH {{application: $application}}]->(:CONCEPT)
                DELETE r
                "#,
                label
            ))
            .param("resource_id", resource.id.clone())
            .param("application", app),
            None => query(&format!(
                r#"
                MATCH (resource:{} {{id: $resource_id}})-[r:TAGGED_WITH]->(:CONCEPT)
                DELETE r
                "#,
                label
            ))
            .param("resource_id", resource.id.clone()),
        };
        self.run(q).await
    }

    /// Concept ids a resource is tagged with
    pub async fn resource_tags(
        &self,
        resource: &ResourceRef,
        application: Option<&str>,
    ) -> Result<Vec<String>> {
        let label = resource.resource_type.label();
        let q = match application {
            Some(app) => query(&format!(
                r#"
                MATCH (resource:{} {{id: $resource_id}})-[:TAGGED_WITH {{application: $application}}]->(c:CONCEPT)
                RETURN DISTINCT c.id AS id
                ORDER BY id
                "#,
                label
            ))
            .param("resource_id", resource.id.clone())
            .param("application", app),
            None => query(&format!(
                r#"
                MATCH (resource:{} {{id: $resource_id}})-[:TAGGED_WITH]->(c:CONCEPT)
                RETURN DISTINCT c.id AS id
                ORDER BY id
                "#,
                label
            ))
            .param("resource_id", resource.id.clone()),
        };
        let rows = self.execute_with_params(q).await?;
        string_column(&rows, "id")
    }

    /// Merge the user and a FAVOURITE edge scoped to `application`
    pub async fn merge_favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()> {
        let cypher = format!(
            r#"
            MATCH (resource:{} {{id: $resource_id}})
            MERGE (user:USER {{id: $user_id}})
            MERGE (user)-[:FAVOURITE {{application: $application}}]->(resource)
            "#,
            resource.resource_type.label()
        );
        let q = query(&cypher)
            .param("resource_id", resource.id.clone())
            .param("user_id", user_id)
            .param("application", application);
        self.run(q).await
    }

    /// Delete the FAVOURITE edge scoped to `application`
    pub async fn delete_favourite(
        &self,
        user_id: &str,
        resource: &ResourceRef,
        application: &str,
    ) -> Result<()> {
        let cypher = format!(
            r#"
            MATCH (:USER {{id: $user_id}})-[r:FAVOURITE {{application: $application}}]->(:{} {{id: $resource_id}})
            DELETE r
            "#,
            resource.resource_type.label()
        );
        let q = query(&cypher)
            .param("resource_id", resource.id.clone())
            .param("user_id", user_id)
            .param("application", application);
        self.run(q).await
    }

    // ========================================================================
    // Concepts and hierarchy
    // ========================================================================

    /// Merge a concept node, replacing label and synonyms and adding categories
    pub async fn merge_concept(&self, concept: &Concept) -> Result<()> {
        let categories = concept
            .labels
            .iter()
            .filter(|l| l.as_str() != "CONCEPT")
            .map(|l| validate_category_label(l).map(|l| format!(":{}", l)))
            .collect::<Result<Vec<_>>>()?
            .join("");
        let set_labels = if categories.is_empty() {
            String::new()
        } else {
            format!("SET c{}", categories)
        };
        let cypher = format!(
            r#"
            MERGE (c:CONCEPT {{id: $id}})
            SET c.label = $label, c.synonyms = $synonyms
            {}
            "#,
            set_labels
        );
        let q = query(&cypher)
            .param("id", concept.id.clone())
            .param("label", concept.label.clone())
            .param("synonyms", concept.synonyms.clone());
        self.run(q).await
    }

    /// Merge a hierarchy edge child -[relation]-> parent
    pub async fn merge_hierarchy_edge(
        &self,
        child: &str,
        parent: &str,
        relation: HierarchyRelation,
    ) -> Result<()> {
        let cypher = format!(
            r#"
            MERGE (child:CONCEPT {{id: $child}})
            ON CREATE SET child.label = $child, child.synonyms = []
            MERGE (parent:CONCEPT {{id: $parent}})
            ON CREATE SET parent.label = $parent, parent.synonyms = []
            MERGE (child)-[:{}]->(parent)
            "#,
            relation.rel_type()
        );
        let q = query(&cypher).param("child", child).param("parent", parent);
        self.run(q).await
    }

    /// Fetch concepts by id
    pub async fn get_concepts(&self, ids: &[String]) -> Result<Vec<Concept>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let q = query(
            r#"
            MATCH (c:CONCEPT)
            WHERE c.id IN $ids
            RETURN c.id AS id, coalesce(c.label, c.id) AS label,
                   coalesce(c.synonyms, []) AS synonyms, labels(c) AS labels
            "#,
        )
        .param("ids", ids.to_vec());
        let rows = self.execute_with_params(q).await?;
        rows.iter().map(row_to_concept).collect()
    }

    /// One-hop child → parent edges leaving any of `ids`
    pub async fn parent_edges(&self, ids: &[String]) -> Result<Vec<HierarchyEdge>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let cypher = format!(
            r#"
            MATCH (c:CONCEPT)-[:{}]->(p:CONCEPT)
            WHERE c.id IN $ids
            RETURN DISTINCT c.id AS child, p.id AS parent
            "#,
            HierarchyRelation::cypher_alternation()
        );
        let rows = self
            .execute_with_params(query(&cypher).param("ids", ids.to_vec()))
            .await?;
        edge_rows(&rows)
    }

    /// One-hop child → parent edges arriving at any of `ids`
    pub async fn child_edges(&self, ids: &[String]) -> Result<Vec<HierarchyEdge>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let cypher = format!(
            r#"
            MATCH (p:CONCEPT)<-[:{}]-(c:CONCEPT)
            WHERE p.id IN $ids
            RETURN DISTINCT c.id AS child, p.id AS parent
            "#,
            HierarchyRelation::cypher_alternation()
        );
        let rows = self
            .execute_with_params(query(&cypher).param("ids", ids.to_vec()))
            .await?;
        edge_rows(&rows)
    }

    /// List concepts with the datasets tagged with them for `application`
    pub async fn list_concepts(
        &self,
        application: &str,
        filter: &ConceptFilter,
    ) -> Result<Vec<ConceptSummary>> {
        let mut wb = WhereBuilder::new();
        if filter.include_categories.is_some() {
            wb.add_label_filter("c", "includes");
        }
        if filter.search_terms.is_some() {
            wb.add_term_filter("c", "search");
        }

        let cypher = format!(
            r#"
            MATCH (c:CONCEPT)
            {}
            OPTIONAL MATCH (c)<-[:TAGGED_WITH {{application: $application}}]-(d:DATASET)
            WITH c, collect(DISTINCT d.id) AS datasets
            RETURN c.id AS id, coalesce(c.label, c.id) AS label,
                   coalesce(c.synonyms, []) AS synonyms, labels(c) AS labels,
                   size(datasets) AS number_of_datasets_tagged, datasets
            ORDER BY number_of_datasets_tagged DESC, id
            "#,
            wb.build()
        );

        let mut q = query(&cypher).param("application", application);
        if let Some(ref includes) = filter.include_categories {
            q = q.param("includes", includes.clone());
        }
        if let Some(ref search) = filter.search_terms {
            q = q.param("search", search.clone());
        }

        let rows = self.execute_with_params(q).await?;
        rows.iter()
            .map(|row| {
                Ok(ConceptSummary {
                    concept: row_to_concept(row)?,
                    number_of_datasets_tagged: row.get("number_of_datasets_tagged")?,
                    datasets: row.get("datasets")?,
                })
            })
            .collect()
    }

    // ========================================================================
    // Tag queries
    // ========================================================================

    /// Distinct datasets tagged with any of `concept_ids`
    pub async fn datasets_tagged_with(
        &self,
        concept_ids: &[String],
        application: &str,
        within: Option<&[String]>,
    ) -> Result<Vec<String>> {
        if concept_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut wb = WhereBuilder::new();
        wb.add_id_in("c", "concepts");
        if within.is_some() {
            wb.add_id_in("d", "within");
        }
        let cypher = format!(
            r#"
            MATCH (d:DATASET)-[:TAGGED_WITH {{application: $application}}]->(c:CONCEPT)
            {}
            RETURN DISTINCT d.id AS id
            "#,
            wb.build()
        );
        let mut q = query(&cypher)
            .param("application", application)
            .param("concepts", concept_ids.to_vec());
        if let Some(within) = within {
            q = q.param("within", within.to_vec());
        }
        let rows = self.execute_with_params(q).await?;
        string_column(&rows, "id")
    }

    /// Tag rows of the given datasets
    pub async fn dataset_tag_rows(
        &self,
        dataset_ids: &[String],
        application: &str,
    ) -> Result<Vec<TagRow>> {
        if dataset_ids.is_empty() {
            return Ok(vec![]);
        }
        let q = query(
            r#"
            MATCH (d:DATASET)-[:TAGGED_WITH {application: $application}]->(c:CONCEPT)
            WHERE d.id IN $datasets
            RETURN DISTINCT d.id AS dataset, c.id AS concept
            "#,
        )
        .param("application", application)
        .param("datasets", dataset_ids.to_vec());
        let rows = self.execute_with_params(q).await?;
        tag_rows(&rows)
    }

    /// Tag rows of datasets tagged with any of `concept_ids`
    pub async fn tag_rows_for_concepts(
        &self,
        concept_ids: &[String],
        application: &str,
    ) -> Result<Vec<TagRow>> {
        if concept_ids.is_empty() {
            return Ok(vec![]);
        }
        let q = query(
            r#"
            MATCH (d:DATASET)-[:TAGGED_WITH {application: $application}]->(c:CONCEPT)
            WHERE c.id IN $concepts
            RETURN DISTINCT d.id AS dataset, c.id AS concept
            "#,
        )
        .param("application", application)
        .param("concepts", concept_ids.to_vec());
        let rows = self.execute_with_params(q).await?;
        tag_rows(&rows)
    }

    /// Datasets tagged with a concept whose label or synonym contains a term
    pub async fn datasets_matching_terms(
        &self,
        terms: &[String],
        application: &str,
    ) -> Result<Vec<String>> {
        if terms.is_empty() {
            return Ok(vec![]);
        }
        let mut wb = WhereBuilder::new();
        wb.add_term_filter("c", "search");
        let cypher = format!(
            r#"
            MATCH (d:DATASET)-[:TAGGED_WITH {{application: $application}}]->(c:CONCEPT)
            {}
            RETURN DISTINCT d.id AS id
            "#,
            wb.build()
        );
        let q = query(&cypher)
            .param("application", application)
            .param("search", terms.to_vec());
        let rows = self.execute_with_params(q).await?;
        string_column(&rows, "id")
    }

    // ========================================================================
    // Counters
    // ========================================================================

    /// Increment a dataset's `views`
    pub async fn increment_dataset_views(&self, dataset_id: &str) -> Result<bool> {
        let q = query(
            r#"
            MATCH (d:DATASET {id: $dataset})
            SET d.views = coalesce(d.views, 0) + 1
            RETURN d.views AS views
            "#,
        )
        .param("dataset", dataset_id);
        let rows = self.execute_with_params(q).await?;
        Ok(!rows.is_empty())
    }

    /// Upsert the user's VIEWED edge
    pub async fn record_user_view(&self, dataset_id: &str, user_id: &str) -> Result<bool> {
        let q = query(
            r#"
            MATCH (d:DATASET {id: $dataset})
            MERGE (u:USER {id: $user})
            MERGE (u)-[r:VIEWED]->(d)
            ON CREATE SET r.views = 1
            ON MATCH SET r.views = coalesce(r.views, 0) + 1
            RETURN r.views AS views
            "#,
        )
        .param("dataset", dataset_id)
        .param("user", user_id);
        let rows = self.execute_with_params(q).await?;
        Ok(!rows.is_empty())
    }

    /// Current `views` of a dataset
    pub async fn dataset_views(&self, dataset_id: &str) -> Result<Option<i64>> {
        let q = query(
            r#"
            MATCH (d:DATASET {id: $dataset})
            RETURN coalesce(d.views, 0) AS views
            "#,
        )
        .param("dataset", dataset_id);
        let rows = self.execute_with_params(q).await?;
        match rows.first() {
            Some(row) => Ok(Some(row.get("views")?)),
            None => Ok(None),
        }
    }

    /// Current `views` on a user's VIEWED edge
    pub async fn user_dataset_views(&self, user_id: &str, dataset_id: &str) -> Result<Option<i64>> {
        let q = query(
            r#"
            MATCH (:USER {id: $user})-[r:VIEWED]->(:DATASET {id: $dataset})
            RETURN coalesce(r.views, 0) AS views
            "#,
        )
        .param("dataset", dataset_id)
        .param("user", user_id);
        let rows = self.execute_with_params(q).await?;
        match rows.first() {
            Some(row) => Ok(Some(row.get("views")?)),
            None => Ok(None),
        }
    }

    /// Favourite counts per dataset for `application`
    pub async fn favourite_counts(&self, application: &str) -> Result<Vec<DatasetCount>> {
        let q = query(
            r#"
            MATCH (:USER)-[:FAVOURITE {application: $application}]->(d:DATASET)
            RETURN d.id AS dataset, count(*) AS count
            "#,
        )
        .param("application", application);
        let rows = self.execute_with_params(q).await?;
        count_rows(&rows)
    }

    /// Favourite counts across applications, zero included
    pub async fn favourite_totals(&self, within: Option<&[String]>) -> Result<Vec<DatasetCount>> {
        let mut wb = WhereBuilder::new();
        if within.is_some() {
            wb.add_id_in("d", "within");
        }
        let cypher = format!(
            r#"
            MATCH (d:DATASET)
            {}
            OPTIONAL MATCH (d)<-[f:FAVOURITE]-(:USER)
            RETURN d.id AS dataset, count(f) AS count
            "#,
            wb.build()
        );
        let mut q = query(&cypher);
        if let Some(within) = within {
            q = q.param("within", within.to_vec());
        }
        let rows = self.execute_with_params(q).await?;
        count_rows(&rows)
    }

    /// Dataset view counters
    pub async fn view_counts(&self, within: Option<&[String]>) -> Result<Vec<DatasetCount>> {
        let mut wb = WhereBuilder::new();
        if within.is_some() {
            wb.add_id_in("d", "within");
        }
        let cypher = format!(
            r#"
            MATCH (d:DATASET)
            {}
            RETURN d.id AS dataset, coalesce(d.views, 0) AS count
            "#,
            wb.build()
        );
        let mut q = query(&cypher);
        if let Some(within) = within {
            q = q.param("within", within.to_vec());
        }
        let rows = self.execute_with_params(q).await?;
        count_rows(&rows)
    }

    /// Per-user view counters
    pub async fn user_view_counts(&self, user_id: &str) -> Result<Vec<DatasetCount>> {
        let q = query(
            r#"
            MATCH (:USER {id: $user})-[r:VIEWED]->(d:DATASET)
            RETURN d.id AS dataset, coalesce(r.views, 0) AS count
            "#,
        )
        .param("user", user_id);
        let rows = self.execute_with_params(q).await?;
        count_rows(&rows)
    }
}
