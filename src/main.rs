//! Concept Graph - command line
//!
//! Runs the tagging, hierarchy, search and ranking operations against a
//! Neo4j graph and prints JSON.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use concept_graph::authority::AuthorityScope;
use concept_graph::filter::Page;
use concept_graph::neo4j::{Concept, ConceptFilter, HierarchyRelation, ResourceRef, ResourceType};
use concept_graph::query::SearchRequest;
use concept_graph::{AppState, Config};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "concept-graph")]
#[command(about = "Concept tagging graph over Neo4j")]
struct Cli {
    /// Path to the YAML config file (defaults to ./config.yaml)
    #[arg(long, env = "CONCEPT_GRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Visibility filters forwarded to the Resource Authority
#[derive(Args)]
struct ScopeArgs {
    #[arg(long)]
    published: Option<String>,

    #[arg(long)]
    env: Option<String>,
}

impl ScopeArgs {
    fn scope(&self) -> AuthorityScope {
        AuthorityScope::from_request(self.published.as_deref(), self.env.as_deref())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Tag a resource with concepts
    Tag {
        /// DATASET, WIDGET, LAYER or METADATA (any case)
        resource_type: String,
        id: String,
        /// Concept ids (comma-separated)
        #[arg(value_delimiter = ',', required = true)]
        concepts: Vec<String>,
        #[arg(short, long)]
        application: Option<String>,
    },

    /// Remove a resource's tags (all applications when none is given)
    Untag {
        resource_type: String,
        id: String,
        #[arg(short, long)]
        application: Option<String>,
    },

    /// List the concepts a resource is tagged with
    Tags {
        resource_type: String,
        id: String,
        #[arg(short, long)]
        application: Option<String>,
    },

    /// Mark a resource as a user's favourite
    Favourite {
        user: String,
        resource_type: String,
        id: String,
        #[arg(short, long)]
        application: Option<String>,
    },

    /// Remove a user's favourite
    Unfavourite {
        user: String,
        resource_type: String,
        id: String,
        #[arg(short, long)]
        application: Option<String>,
    },

    /// Create a dataset node
    Dataset { id: String },

    /// Attach a widget, layer or metadata node to its parent
    Attach {
        child_type: String,
        child_id: String,
        parent_type: String,
        parent_id: String,
    },

    /// Delete a resource and everything that belongs to it
    Delete { resource_type: String, id: String },

    /// Define or update a concept
    Concept {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long, value_delimiter = ',')]
        synonyms: Vec<String>,
        /// Category labels, e.g. TOPIC,GEOGRAPHY
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
    },

    /// Add a hierarchy edge child -> parent
    Link {
        child: String,
        parent: String,
        /// PART_OF, IS_A, QUALITY_OF or TYPE_OF
        #[arg(short, long, default_value = "IS_A")]
        relation: String,
    },

    /// Search datasets by concept groups (OR inside a group, AND across groups)
    Search {
        /// A concept group, comma-separated; repeat for up to three groups
        #[arg(short, long = "group", required = true)]
        groups: Vec<String>,
        #[arg(short, long)]
        application: Option<String>,
        #[arg(long)]
        depth: Option<u32>,
        /// Popularity sort: most-viewed, most-favorited, prefix '-' for descending
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, default_value = "0")]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Search datasets by concept label or synonym
    Label {
        #[arg(required = true)]
        terms: Vec<String>,
        #[arg(short, long)]
        application: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Datasets similar to a reference set
    Similar {
        /// Reference dataset ids (comma-separated)
        #[arg(value_delimiter = ',', required = true)]
        datasets: Vec<String>,
        #[arg(short, long)]
        application: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Also count ancestor/descendant concepts as shared
        #[arg(long)]
        expand: bool,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// List concepts with their tagged datasets
    Concepts {
        #[arg(short, long)]
        application: Option<String>,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        search: Vec<String>,
    },

    /// Concepts plus all their ancestors
    Inferred {
        #[arg(value_delimiter = ',', required = true)]
        concepts: Vec<String>,
    },

    /// Record a dataset visit
    Visit {
        dataset: String,
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Datasets by favourite count
    MostLiked {
        #[arg(short, long)]
        application: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Datasets by view count, globally or for one user
    MostViewed {
        #[arg(short, long)]
        application: Option<String>,
        #[arg(short, long)]
        user: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Rank datasets by popularity
    Sort {
        /// most-viewed or most-favorited, prefix '-' for descending
        #[arg(allow_hyphen_values = true)]
        criterion: String,
        /// Restrict the ranking to these dataset ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        within: Option<Vec<String>>,
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,concept_graph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    let state = AppState::new(config).await?;
    tracing::debug!("Connected to graph store");

    run(&state, cli.command).await
}

fn resource(resource_type: &str, id: String) -> Result<ResourceRef> {
    Ok(ResourceRef::new(resource_type.parse::<ResourceType>()?, id))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Tag {
            resource_type,
            id,
            concepts,
            application,
        } => {
            let target = resource(&resource_type, id)?;
            let app = state.query.application(application.as_deref());
            let applied = state.tagging.tag(&target, &concepts, app).await?;
            print_json(&serde_json::json!({ "resource": target, "application": app, "concepts": applied }))
        }

        Commands::Untag {
            resource_type,
            id,
            application,
        } => {
            let target = resource(&resource_type, id)?;
            state.tagging.untag(&target, application.as_deref()).await?;
            print_json(&serde_json::json!({ "resource": target, "untagged": true }))
        }

        Commands::Tags {
            resource_type,
            id,
            application,
        } => {
            let target = resource(&resource_type, id)?;
            print_json(&state.tagging.tags_of(&target, application.as_deref()).await?)
        }

        Commands::Favourite {
            user,
            resource_type,
            id,
            application,
        } => {
            let target = resource(&resource_type, id)?;
            let app = state.query.application(application.as_deref());
            state.tagging.favourite(&user, &target, app).await?;
            print_json(&serde_json::json!({ "user": user, "resource": target, "favourite": true }))
        }

        Commands::Unfavourite {
            user,
            resource_type,
            id,
            application,
        } => {
            let target = resource(&resource_type, id)?;
            let app = state.query.application(application.as_deref());
            state.tagging.unfavourite(&user, &target, app).await?;
            print_json(&serde_json::json!({ "user": user, "resource": target, "favourite": false }))
        }

        Commands::Dataset { id } => print_json(&state.resources.create_dataset(&id).await?),

        Commands::Attach {
            child_type,
            child_id,
            parent_type,
            parent_id,
        } => {
            let child = resource(&child_type, child_id)?;
            let parent = resource(&parent_type, parent_id)?;
            state.resources.attach(&child, &parent).await?;
            print_json(&serde_json::json!({ "child": child, "parent": parent }))
        }

        Commands::Delete { resource_type, id } => {
            let target = resource(&resource_type, id)?;
            let removed = state.resources.delete(&target).await?;
            print_json(&serde_json::json!({ "resource": target, "removed": removed }))
        }

        Commands::Concept {
            id,
            label,
            synonyms,
            categories,
        } => {
            let mut labels = vec!["CONCEPT".to_string()];
            labels.extend(categories.into_iter().map(|c| c.to_ascii_uppercase()));
            let concept = Concept {
                label: label.unwrap_or_else(|| id.clone()),
                id,
                synonyms,
                labels,
            };
            state.hierarchy.define_concept(&concept).await?;
            print_json(&concept)
        }

        Commands::Link {
            child,
            parent,
            relation,
        } => {
            let relation: HierarchyRelation = relation.parse()?;
            state.hierarchy.link(&child, &parent, relation).await?;
            print_json(&serde_json::json!({ "child": child, "parent": parent, "relation": relation }))
        }

        Commands::Search {
            groups,
            application,
            depth,
            sort,
            offset,
            limit,
            scope,
        } => {
            let request = SearchRequest {
                groups: groups
                    .iter()
                    .map(|g| g.split(',').map(|c| c.trim().to_string()).collect())
                    .collect(),
                application,
                depth,
                sort,
                page: Page::new(offset, limit),
            };
            print_json(&state.query.search_datasets(&request, &scope.scope()).await?)
        }

        Commands::Label {
            terms,
            application,
            scope,
        } => print_json(
            &state
                .query
                .search_by_label(&terms, application.as_deref(), &scope.scope())
                .await?,
        ),

        Commands::Similar {
            datasets,
            application,
            limit,
            expand,
            scope,
        } => print_json(
            &state
                .query
                .similar_datasets(&datasets, application.as_deref(), limit, expand, &scope.scope())
                .await?,
        ),

        Commands::Concepts {
            application,
            categories,
            search,
        } => {
            let filter = ConceptFilter {
                include_categories: Some(categories),
                search_terms: Some(search),
            };
            print_json(&state.query.concepts(application.as_deref(), filter).await?)
        }

        Commands::Inferred { concepts } => {
            print_json(&state.query.inferred_concepts(&concepts).await?)
        }

        Commands::Visit { dataset, user } => {
            state.counters.visit(&dataset, user.as_deref()).await?;
            print_json(&serde_json::json!({ "dataset": dataset, "visited": true }))
        }

        Commands::MostLiked { application, scope } => print_json(
            &state
                .query
                .most_liked(application.as_deref(), &scope.scope())
                .await?,
        ),

        Commands::MostViewed {
            application,
            user,
            scope,
        } => {
            let counts = match user {
                Some(user) => {
                    state
                        .query
                        .most_viewed_by(&user, application.as_deref(), &scope.scope())
                        .await?
                }
                None => {
                    state
                        .query
                        .most_viewed(application.as_deref(), &scope.scope())
                        .await?
                }
            };
            print_json(&counts)
        }

        Commands::Sort {
            criterion,
            within,
            scope,
        } => print_json(
            &state
                .query
                .sorted_datasets(&criterion, within.as_deref(), &scope.scope())
                .await?,
        ),
    }
}
