//! Schema lifecycle management.
//!
//! Brings the target schema to a known-empty state before a load and
//! publishes the graph views once every batch has landed. Teardown runs in
//! dependency order (published graph views first, then remaining views,
//! then base tables) because the engine refuses to drop a table still
//! referenced by a live view. Every teardown step is best-effort: a failed
//! drop is logged and the remaining steps continue, since cleanup must not
//! block a fresh load.

use crate::store::{GraphStore, StoreError};

/// Base table holding node rows.
pub const NODE_TABLE: &str = "graph_node";
/// Base table holding edge rows.
pub const EDGE_TABLE: &str = "graph_edge";

pub struct SchemaManager<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    database: String,
    graph_name: String,
}

impl<'a, S: GraphStore + ?Sized> SchemaManager<'a, S> {
    pub fn new(store: &'a S, database: &str, graph_name: &str) -> Self {
        Self {
            store,
            database: database.to_string(),
            graph_name: graph_name.to_string(),
        }
    }

    fn nodes_view(&self) -> String {
        format!("{}_nodes", self.graph_name)
    }

    fn edges_view(&self) -> String {
        format!("{}_edges", self.graph_name)
    }

    /// Drop everything a prior run may have left behind.
    pub async fn teardown(&self) {
        for view in [self.nodes_view(), self.edges_view()] {
            let statement = format!("DROP VIEW IF EXISTS {}.{}", self.database, view);
            if let Err(e) = self.store.execute_ddl(&statement).await {
                log::warn!("failed to drop graph view {}: {}", view, e);
            }
        }

        match self.list_objects("engine = 'View'").await {
            Ok(views) => {
                for view in views {
                    let statement = format!("DROP VIEW IF EXISTS {}.{}", self.database, view);
                    if let Err(e) = self.store.execute_ddl(&statement).await {
                        log::warn!("failed to drop view {}: {}", view, e);
                    }
                }
            }
            Err(e) => log::warn!("failed to list views for teardown: {}", e),
        }

        match self
            .list_objects("engine NOT IN ('View', 'MaterializedView')")
            .await
        {
            Ok(tables) => {
                for table in tables {
                    let statement = format!("DROP TABLE IF EXISTS {}.{}", self.database, table);
                    if let Err(e) = self.store.execute_ddl(&statement).await {
                        log::warn!("failed to drop table {}: {}", table, e);
                    }
                }
            }
            Err(e) => log::warn!("failed to list tables for teardown: {}", e),
        }

        log::info!("schema teardown of `{}` complete", self.database);
    }

    /// Create the database and the node/edge base tables.
    ///
    /// The tables are keyed by node id / edge id so that re-running a load
    /// upserts rows with the same identity instead of duplicating them.
    pub async fn create_base_tables(&self) -> Result<(), StoreError> {
        self.store
            .execute_ddl(&format!("CREATE DATABASE IF NOT EXISTS {}", self.database))
            .await?;

        self.store
            .execute_ddl(&format!(
                "CREATE TABLE IF NOT EXISTS {}.{} \
                 (id String, label String, properties String) \
                 ENGINE = ReplacingMergeTree ORDER BY id",
                self.database, NODE_TABLE
            ))
            .await?;

        self.store
            .execute_ddl(&format!(
                "CREATE TABLE IF NOT EXISTS {}.{} \
                 (id String, dest_id String, label String, edge_id String, properties String) \
                 ENGINE = ReplacingMergeTree ORDER BY edge_id",
                self.database, EDGE_TABLE
            ))
            .await?;

        log::info!(
            "created base tables {}.{} and {}.{}",
            self.database,
            NODE_TABLE,
            self.database,
            EDGE_TABLE
        );
        Ok(())
    }

    /// Publish the graph views over the base tables. Runs only after every
    /// node and edge batch has been applied.
    pub async fn publish_graph(&self) -> Result<(), StoreError> {
        self.store
            .execute_ddl(&format!(
                "CREATE VIEW {}.{} AS SELECT id, label, properties FROM {}.{}",
                self.database,
                self.nodes_view(),
                self.database,
                NODE_TABLE
            ))
            .await?;

        self.store
            .execute_ddl(&format!(
                "CREATE VIEW {}.{} AS \
                 SELECT id, dest_id, label, edge_id, properties FROM {}.{}",
                self.database,
                self.edges_view(),
                self.database,
                EDGE_TABLE
            ))
            .await?;

        log::info!(
            "published graph views {}.{} and {}.{}",
            self.database,
            self.nodes_view(),
            self.database,
            self.edges_view()
        );
        Ok(())
    }

    async fn list_objects(&self, engine_filter: &str) -> Result<Vec<String>, StoreError> {
        let query = format!(
            "SELECT name FROM system.tables WHERE database = '{}' AND {} ORDER BY name",
            self.database, engine_filter
        );
        self.store.fetch_names(&query).await
    }
}
