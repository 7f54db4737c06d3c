//! Two-phase load pipeline.
//!
//! Phase 1 transforms and writes every entity table, populating the
//! identity registry; phase 2 transforms and writes every relationship
//! table against the completed registry. The phase boundary is what makes
//! the entities-before-relationships ordering dependency explicit instead
//! of relying on manifest file order being "correct by convention".
//!
//! Error policy: a structural problem in one table (missing identity
//! column, bad property value, unreadable file) fails that table and its
//! siblings continue; a batch-write failure halts the whole run, because
//! the graph views published at the end assume complete node/edge data.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::LoaderConfig;
use crate::manifest::{EntityTable, LoadManifest, RelationshipTable};
use crate::source::CsvSource;
use crate::store::schema::{EDGE_TABLE, NODE_TABLE};
use crate::store::{BatchWriter, GraphStore, SchemaManager};
use crate::transform::{
    edges_from_rows, nodes_from_rows, Edge, EndpointColumns, IdentityRegistry, Node,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Entity,
    Relationship,
}

/// What happened to one source table.
#[derive(Debug)]
pub struct TableReport {
    pub file: String,
    pub label: String,
    pub kind: TableKind,
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub duplicates_dropped: usize,
    pub dangling_dropped: usize,
    pub batches: usize,
    pub error: Option<String>,
}

impl TableReport {
    fn new(file: &str, label: &str, kind: TableKind) -> Self {
        Self {
            file: file.to_string(),
            label: label.to_string(),
            kind,
            rows_read: 0,
            rows_loaded: 0,
            duplicates_dropped: 0,
            dangling_dropped: 0,
            batches: 0,
            error: None,
        }
    }

    fn failed(mut self, file: &str, error: impl std::fmt::Display) -> Self {
        log::error!("skipping `{}`: {}", file, error);
        self.error = Some(error.to_string());
        self
    }
}

/// The outcome of one run, table by table.
#[derive(Debug)]
pub struct LoadReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<TableReport>,
    /// Row counts read back from the store after the load (absent on dry
    /// runs or when verification itself failed).
    pub node_total: Option<u64>,
    pub edge_total: Option<u64>,
}

impl LoadReport {
    pub fn failed_tables(&self) -> Vec<&TableReport> {
        self.tables.iter().filter(|t| t.error.is_some()).collect()
    }

    pub fn log_summary(&self) {
        for table in &self.tables {
            match &table.error {
                Some(error) => {
                    log::error!("{} ({}): FAILED: {}", table.file, table.label, error)
                }
                None => log::info!(
                    "{} ({}): {} read, {} loaded in {} batches, {} duplicates dropped, {} dangling dropped",
                    table.file,
                    table.label,
                    table.rows_read,
                    table.rows_loaded,
                    table.batches,
                    table.duplicates_dropped,
                    table.dangling_dropped
                ),
            }
        }
        if let (Some(nodes), Some(edges)) = (self.node_total, self.edge_total) {
            log::info!("store now holds {} nodes and {} edges", nodes, edges);
        }
        let failed = self.failed_tables().len();
        if failed > 0 {
            log::warn!(
                "{} of {} tables failed; the graph is incomplete",
                failed,
                self.tables.len()
            );
        }
    }
}

/// Drives one import run end to end.
pub struct Loader<S: GraphStore> {
    store: S,
    database: String,
    config: LoaderConfig,
    manifest: LoadManifest,
}

impl<S: GraphStore> Loader<S> {
    pub fn new(store: S, database: &str, config: LoaderConfig, manifest: LoadManifest) -> Self {
        Self {
            store,
            database: database.to_string(),
            config,
            manifest,
        }
    }

    pub async fn run(&self) -> anyhow::Result<LoadReport> {
        let started_at = Utc::now();
        log::info!(
            "starting load `{}` into `{}` ({} entity tables, {} relationship tables)",
            self.manifest.name,
            self.database,
            self.manifest.entities.len(),
            self.manifest.relationships.len()
        );

        let schema = SchemaManager::new(&self.store, &self.database, &self.config.graph_name);
        if self.config.dry_run {
            log::info!("dry run: skipping schema management and writes");
        } else {
            if self.config.keep_schema {
                log::info!("--keep-schema: skipping teardown");
            } else {
                schema.teardown().await;
            }
            schema
                .create_base_tables()
                .await
                .context("failed to create base tables")?;
        }

        let source = CsvSource::new(&self.config.data_dir);
        let writer = BatchWriter::new(&self.store, self.config.max_mutations);
        let mut registry = IdentityRegistry::new();
        let mut tables = Vec::new();

        for entity in &self.manifest.entities {
            let report = self
                .load_entity(&source, &writer, &mut registry, entity)
                .await?;
            tables.push(report);
        }
        log::info!(
            "entity phase complete: {} node identities registered",
            registry.len()
        );

        for relationship in &self.manifest.relationships {
            let report = self
                .load_relationship(&source, &writer, &registry, relationship)
                .await?;
            tables.push(report);
        }

        let (node_total, edge_total) = if self.config.dry_run {
            (None, None)
        } else {
            schema
                .publish_graph()
                .await
                .context("failed to publish graph views")?;
            (
                self.verified_count(NODE_TABLE).await,
                self.verified_count(EDGE_TABLE).await,
            )
        };

        let report = LoadReport {
            started_at,
            finished_at: Utc::now(),
            tables,
            node_total,
            edge_total,
        };
        report.log_summary();
        Ok(report)
    }

    async fn load_entity(
        &self,
        source: &CsvSource,
        writer: &BatchWriter<'_, S>,
        registry: &mut IdentityRegistry,
        entity: &EntityTable,
    ) -> anyhow::Result<TableReport> {
        let mut report = TableReport::new(&entity.file, &entity.label, TableKind::Entity);

        let rows = match source.read_table(&entity.file) {
            Ok(rows) => rows,
            Err(e) => return Ok(report.failed(&entity.file, e)),
        };
        report.rows_read = rows.len();

        let batch = match nodes_from_rows(
            &entity.file,
            &entity.label,
            rows,
            entity.id_column.as_deref(),
            registry,
        ) {
            Ok(batch) => batch,
            Err(e) => return Ok(report.failed(&entity.file, e)),
        };
        report.duplicates_dropped = batch.duplicates_dropped;
        if batch.duplicates_dropped > 0 {
            log::warn!(
                "dropped {} duplicate node rows from `{}`",
                batch.duplicates_dropped,
                entity.file
            );
        }

        if self.config.dry_run {
            report.rows_loaded = batch.nodes.len();
            return Ok(report);
        }

        let values: Vec<Vec<Value>> = batch.nodes.into_iter().map(Node::into_values).collect();
        let stats = writer
            .write(NODE_TABLE, &Node::COLUMNS, &values)
            .await
            .with_context(|| format!("batch write failed while loading `{}`", entity.file))?;
        report.rows_loaded = stats.rows;
        report.batches = stats.batches;
        Ok(report)
    }

    async fn load_relationship(
        &self,
        source: &CsvSource,
        writer: &BatchWriter<'_, S>,
        registry: &IdentityRegistry,
        relationship: &RelationshipTable,
    ) -> anyhow::Result<TableReport> {
        let mut report =
            TableReport::new(&relationship.file, &relationship.label, TableKind::Relationship);

        let rows = match source.read_table(&relationship.file) {
            Ok(rows) => rows,
            Err(e) => return Ok(report.failed(&relationship.file, e)),
        };
        report.rows_read = rows.len();

        let endpoints = EndpointColumns {
            source: relationship.source_column.clone(),
            dest: relationship.dest_column.clone(),
        };
        let batch = match edges_from_rows(
            &relationship.file,
            &relationship.label,
            rows,
            &endpoints,
            registry,
        ) {
            Ok(batch) => batch,
            Err(e) => return Ok(report.failed(&relationship.file, e)),
        };
        report.duplicates_dropped = batch.duplicates_dropped;
        report.dangling_dropped = batch.dangling_dropped;
        if batch.dangling_dropped > 0 {
            log::warn!(
                "dropped {} rows from `{}` whose source endpoint has no node",
                batch.dangling_dropped,
                relationship.file
            );
        }

        if self.config.dry_run {
            report.rows_loaded = batch.edges.len();
            return Ok(report);
        }

        let values: Vec<Vec<Value>> = batch.edges.into_iter().map(Edge::into_values).collect();
        let stats = writer
            .write(EDGE_TABLE, &Edge::COLUMNS, &values)
            .await
            .with_context(|| format!("batch write failed while loading `{}`", relationship.file))?;
        report.rows_loaded = stats.rows;
        report.batches = stats.batches;
        Ok(report)
    }

    async fn verified_count(&self, table: &str) -> Option<u64> {
        match self.store.count(table).await {
            Ok(count) => Some(count),
            Err(e) => {
                log::warn!("post-load count of `{}` failed: {}", table, e);
                None
            }
        }
    }
}
