//! ClickHouse implementation of [`GraphStore`].

use async_trait::async_trait;
use clickhouse::Client;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::store::{GraphStore, StoreError};

/// Graph store backed by a ClickHouse database.
pub struct ClickHouseStore {
    client: Client,
    database: String,
}

impl ClickHouseStore {
    /// Build a client from connection settings. Table names passed to
    /// [`GraphStore::apply_batch`] and [`GraphStore::count`] are qualified
    /// with the configured database; DDL and introspection statements are
    /// expected to arrive fully qualified.
    pub fn connect(config: &ConnectionConfig) -> Self {
        let client = Client::default()
            .with_url(&config.url)
            .with_user(&config.user)
            .with_password(&config.password);

        Self {
            client,
            database: config.database.clone(),
        }
    }

    fn qualified(&self, table: &str) -> String {
        format!("{}.{}", self.database, table)
    }
}

#[async_trait]
impl GraphStore for ClickHouseStore {
    async fn execute_ddl(&self, statement: &str) -> Result<(), StoreError> {
        log::debug!("executing DDL: {}", statement);
        self.client
            .query(statement)
            .execute()
            .await
            .map_err(|e| StoreError::Schema {
                statement: statement.to_string(),
                source: Box::new(e),
            })
    }

    async fn fetch_names(&self, query: &str) -> Result<Vec<String>, StoreError> {
        #[derive(Debug, clickhouse::Row, serde::Deserialize)]
        struct Name {
            name: String,
        }

        let rows: Vec<Name> = self
            .client
            .query(query)
            .fetch_all()
            .await
            .map_err(|e| StoreError::Query {
                query: query.to_string(),
                source: Box::new(e),
            })?;

        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    async fn apply_batch(
        &self,
        table: &str,
        columns: &[&'static str],
        rows: &[Vec<Value>],
    ) -> Result<(), StoreError> {
        let statement = insert_statement(&self.qualified(table), columns, rows);
        self.client
            .query(&statement)
            .execute()
            .await
            .map_err(|e| StoreError::Insert {
                table: table.to_string(),
                source: Box::new(e),
            })
    }

    async fn count(&self, table: &str) -> Result<u64, StoreError> {
        let query = format!("SELECT count() FROM {}", self.qualified(table));
        self.client
            .query(&query)
            .fetch_one()
            .await
            .map_err(|e| StoreError::Query {
                query,
                source: Box::new(e),
            })
    }
}

/// Render one chunk as a single `INSERT ... VALUES` statement.
fn insert_statement(table: &str, columns: &[&str], rows: &[Vec<Value>]) -> String {
    let values = rows
        .iter()
        .map(|row| {
            let rendered = row.iter().map(sql_literal).collect::<Vec<_>>().join(", ");
            format!("({})", rendered)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        table,
        columns.join(", "),
        values
    )
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", escape(s)),
        other => format!("'{}'", escape(&other.to_string())),
    }
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}
