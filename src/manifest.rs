//! Load manifest.
//!
//! The manifest is the explicit contract describing one load: which files
//! are entity tables, which are relationship tables, what label each one
//! carries, and, where column-order inference would be brittle, which
//! columns play the identity and endpoint roles. Entity tables are listed
//! before relationships by construction: the pipeline runs all entities in
//! phase 1 and all relationships in phase 2 regardless of file order.
//!
//! ```yaml
//! name: paysim
//! version: "1.0"
//! entities:
//!   - file: clients.csv
//!     label: client
//!   - file: transactions_cleaned.csv
//!     label: transaction
//!     id_column: globalstep
//! relationships:
//!   - file: Client_Perform_Transaction.csv
//!     label: performs
//!   - file: Has_Email.csv
//!     label: has_email
//!     source_column: client_id
//!     dest_column: email_id
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file `{path}`: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse manifest `{path}`: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid manifest: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub entities: Vec<EntityTable>,
    #[serde(default)]
    pub relationships: Vec<RelationshipTable>,
}

/// One entity table: its rows become nodes labeled `label`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTable {
    pub file: String,
    pub label: String,
    /// Identity column override; defaults to the first id-suffixed column.
    #[serde(default)]
    pub id_column: Option<String>,
}

/// One relationship table: its rows become edges labeled `label`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipTable {
    pub file: String,
    pub label: String,
    /// Source endpoint column override; defaults to the first id-suffixed
    /// column.
    #[serde(default)]
    pub source_column: Option<String>,
    /// Destination endpoint column override; defaults to the second
    /// id-suffixed column.
    #[serde(default)]
    pub dest_column: Option<String>,
}

impl LoadManifest {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let display_path = path.as_ref().display().to_string();

        let content = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: display_path.clone(),
            source,
        })?;

        let manifest: Self =
            serde_yaml::from_str(&content).map_err(|source| ManifestError::Parse {
                path: display_path,
                source,
            })?;

        manifest.validate_structure()?;
        Ok(manifest)
    }

    fn validate_structure(&self) -> Result<(), ManifestError> {
        if self.entities.is_empty() && self.relationships.is_empty() {
            return Err(ManifestError::Invalid {
                message: "manifest lists no tables".to_string(),
            });
        }
        for entity in &self.entities {
            if entity.label.trim().is_empty() {
                return Err(ManifestError::Invalid {
                    message: format!("entity table `{}` has an empty label", entity.file),
                });
            }
        }
        for relationship in &self.relationships {
            if relationship.label.trim().is_empty() {
                return Err(ManifestError::Invalid {
                    message: format!(
                        "relationship table `{}` has an empty label",
                        relationship.file
                    ),
                });
            }
        }
        Ok(())
    }
}
