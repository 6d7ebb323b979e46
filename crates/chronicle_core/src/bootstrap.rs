//! Schema bootstrapping.
//!
//! Runs the migration scripts that put the `entity`, `entity_version` and
//! `key_value` tables in place before the engine is used. Scripts use
//! conditional DDL, so re-running the bootstrapper is harmless.

use crate::error::CoreResult;
use chronicle_gateway::StorageGateway;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Runs ordered DDL scripts against the primary gateway.
///
/// Scripts are discovered in the configured directories by their file
/// names: `<number>-<name>.sql`, e.g. `1-create-entity-tables.sql`. They
/// are executed sequentially in ascending numeric order, failing fast on
/// the first error. Files that don't match the convention are ignored.
pub struct SchemaBootstrapper {
    gateway: Arc<dyn StorageGateway>,
    dirs: Vec<PathBuf>,
}

impl SchemaBootstrapper {
    /// Creates a bootstrapper over the given gateway.
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        Self {
            gateway,
            dirs: Vec::new(),
        }
    }

    /// Adds a directory to scan for migration scripts.
    #[must_use]
    pub fn add_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    /// Discovers and runs all pending scripts.
    ///
    /// Returns the number of scripts executed.
    ///
    /// # Errors
    ///
    /// Fails on unreadable directories or files and on the first script
    /// the gateway rejects; later scripts are not attempted.
    pub async fn run(&self) -> CoreResult<usize> {
        let scripts = self.discover()?;
        for script in &scripts {
            let sql = std::fs::read_to_string(&script.path)?;
            info!(script = %script.path.display(), "running migration");
            self.gateway.run_script(&sql).await?;
        }
        Ok(scripts.len())
    }

    fn discover(&self) -> CoreResult<Vec<Script>> {
        let mut scripts = Vec::new();
        for dir in &self.dirs {
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if let Some(number) = script_number(&path) {
                    scripts.push(Script { number, path });
                }
            }
        }
        scripts.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.path.cmp(&b.path)));
        Ok(scripts)
    }
}

struct Script {
    number: u64,
    path: PathBuf,
}

/// Parses the numeric prefix of `<number>-<name>.sql`; `None` when the
/// file doesn't follow the convention.
fn script_number(path: &Path) -> Option<u64> {
    if path.extension()? != "sql" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.split('-').next()?.parse().ok()
}

impl std::fmt::Debug for SchemaBootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaBootstrapper")
            .field("dirs", &self.dirs)
            .finish_non_exhaustive()
    }
}
