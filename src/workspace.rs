//! Build staging area
//!
//! The working directory is deleted and recreated before each build. Two
//! builds must never share a working directory; nothing here locks it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::PublishConfig;
use crate::error::{PublishError, Result};
use crate::schema::SchemaCatalog;

/// Subdirectory of the working directory holding worker manifests
pub const MANIFEST_DIR: &str = "manifests";

/// A freshly staged build: clean working directory plus the schema catalog
#[derive(Debug)]
pub struct Workspace {
    work_dir: PathBuf,
    catalog: SchemaCatalog,
}

impl Workspace {
    /// Recreate the working directory and list the four schema categories
    pub fn create(config: &PublishConfig) -> Result<Self> {
        let work_dir = config.work_dir();
        recreate_dir(&work_dir)?;
        recreate_dir(&work_dir.join(MANIFEST_DIR))?;

        let catalog = SchemaCatalog::scan(
            &config.schema_roots(),
            &config.paths.extension,
            &config.naming.vendor_prefixes,
        )?;
        info!(
            work_dir = %work_dir.display(),
            schemas = catalog.len(),
            "working structure created"
        );

        Ok(Self { work_dir, catalog })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.work_dir.join(MANIFEST_DIR)
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }
}

/// Delete `dir` (if present) and create it empty
pub fn recreate_dir(dir: &Path) -> Result<()> {
    let structure_err = |source| PublishError::Structure {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(structure_err)?;
    }
    fs::create_dir_all(dir).map_err(structure_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_recreates_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PublishConfig::default();
        config.paths.work_dir = dir.path().join("work");
        config.paths.service_objects = dir.path().join("services");
        fs::create_dir_all(dir.path().join("services")).unwrap();
        fs::write(dir.path().join("services/OrderService.thrift"), "service OrderService {}").unwrap();

        fs::create_dir_all(dir.path().join("work/stale")).unwrap();
        fs::write(dir.path().join("work/stale/old.java"), "").unwrap();

        let workspace = Workspace::create(&config).unwrap();
        assert!(!dir.path().join("work/stale").exists());
        assert!(workspace.manifest_dir().is_dir());
        assert_eq!(workspace.catalog().len(), 1);
    }

    #[test]
    fn test_uncreatable_work_dir_is_structure_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let result = recreate_dir(&blocker.join("work"));
        assert!(matches!(result, Err(PublishError::Structure { .. })));
    }
}
