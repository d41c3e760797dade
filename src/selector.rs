//! Working set selection
//!
//! Decides which schema files a build processes. Selection is a single
//! function of (mode, catalog, VCS answer); nothing is accumulated across
//! branches.

use std::fmt;

use tracing::{info, warn};

use crate::config::PublishConfig;
use crate::error::{PublishError, Result};
use crate::schema::{normalize_name, SchemaArtifact, SchemaCatalog};
use crate::vcs::VcsProvider;

/// How the working set is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Exactly one schema file, by normalized name
    Override(String),
    /// Every schema file under the configured roots
    Full,
    /// Files changed since the published baseline
    Incremental,
}

impl BuildMode {
    /// Mode implied by configuration, in priority order: explicit override,
    /// then full scan when VCS is off or the run is local, else incremental.
    pub fn from_config(config: &PublishConfig) -> Self {
        if let Some(name) = &config.service_override {
            BuildMode::Override(normalize_name(name, &config.naming.vendor_prefixes))
        } else if !config.vcs.enabled || config.local {
            BuildMode::Full
        } else {
            BuildMode::Incremental
        }
    }
}

/// Where a selection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Override,
    FullScan,
    Vcs,
    /// VCS gave no usable signal; full scan used instead
    VcsFallback,
}

impl fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionSource::Override => "override",
            SelectionSource::FullScan => "full scan",
            SelectionSource::Vcs => "vcs",
            SelectionSource::VcsFallback => "vcs fallback (full scan)",
        };
        f.write_str(s)
    }
}

/// The working set for one build
#[derive(Debug, Clone)]
pub struct Selection {
    pub artifacts: Vec<SchemaArtifact>,
    pub source: SelectionSource,
}

impl Selection {
    /// Only a build over the whole catalog may wipe stale outputs; an
    /// override or VCS subset leaves other schemas' outputs in place.
    pub fn clears_outputs(&self) -> bool {
        matches!(self.source, SelectionSource::FullScan | SelectionSource::VcsFallback)
    }

    pub fn names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.name.as_str()).collect()
    }
}

/// Select the working set.
///
/// VCS errors and empty answers are recovered by falling back to the full
/// scan; only an override naming an unknown schema is an error.
pub fn select(
    mode: &BuildMode,
    catalog: &SchemaCatalog,
    vcs: Option<&dyn VcsProvider>,
    vendor_prefixes: &[String],
) -> Result<Selection> {
    match mode {
        BuildMode::Override(reference) => {
            let name = normalize_name(reference, vendor_prefixes);
            let artifact = catalog.get(&name).cloned().ok_or_else(|| {
                PublishError::SchemaNotFound {
                    suggestions: catalog.suggest(&name, 3),
                    name: name.clone(),
                }
            })?;
            info!(schema = %name, "using single-file override");
            Ok(Selection {
                artifacts: vec![artifact],
                source: SelectionSource::Override,
            })
        }
        BuildMode::Full => Ok(Selection {
            artifacts: catalog.all(),
            source: SelectionSource::FullScan,
        }),
        BuildMode::Incremental => {
            let changed = match vcs.map(|v| v.modified_files()) {
                Some(Ok(files)) => files,
                Some(Err(e)) => {
                    warn!("VCS query failed, falling back to full build: {}", e);
                    Vec::new()
                }
                None => {
                    warn!("no VCS provider available, falling back to full build");
                    Vec::new()
                }
            };

            let artifacts = resolve_changed(&changed, catalog, vendor_prefixes);
            if artifacts.is_empty() {
                info!("no modified schemas reported, running full build");
                return Ok(Selection {
                    artifacts: catalog.all(),
                    source: SelectionSource::VcsFallback,
                });
            }

            let selection = Selection {
                artifacts,
                source: SelectionSource::Vcs,
            };
            info!(objects = ?selection.names(), "using list of objects from VCS");
            Ok(selection)
        }
    }
}

/// Map changed paths to catalog artifacts by normalized name. Paths the
/// catalog does not know (deleted or outside the roots) are skipped.
fn resolve_changed(
    changed: &[std::path::PathBuf],
    catalog: &SchemaCatalog,
    vendor_prefixes: &[String],
) -> Vec<SchemaArtifact> {
    let mut artifacts: Vec<SchemaArtifact> = Vec::new();
    for path in changed {
        let name = normalize_name(&path.to_string_lossy(), vendor_prefixes);
        if artifacts.iter().any(|a| a.name == name) {
            continue;
        }
        match catalog.get(&name) {
            Some(artifact) => artifacts.push(artifact.clone()),
            None => warn!(schema = %name, "modified file is not in the schema catalog, skipping"),
        }
    }
    artifacts
}
