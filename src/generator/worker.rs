//! Worker side of the process fan-out
//!
//! The driver writes one manifest per generator and launches
//! `schema-publish worker --manifest <path>` for each. The worker owns its
//! language subtree exclusively and reports through its exit status.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span};

use super::Generator;
use crate::compiler::{CompilerBinding, Language};
use crate::error::{PublishError, Result};
use crate::executor::status_code;
use crate::schema::SchemaArtifact;

/// Immutable input snapshot for one generation task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerManifest {
    pub language: Language,
    pub compiler: CompilerBinding,
    pub artifacts: Vec<SchemaArtifact>,
    /// Passed to the compiler as `-I` search paths
    pub include_dirs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Wipe the language subtree first; set only for whole-catalog builds
    pub clear_outputs: bool,
    pub created_at: DateTime<Utc>,
}

impl WorkerManifest {
    pub fn new(
        generator: &Generator,
        artifacts: Vec<SchemaArtifact>,
        include_dirs: Vec<PathBuf>,
        output_dir: PathBuf,
        clear_outputs: bool,
    ) -> Self {
        Self {
            language: generator.language(),
            compiler: generator.compiler().clone(),
            artifacts,
            include_dirs,
            output_dir,
            clear_outputs,
            created_at: Utc::now(),
        }
    }

    pub fn generator(&self) -> Generator {
        Generator::new(self.language, self.compiler.clone())
    }

    /// Write to `<dir>/<language>.json`, returning the path
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.json", self.language));
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), artifacts = self.artifacts.len(), "manifest written");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PublishError::InvalidManifest(format!("{}: {}", path.display(), e))
        })?;
        let manifest: Self = serde_json::from_str(&content)?;
        if !manifest.compiler.supports(manifest.language) {
            return Err(PublishError::InvalidManifest(format!(
                "compiler '{}' does not support {}",
                manifest.compiler.name, manifest.language
            )));
        }
        Ok(manifest)
    }
}

/// Run every artifact in the manifest through the compiler.
///
/// Returns the first non-zero compiler status, or 0. A compiler that cannot
/// be launched at all is an error.
pub fn run_worker(manifest: &WorkerManifest) -> Result<i32> {
    let generator = manifest.generator();
    let span = info_span!("worker", generator = %manifest.language);
    let _guard = span.enter();

    let root = generator.output_root(&manifest.output_dir);
    if manifest.clear_outputs && root.exists() {
        debug!(root = %root.display(), "clearing language output");
        fs::remove_dir_all(&root)?;
    }
    fs::create_dir_all(&root)?;

    for artifact in &manifest.artifacts {
        let out = generator.artifact_output(&manifest.output_dir, artifact);
        fs::create_dir_all(&out)?;

        let mut cmd = generator.compile_command(artifact, &manifest.include_dirs, &manifest.output_dir);
        debug!(schema = %artifact.name, "invoking {:?}", cmd);
        let status = cmd.status().map_err(|source| PublishError::Spawn {
            description: format!("{} for {}", generator.description(), artifact.name),
            source,
        })?;

        let code = status_code(status);
        if code != 0 {
            error!(schema = %artifact.name, code, "compiler failed");
            return Ok(code);
        }
    }

    info!(
        artifacts = manifest.artifacts.len(),
        output = %root.display(),
        "generation complete"
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;

    fn manifest(compiler: CompilerBinding, output_dir: PathBuf, clear_outputs: bool) -> WorkerManifest {
        let generator = Generator::new(Language::Java, compiler);
        WorkerManifest::new(
            &generator,
            vec![SchemaArtifact {
                name: "Order.thrift".to_string(),
                path: PathBuf::from("/schemas/Order.thrift"),
                kind: SchemaKind::BusinessObject,
            }],
            vec![PathBuf::from("/schemas")],
            output_dir,
            clear_outputs,
        )
    }

    #[test]
    fn test_manifest_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = CompilerBinding::new("thrift", "thrift", &Language::ALL);
        let original = manifest(compiler, dir.path().join("out"), true);

        let path = original.write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("java.json"));

        let loaded = WorkerManifest::load(&path).unwrap();
        assert_eq!(loaded.language, Language::Java);
        assert_eq!(loaded.artifacts, original.artifacts);
        assert_eq!(loaded.created_at, original.created_at);
        assert!(loaded.clear_outputs);
        assert_eq!(loaded.generator(), Generator::Java(original.compiler));
    }

    #[test]
    fn test_load_rejects_unsupported_language() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = CompilerBinding::new("thrift", "thrift", &[Language::Ruby]);
        let path = manifest(compiler, dir.path().join("out"), true).write(dir.path()).unwrap();

        assert!(matches!(
            WorkerManifest::load(&path),
            Err(PublishError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            WorkerManifest::load(&dir.path().join("ruby.json")),
            Err(PublishError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_missing_compiler_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = CompilerBinding::new(
            "thrift",
            dir.path().join("no-such-thrift"),
            &Language::ALL,
        );
        let result = run_worker(&manifest(compiler, dir.path().join("out"), false));
        assert!(matches!(result, Err(PublishError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_worker_reports_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = CompilerBinding::new("false", "false", &Language::ALL);
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("java/Stale")).unwrap();

        let code = run_worker(&manifest(compiler, out.clone(), true)).unwrap();
        assert_eq!(code, 1);
        assert!(!out.join("java/Stale").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_partial_build_keeps_other_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = CompilerBinding::new("true", "true", &Language::ALL);
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("java/User")).unwrap();

        let code = run_worker(&manifest(compiler, out.clone(), false)).unwrap();
        assert_eq!(code, 0);
        assert!(out.join("java/User").is_dir());
        assert!(out.join("java/Order").is_dir());
    }
}
