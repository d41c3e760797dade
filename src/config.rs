//! Configuration management for schema publishing
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (publish.toml / publish.yaml)
//! - Environment variables (PUBLISH__*)
//!
//! ## Example config file (publish.toml):
//! ```toml
//! [paths]
//! business_objects = "thrift/business_objects"
//! service_objects = "thrift/services"
//! enum_objects = "thrift/enums"
//! exception_objects = "thrift/exceptions"
//! work_dir = "work"
//! output_dir = "generated"
//!
//! [languages]
//! java = true
//! ruby = true
//! doc = false
//!
//! [[compilers]]
//! name = "thrift-0.9.1"
//! bin = "/usr/local/bin/thrift"
//! supported_languages = ["java", "ruby", "doc"]
//!
//! [vcs]
//! enabled = true
//! baseline = "origin/master"
//! ```
//!
//! The loaded value is treated as immutable once the driver has applied its
//! command-line overrides; every stage receives it by reference.

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::compiler::{self, CompilerBinding, Language};
use crate::error::{PublishError, Result};
use crate::schema::{normalize_name, SchemaKind};

/// Main configuration for a publish run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Schema roots and build directories
    #[serde(default)]
    pub paths: PathsConfig,

    /// Enabled output languages
    #[serde(default)]
    pub languages: LanguagesConfig,

    /// Configured compilers (only one may be active for a build)
    #[serde(default)]
    pub compilers: Vec<CompilerBinding>,

    /// Version control settings for incremental builds
    #[serde(default)]
    pub vcs: VcsConfig,

    /// Filename normalization settings
    #[serde(default)]
    pub naming: NamingConfig,

    /// Worker execution settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Dependency graph export settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// Local (developer) mode: never consult VCS
    #[serde(default)]
    pub local: bool,

    /// Regenerate exactly this schema file (local mode only)
    #[serde(default)]
    pub service_override: Option<String>,
}

/// Schema roots and build directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_business_objects")]
    pub business_objects: PathBuf,

    #[serde(default = "default_service_objects")]
    pub service_objects: PathBuf,

    #[serde(default = "default_enum_objects")]
    pub enum_objects: PathBuf,

    #[serde(default = "default_exception_objects")]
    pub exception_objects: PathBuf,

    /// Staging directory, recreated before every build
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Root of the per-language output subtrees
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Schema file extension (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Enabled output languages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesConfig {
    #[serde(default = "default_true")]
    pub java: bool,

    #[serde(default = "default_true")]
    pub ruby: bool,

    #[serde(default)]
    pub doc: bool,
}

/// Version control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsConfig {
    /// Use VCS changes to pick the working set
    #[serde(default)]
    pub enabled: bool,

    /// Repository root (defaults to the current directory)
    #[serde(default)]
    pub repo: Option<PathBuf>,

    /// Revision of the last published build
    #[serde(default = "default_baseline")]
    pub baseline: String,
}

/// Filename normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Vendor namespace prefixes stripped from schema filenames
    #[serde(default = "default_vendor_prefixes")]
    pub vendor_prefixes: Vec<String>,
}

/// Worker execution configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Per-task deadline in seconds; unset means wait indefinitely
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,
}

/// Dependency graph export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Where the node-link JSON document is written
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,
}

// Default value functions
fn default_business_objects() -> PathBuf {
    PathBuf::from("business_objects")
}

fn default_service_objects() -> PathBuf {
    PathBuf::from("services")
}

fn default_enum_objects() -> PathBuf {
    PathBuf::from("enums")
}

fn default_exception_objects() -> PathBuf {
    PathBuf::from("exceptions")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("work")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_extension() -> String {
    "thrift".to_string()
}

fn default_true() -> bool {
    true
}

fn default_baseline() -> String {
    "origin/master".to_string()
}

fn default_vendor_prefixes() -> Vec<String> {
    vec!["wizecommerce.".to_string()]
}

fn default_export_path() -> PathBuf {
    std::env::temp_dir().join("force.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            business_objects: default_business_objects(),
            service_objects: default_service_objects(),
            enum_objects: default_enum_objects(),
            exception_objects: default_exception_objects(),
            work_dir: default_work_dir(),
            output_dir: default_output_dir(),
            extension: default_extension(),
        }
    }
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            java: true,
            ruby: true,
            doc: false,
        }
    }
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repo: None,
            baseline: default_baseline(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            vendor_prefixes: default_vendor_prefixes(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            export_path: default_export_path(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            languages: LanguagesConfig::default(),
            compilers: Vec::new(),
            vcs: VcsConfig::default(),
            naming: NamingConfig::default(),
            execution: ExecutionConfig::default(),
            graph: GraphConfig::default(),
            local: false,
            service_override: None,
        }
    }
}

impl PublishConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file (TOML or YAML, by extension)
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Extension-less names match any supported format
        let config_locations = ["publish", ".publish", "config/publish"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "publish") {
            let xdg_config = config_dir.config_dir().join("publish.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // PUBLISH__LANGUAGES__DOC=true, PUBLISH__VCS__ENABLED=true, ...
        builder = builder.add_source(
            Environment::with_prefix("PUBLISH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        std::fs::write(path, self.to_toml()?)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> std::io::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    // ========== Command-line overrides ==========

    /// Enable or disable local mode
    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    /// Regenerate a single schema file. Implies local mode.
    pub fn with_service_override(mut self, file: &str) -> Self {
        self.service_override = Some(normalize_name(file, &self.naming.vendor_prefixes));
        self.local = true;
        self
    }

    /// Apply `--java` / `--ruby`. These only take effect in local mode, and
    /// passing both falls back to the configured defaults.
    pub fn with_client_flags(mut self, java: bool, ruby: bool) -> Self {
        if !self.local || (!java && !ruby) {
            return self;
        }
        if java && ruby {
            warn!(
                "both --java and --ruby given; falling back to the configured languages \
                 (omit both to get the default behaviour)"
            );
            return self;
        }
        self.languages.java = java;
        self.languages.ruby = ruby;
        self
    }

    /// Disable every client language and generate documentation only
    pub fn doc_only(mut self) -> Self {
        self.languages.java = false;
        self.languages.ruby = false;
        self.languages.doc = true;
        self
    }

    /// Keep only the named compiler
    pub fn select_compiler(mut self, name: &str) -> Result<Self> {
        let selected = compiler::select_compiler(&self.compilers, name)?;
        self.compilers = vec![selected];
        Ok(self)
    }

    // ========== Accessors ==========

    /// Languages switched on in configuration, in fan-out order
    pub fn enabled_languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|lang| match lang {
                Language::Java => self.languages.java,
                Language::Ruby => self.languages.ruby,
                Language::Doc => self.languages.doc,
            })
            .collect()
    }

    /// The compiler driving this build.
    ///
    /// `Ok(None)` when no compiler is configured (a no-op build). More than
    /// one configured compiler is rejected.
    pub fn active_compiler(&self) -> Result<Option<&CompilerBinding>> {
        match self.compilers.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(only)),
            many => Err(PublishError::MultipleCompilers(
                many.iter().map(|c| c.name.clone()).collect(),
            )),
        }
    }

    /// Schema roots per category, resolved against the current directory
    pub fn schema_roots(&self) -> Vec<(SchemaKind, PathBuf)> {
        vec![
            (SchemaKind::Service, resolve(&self.paths.service_objects)),
            (SchemaKind::BusinessObject, resolve(&self.paths.business_objects)),
            (SchemaKind::Enum, resolve(&self.paths.enum_objects)),
            (SchemaKind::Exception, resolve(&self.paths.exception_objects)),
        ]
    }

    /// Staging directory path
    pub fn work_dir(&self) -> PathBuf {
        resolve(&self.paths.work_dir)
    }

    /// Output root path
    pub fn output_dir(&self) -> PathBuf {
        resolve(&self.paths.output_dir)
    }

    /// Repository root used for VCS queries
    pub fn repo_dir(&self) -> PathBuf {
        self.vcs
            .repo
            .as_deref()
            .map(resolve)
            .unwrap_or_else(|| resolve(Path::new(".")))
    }

    /// Node-link export destination
    pub fn export_path(&self) -> PathBuf {
        resolve(&self.graph.export_path)
    }

    /// Per-task deadline, if configured
    pub fn task_timeout(&self) -> Option<Duration> {
        self.execution.task_timeout_secs.map(Duration::from_secs)
    }
}

/// Resolve a possibly relative path against the current directory
fn resolve(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}
