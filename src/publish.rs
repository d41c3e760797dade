//! Build driver
//!
//! Wires selection, task construction, process fan-out and aggregation
//! together, and resolves the dependency graph for visualization.

use std::path::PathBuf;

use tracing::info;

use crate::aggregate::{aggregate, BuildStatus};
use crate::config::PublishConfig;
use crate::error::{PublishError, Result};
use crate::executor::ParallelExecutor;
use crate::generator::GeneratorRegistry;
use crate::graph::DependencyGraph;
use crate::model::ThriftModel;
use crate::schema::{normalize_name, SchemaCatalog};
use crate::selector::{select, BuildMode};
use crate::tasks::{build_tasks, Launcher, TaskCommand};
use crate::vcs::{GitVcs, VcsProvider};
use crate::workspace::Workspace;

/// Runs builds and visualizations against one frozen configuration
pub struct Publisher {
    config: PublishConfig,
    launcher: Launcher,
    vcs: Option<Box<dyn VcsProvider>>,
}

impl Publisher {
    /// Workers are launched by re-invoking the running binary; VCS is git
    /// when enabled.
    pub fn new(config: PublishConfig) -> Result<Self> {
        let vcs: Option<Box<dyn VcsProvider>> = if config.vcs.enabled {
            Some(Box::new(GitVcs::new(
                config.repo_dir(),
                config.vcs.baseline.clone(),
                config.paths.extension.clone(),
            )))
        } else {
            None
        };
        Ok(Self {
            config,
            launcher: Launcher::current_exe()?,
            vcs,
        })
    }

    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_vcs(mut self, vcs: Box<dyn VcsProvider>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Recreate the working directory and list every schema category
    pub fn create_structure(&self) -> Result<Workspace> {
        Workspace::create(&self.config)
    }

    /// Run one build. Any failing task fails the build with its status.
    pub fn process_schemas(&self) -> Result<BuildStatus> {
        // configuration errors abort before the working directory is touched
        let registry = GeneratorRegistry::build(&self.config)?;
        let workspace = self.create_structure()?;

        let mode = BuildMode::from_config(&self.config);
        let selection = select(
            &mode,
            workspace.catalog(),
            self.vcs.as_deref(),
            &self.config.naming.vendor_prefixes,
        )?;
        info!(
            source = %selection.source,
            schemas = selection.artifacts.len(),
            "working set selected"
        );

        let tasks = build_tasks(&selection.artifacts, registry.generators());
        if tasks.is_empty() {
            info!("no generators enabled, nothing to do");
            return Ok(BuildStatus { tasks: 0 });
        }

        let include_dirs = self.include_dirs();
        let output_dir = self.config.output_dir();
        let manifest_dir = workspace.manifest_dir();

        let mut commands: Vec<TaskCommand> = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let manifest = task.manifest(&include_dirs, &output_dir, selection.clears_outputs());
            let path = manifest.write(&manifest_dir)?;
            commands.push(self.launcher.task_command(task, &path));
        }

        let executor = ParallelExecutor::new(self.config.task_timeout());
        let results = executor.run(&commands)?;
        aggregate(&results)
    }

    /// Dependency graph seeded from one file, or from the full catalog
    pub fn dependency_graph(&self, schema_file: Option<&str>) -> Result<DependencyGraph> {
        let prefixes = &self.config.naming.vendor_prefixes;
        let catalog = SchemaCatalog::scan(&self.config.schema_roots(), &self.config.paths.extension, prefixes)?;

        let starting: Vec<String> = match schema_file {
            Some(file) => {
                let name = normalize_name(file, prefixes);
                if catalog.get(&name).is_none() {
                    return Err(PublishError::SchemaNotFound {
                        suggestions: catalog.suggest(&name, 3),
                        name,
                    });
                }
                vec![name]
            }
            None => catalog.all().into_iter().map(|a| a.name).collect(),
        };

        let model = ThriftModel::new(&catalog, prefixes);
        Ok(DependencyGraph::resolve(&starting, &model, prefixes))
    }

    /// Write the node-link graph to the configured export path
    pub fn visualize(&self, schema_file: Option<&str>) -> Result<PathBuf> {
        let graph = self.dependency_graph(schema_file)?;
        let path = self.config.export_path();
        graph.write_node_link(&path)?;
        info!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "wrote node-link JSON"
        );
        Ok(path)
    }

    /// Existing schema roots, passed to the compiler as include paths
    fn include_dirs(&self) -> Vec<PathBuf> {
        self.config
            .schema_roots()
            .into_iter()
            .map(|(_, root)| root)
            .filter(|root| root.is_dir())
            .collect()
    }
}
