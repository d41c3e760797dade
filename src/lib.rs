//! Schema Publisher
//!
//! Orchestrates client generation from a corpus of Thrift schema files:
//! picks the working set (full scan, VCS-incremental, or a single override),
//! fans out one worker process per enabled generator, and fails the build if
//! any worker fails. Also resolves the schema include graph for
//! visualization.
//!
//! ## Pipeline
//!
//! ```text
//! config ─► GeneratorRegistry ─┐
//!                              ├─► build_tasks ─► ParallelExecutor ─► aggregate
//! Workspace ─► select ─────────┘        │
//!                                       └─► manifests/<lang>.json ─► worker processes
//! ```

pub mod aggregate;
pub mod compiler;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod graph;
pub mod model;
pub mod names;
pub mod publish;
pub mod schema;
pub mod selector;
pub mod tasks;
pub mod vcs;
pub mod workspace;

pub use aggregate::{aggregate, BuildStatus};
pub use compiler::{CompilerBinding, Language};
pub use config::PublishConfig;
pub use error::{PublishError, Result};
pub use executor::{ParallelExecutor, TaskOutcome, TaskResult};
pub use generator::{Generator, GeneratorRegistry, WorkerManifest};
pub use graph::DependencyGraph;
pub use model::{SchemaModel, ThriftModel};
pub use publish::Publisher;
pub use schema::{SchemaArtifact, SchemaCatalog, SchemaKind};
pub use selector::{select, BuildMode, Selection, SelectionSource};
pub use tasks::{build_tasks, GenerationTask, Launcher, TaskCommand};
pub use vcs::{GitVcs, VcsProvider};
pub use workspace::Workspace;
