//! Generation tasks
//!
//! One task per enabled generator, each over the whole working set. A task
//! is turned into a [`TaskCommand`] (a worker process invocation) once its
//! manifest has been written.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Result;
use crate::generator::{Generator, WorkerManifest};
use crate::schema::SchemaArtifact;

/// A generator paired with the working set it processes
#[derive(Debug, Clone, Copy)]
pub struct GenerationTask<'a> {
    pub generator: &'a Generator,
    pub artifacts: &'a [SchemaArtifact],
}

impl GenerationTask<'_> {
    pub fn description(&self) -> String {
        format!("{} over {} schema(s)", self.generator, self.artifacts.len())
    }

    /// Snapshot this task into a worker manifest
    pub fn manifest(&self, include_dirs: &[PathBuf], output_dir: &Path, clear_outputs: bool) -> WorkerManifest {
        WorkerManifest::new(
            self.generator,
            self.artifacts.to_vec(),
            include_dirs.to_vec(),
            output_dir.to_path_buf(),
            clear_outputs,
        )
    }
}

/// Cross the working set with the enabled generators.
///
/// No generators means no tasks; that is a valid no-op build.
pub fn build_tasks<'a>(working_set: &'a [SchemaArtifact], generators: &'a [Generator]) -> Vec<GenerationTask<'a>> {
    generators
        .iter()
        .map(|generator| GenerationTask {
            generator,
            artifacts: working_set,
        })
        .collect()
}

/// A process to launch for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    pub description: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl TaskCommand {
    pub fn new<I, S>(description: impl Into<String>, program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            description: description.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// How worker processes are started: a program plus leading arguments,
/// followed by `--manifest <path>`.
#[derive(Debug, Clone)]
pub struct Launcher {
    program: PathBuf,
    prefix_args: Vec<OsString>,
}

impl Launcher {
    pub fn new<I, S>(program: impl Into<PathBuf>, prefix_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            prefix_args: prefix_args.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-invoke the running binary's `worker` subcommand
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?, ["worker"]))
    }

    pub fn task_command(&self, task: &GenerationTask<'_>, manifest_path: &Path) -> TaskCommand {
        let mut args = self.prefix_args.clone();
        args.push("--manifest".into());
        args.push(manifest_path.as_os_str().to_os_string());
        TaskCommand {
            description: task.description(),
            program: self.program.clone(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompilerBinding, Language};
    use crate::schema::SchemaKind;

    fn working_set() -> Vec<SchemaArtifact> {
        ["Order.thrift", "User.thrift"]
            .iter()
            .map(|name| SchemaArtifact {
                name: name.to_string(),
                path: PathBuf::from("/schemas").join(name),
                kind: SchemaKind::BusinessObject,
            })
            .collect()
    }

    #[test]
    fn test_one_task_per_generator() {
        let compiler = CompilerBinding::new("thrift", "thrift", &Language::ALL);
        let generators = vec![
            Generator::new(Language::Java, compiler.clone()),
            Generator::new(Language::Ruby, compiler),
        ];
        let artifacts = working_set();

        let tasks = build_tasks(&artifacts, &generators);
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.artifacts.len() == 2));
        assert_eq!(tasks[1].generator.language(), Language::Ruby);
        assert_eq!(tasks[1].description(), "ruby generator (thrift) over 2 schema(s)");
    }

    #[test]
    fn test_no_generators_no_tasks() {
        let artifacts = working_set();
        assert!(build_tasks(&artifacts, &[]).is_empty());
    }

    #[test]
    fn test_launcher_appends_manifest() {
        let compiler = CompilerBinding::new("thrift", "thrift", &Language::ALL);
        let generators = vec![Generator::new(Language::Java, compiler)];
        let artifacts = working_set();
        let tasks = build_tasks(&artifacts, &generators);

        let launcher = Launcher::new("/usr/bin/schema-publish", ["worker"]);
        let command = launcher.task_command(&tasks[0], Path::new("/work/manifests/java.json"));
        assert_eq!(command.program, PathBuf::from("/usr/bin/schema-publish"));
        assert_eq!(
            command.args,
            vec![
                OsString::from("worker"),
                OsString::from("--manifest"),
                OsString::from("/work/manifests/java.json")
            ]
        );
    }
}
