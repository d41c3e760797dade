//! Generator backends
//!
//! A generator pairs one target language with the active compiler. The set
//! of languages is closed; each variant knows its compiler generator id and
//! where its outputs land under the output root.

pub mod worker;

pub use worker::{run_worker, WorkerManifest};

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::compiler::{CompilerBinding, Language};
use crate::config::PublishConfig;
use crate::error::Result;
use crate::names::to_snake_case;
use crate::schema::SchemaArtifact;

/// One enabled target language bound to its compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generator {
    Java(CompilerBinding),
    Ruby(CompilerBinding),
    Doc(CompilerBinding),
}

impl Generator {
    pub fn new(language: Language, compiler: CompilerBinding) -> Self {
        match language {
            Language::Java => Generator::Java(compiler),
            Language::Ruby => Generator::Ruby(compiler),
            Language::Doc => Generator::Doc(compiler),
        }
    }

    pub fn language(&self) -> Language {
        match self {
            Generator::Java(_) => Language::Java,
            Generator::Ruby(_) => Language::Ruby,
            Generator::Doc(_) => Language::Doc,
        }
    }

    pub fn compiler(&self) -> &CompilerBinding {
        match self {
            Generator::Java(c) | Generator::Ruby(c) | Generator::Doc(c) => c,
        }
    }

    /// Language subtree owned by this generator. No other generator writes here.
    pub fn output_root(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.language().as_str())
    }

    /// Directory the compiler writes one artifact's output into
    pub fn artifact_output(&self, output_dir: &Path, artifact: &SchemaArtifact) -> PathBuf {
        let root = self.output_root(output_dir);
        match self {
            Generator::Java(_) => root.join(artifact.stem()),
            Generator::Ruby(_) => root.join(to_snake_case(artifact.stem())),
            // documentation is one shared site
            Generator::Doc(_) => root,
        }
    }

    /// Compiler invocation for one artifact
    pub fn compile_command(
        &self,
        artifact: &SchemaArtifact,
        include_dirs: &[PathBuf],
        output_dir: &Path,
    ) -> Command {
        let compiler = self.compiler();
        let mut cmd = Command::new(&compiler.bin);
        cmd.arg("--gen")
            .arg(compiler.gen_arg(self.language()))
            .arg("-out")
            .arg(self.artifact_output(output_dir, artifact));
        for dir in include_dirs {
            cmd.arg("-I").arg(dir);
        }
        cmd.arg(&artifact.path);
        cmd
    }

    /// Human-readable task description used in logs and errors
    pub fn description(&self) -> String {
        format!("{} generator ({})", self.language(), self.compiler().name)
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Generators enabled for this build
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    generators: Vec<Generator>,
}

impl GeneratorRegistry {
    /// One generator per enabled language the active compiler supports.
    ///
    /// No configured compiler yields an empty registry; more than one is
    /// rejected by [`PublishConfig::active_compiler`].
    pub fn build(config: &PublishConfig) -> Result<Self> {
        let Some(compiler) = config.active_compiler()? else {
            info!("no compiler configured, nothing to generate");
            return Ok(Self::default());
        };

        let mut generators = Vec::new();
        for language in config.enabled_languages() {
            if compiler.supports(language) {
                generators.push(Generator::new(language, compiler.clone()));
            } else {
                warn!(
                    compiler = %compiler.name,
                    %language,
                    "language enabled but not supported by compiler, skipping"
                );
            }
        }

        info!(
            generators = ?generators.iter().map(|g| g.language().as_str()).collect::<Vec<_>>(),
            "generator registry built"
        );
        Ok(Self { generators })
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::schema::SchemaKind;

    fn artifact(name: &str) -> SchemaArtifact {
        SchemaArtifact {
            name: name.to_string(),
            path: PathBuf::from("/schemas").join(name),
            kind: SchemaKind::Service,
        }
    }

    #[test]
    fn test_registry_respects_support() {
        let mut config = PublishConfig::default();
        config.languages.doc = true;
        config.compilers = vec![CompilerBinding::new(
            "thrift",
            "thrift",
            &[Language::Java, Language::Doc],
        )];

        let registry = GeneratorRegistry::build(&config).unwrap();
        let languages: Vec<_> = registry.generators().iter().map(Generator::language).collect();
        assert_eq!(languages, vec![Language::Java, Language::Doc]);
    }

    #[test]
    fn test_registry_without_compiler_is_empty() {
        let registry = GeneratorRegistry::build(&PublishConfig::default()).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_rejects_multiple_compilers() {
        let mut config = PublishConfig::default();
        config.compilers = vec![
            CompilerBinding::new("a", "thrift-a", &Language::ALL),
            CompilerBinding::new("b", "thrift-b", &Language::ALL),
        ];
        assert!(matches!(
            GeneratorRegistry::build(&config),
            Err(PublishError::MultipleCompilers(_))
        ));
    }

    #[test]
    fn test_output_layout() {
        let compiler = CompilerBinding::new("thrift", "thrift", &Language::ALL);
        let out = Path::new("/out");
        let order = artifact("OrderService.thrift");

        assert_eq!(
            Generator::new(Language::Java, compiler.clone()).artifact_output(out, &order),
            PathBuf::from("/out/java/OrderService")
        );
        assert_eq!(
            Generator::new(Language::Ruby, compiler.clone()).artifact_output(out, &order),
            PathBuf::from("/out/ruby/order_service")
        );
        assert_eq!(
            Generator::new(Language::Doc, compiler).artifact_output(out, &order),
            PathBuf::from("/out/doc")
        );
    }

    #[test]
    fn test_compile_command_args() {
        let compiler = CompilerBinding::new("thrift", "/usr/bin/thrift", &Language::ALL);
        let generator = Generator::new(Language::Ruby, compiler);
        let cmd = generator.compile_command(
            &artifact("Order.thrift"),
            &[PathBuf::from("/schemas")],
            Path::new("/out"),
        );

        assert_eq!(cmd.get_program(), "/usr/bin/thrift");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(
            args,
            vec!["--gen", "rb", "-out", "/out/ruby/order", "-I", "/schemas", "/schemas/Order.thrift"]
        );
        assert_eq!(generator.description(), "ruby generator (thrift)");
    }
}
