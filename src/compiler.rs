//! Compiler bindings
//!
//! A compiler binding names one schema compiler binary and the target
//! languages it can emit. Exactly one binding drives a build.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PublishError, Result};

/// Target languages / output kinds a generator can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Ruby,
    Doc,
}

impl Language {
    /// Every supported language, in fan-out order
    pub const ALL: [Language; 3] = [Language::Java, Language::Ruby, Language::Doc];

    /// Name used in configuration and compiler capability lists
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Ruby => "ruby",
            Language::Doc => "doc",
        }
    }

    /// Generator id passed to the compiler's `--gen` flag
    pub fn gen_id(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Ruby => "rb",
            Language::Doc => "html",
        }
    }

    /// Parse a configuration name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured schema compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerBinding {
    /// Name used to select this compiler (`--set-compiler`)
    pub name: String,

    /// Path or command name of the compiler binary
    pub bin: PathBuf,

    /// Languages this compiler can emit (free-form; unknown names are ignored)
    #[serde(default)]
    pub supported_languages: Vec<String>,

    /// Extra generator options per language, appended as `--gen <id>:<options>`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<Language, String>,
}

impl CompilerBinding {
    /// Create a binding supporting the given languages
    pub fn new(name: impl Into<String>, bin: impl Into<PathBuf>, languages: &[Language]) -> Self {
        Self {
            name: name.into(),
            bin: bin.into(),
            supported_languages: languages.iter().map(|l| l.as_str().to_string()).collect(),
            options: BTreeMap::new(),
        }
    }

    /// Whether this compiler can emit the given language
    pub fn supports(&self, language: Language) -> bool {
        self.supported_languages
            .iter()
            .any(|name| Language::parse(name) == Some(language))
    }

    /// The `--gen` argument for a language, including configured options
    pub fn gen_arg(&self, language: Language) -> String {
        match self.options.get(&language) {
            Some(opts) if !opts.is_empty() => format!("{}:{}", language.gen_id(), opts),
            _ => language.gen_id().to_string(),
        }
    }

    /// One-line summary used by the `compilers` listing
    pub fn describe(&self) -> String {
        format!(
            "found compiler {} with binary at: {} which supports: {} languages",
            self.name,
            self.bin.display(),
            self.supported_languages.join(", ")
        )
    }
}

/// Narrow a compiler list to the one named `name`.
pub fn select_compiler(compilers: &[CompilerBinding], name: &str) -> Result<CompilerBinding> {
    compilers
        .iter()
        .find(|c| c.name == name)
        .cloned()
        .ok_or_else(|| PublishError::CompilerNotFound {
            name: name.to_string(),
            available: compilers.iter().map(|c| c.name.clone()).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_is_case_insensitive() {
        let mut compiler = CompilerBinding::new("thrift", "thrift", &[Language::Java]);
        compiler.supported_languages.push("RUBY".to_string());
        compiler.supported_languages.push("python".to_string());

        assert!(compiler.supports(Language::Java));
        assert!(compiler.supports(Language::Ruby));
        assert!(!compiler.supports(Language::Doc));
    }

    #[test]
    fn test_gen_arg_with_options() {
        let mut compiler = CompilerBinding::new("thrift", "thrift", &Language::ALL);
        compiler.options.insert(Language::Java, "beans,hashcode".to_string());

        assert_eq!(compiler.gen_arg(Language::Java), "java:beans,hashcode");
        assert_eq!(compiler.gen_arg(Language::Ruby), "rb");
        assert_eq!(compiler.gen_arg(Language::Doc), "html");
    }

    #[test]
    fn test_select_compiler() {
        let compilers = vec![
            CompilerBinding::new("thrift-0.9", "/opt/thrift-0.9/bin/thrift", &Language::ALL),
            CompilerBinding::new("thrift-0.5", "/opt/thrift-0.5/bin/thrift", &[Language::Java]),
        ];

        let selected = select_compiler(&compilers, "thrift-0.5").unwrap();
        assert_eq!(selected.bin, PathBuf::from("/opt/thrift-0.5/bin/thrift"));

        match select_compiler(&compilers, "missing") {
            Err(PublishError::CompilerNotFound { available, .. }) => {
                assert_eq!(available, vec!["thrift-0.9", "thrift-0.5"]);
            }
            other => panic!("Expected CompilerNotFound, got {:?}", other),
        }
    }
}
