//! Schema model
//!
//! Per-file metadata the dependency graph reads: whether a file declares a
//! service, its declared includes, and free-form properties.

use std::collections::BTreeMap;
use std::fs;

use regex::Regex;
use tracing::warn;

use crate::schema::{normalize_name, SchemaCatalog};

/// Read-only view of schema file metadata, keyed by normalized filename.
///
/// Lookups never fail: an unreadable or unknown file reads as having no
/// properties and no dependencies.
pub trait SchemaModel {
    /// Whether the file declares at least one service
    fn is_service(&self, name: &str) -> bool;

    /// Key/value properties read from the file
    fn read_properties(&self, name: &str) -> BTreeMap<String, String>;

    /// Normalized names of the files this one includes
    fn read_dependencies(&self, name: &str) -> Vec<String>;
}

/// Line patterns of the Thrift IDL we care about
struct ThriftPatterns {
    include: Regex,
    service: Regex,
    namespace: Regex,
    tag: Regex,
}

impl ThriftPatterns {
    fn new() -> Self {
        Self {
            include: Regex::new(r#"(?m)^\s*include\s+"([^"]+)""#).expect("static pattern"),
            service: Regex::new(r"(?m)^\s*service\s+\w+").expect("static pattern"),
            namespace: Regex::new(r"(?m)^\s*namespace\s+([\w.*]+)\s+([\w.]+)")
                .expect("static pattern"),
            tag: Regex::new(r"@([A-Za-z][\w.-]*)\s*:\s*(.*?)\s*(?:\*/)?\s*$")
                .expect("static pattern"),
        }
    }
}

/// [`SchemaModel`] over Thrift IDL files listed in a catalog.
///
/// Every call re-reads the file so properties are always fresh.
pub struct ThriftModel<'a> {
    catalog: &'a SchemaCatalog,
    vendor_prefixes: &'a [String],
    patterns: ThriftPatterns,
}

impl<'a> ThriftModel<'a> {
    pub fn new(catalog: &'a SchemaCatalog, vendor_prefixes: &'a [String]) -> Self {
        Self {
            catalog,
            vendor_prefixes,
            patterns: ThriftPatterns::new(),
        }
    }

    fn read_source(&self, name: &str) -> Option<String> {
        let artifact = self.catalog.get(name)?;
        match fs::read_to_string(&artifact.path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(schema = name, path = %artifact.path.display(), "failed to read schema: {}", e);
                None
            }
        }
    }

    /// Parse `@key: value` tags and namespace declarations
    fn parse_properties(&self, content: &str) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();

        for caps in self.patterns.namespace.captures_iter(content) {
            properties.insert(format!("namespace.{}", &caps[1]), caps[2].to_string());
        }

        for line in content.lines() {
            let trimmed = line.trim_start();
            let is_comment = ["#", "//", "/*", "*"]
                .iter()
                .any(|marker| trimmed.starts_with(marker));
            if !is_comment {
                continue;
            }
            if let Some(caps) = self.patterns.tag.captures(trimmed) {
                properties.insert(caps[1].to_string(), caps[2].to_string());
            }
        }

        properties
    }
}

impl SchemaModel for ThriftModel<'_> {
    fn is_service(&self, name: &str) -> bool {
        self.read_source(name)
            .map(|content| self.patterns.service.is_match(&content))
            .unwrap_or(false)
    }

    fn read_properties(&self, name: &str) -> BTreeMap<String, String> {
        let Some(content) = self.read_source(name) else {
            return BTreeMap::new();
        };
        let mut properties = self.parse_properties(&content);
        if let Some(artifact) = self.catalog.get(name) {
            properties.insert("kind".to_string(), artifact.kind.to_string());
        }
        properties
    }

    fn read_dependencies(&self, name: &str) -> Vec<String> {
        let Some(content) = self.read_source(name) else {
            return Vec::new();
        };
        let mut deps: Vec<String> = Vec::new();
        for caps in self.patterns.include.captures_iter(&content) {
            let dep = normalize_name(&caps[1], self.vendor_prefixes);
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        deps
    }
}
