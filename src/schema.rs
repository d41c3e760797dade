//! Schema artifacts and the filesystem catalog

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// Declared category of a schema file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Service,
    BusinessObject,
    Enum,
    Exception,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Service => "service",
            SchemaKind::BusinessObject => "business_object",
            SchemaKind::Enum => "enum",
            SchemaKind::Exception => "exception",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single schema file selected for a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaArtifact {
    /// Normalized base filename (identity)
    pub name: String,
    /// Absolute source path
    pub path: PathBuf,
    /// Category the file was listed under
    pub kind: SchemaKind,
}

impl SchemaArtifact {
    /// Filename without the schema extension (e.g. "Order" for "Order.thrift")
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.name)
    }
}

/// Normalize a schema reference to its identity: strip the directory, then
/// any vendor namespace prefix.
///
/// `thrift/services/wizecommerce.Order.thrift` → `Order.thrift`
pub fn normalize_name(reference: &str, vendor_prefixes: &[String]) -> String {
    let base = Path::new(reference)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(reference);

    vendor_prefixes
        .iter()
        .find_map(|prefix| base.strip_prefix(prefix.as_str()))
        .unwrap_or(base)
        .to_string()
}

/// List every file under `root` with the given extension, sorted by path.
///
/// A missing root lists as empty.
pub fn list_schema_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        warn!(root = %root.display(), "schema root does not exist");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().map(|e| e != extension).unwrap_or(true) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    Ok(files)
}

/// All schema files discovered under the configured roots, by category
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    services: Vec<SchemaArtifact>,
    business_objects: Vec<SchemaArtifact>,
    enums: Vec<SchemaArtifact>,
    exceptions: Vec<SchemaArtifact>,
    /// Index: normalized name -> (kind, position)
    by_name: HashMap<String, (SchemaKind, usize)>,
}

impl SchemaCatalog {
    /// Scan every root and build the catalog
    pub fn scan(
        roots: &[(SchemaKind, PathBuf)],
        extension: &str,
        vendor_prefixes: &[String],
    ) -> Result<Self> {
        let mut catalog = Self::default();
        for (kind, root) in roots {
            for path in list_schema_files(root, extension)? {
                let name = normalize_name(&path.to_string_lossy(), vendor_prefixes);
                let path = path.canonicalize().unwrap_or(path);
                catalog.insert(SchemaArtifact { name, path, kind: *kind });
            }
        }
        debug!(
            services = catalog.services.len(),
            business_objects = catalog.business_objects.len(),
            enums = catalog.enums.len(),
            exceptions = catalog.exceptions.len(),
            "schema catalog built"
        );
        Ok(catalog)
    }

    /// Add an artifact. A later artifact with the same name shadows lookups
    /// by name but both stay listed.
    pub fn insert(&mut self, artifact: SchemaArtifact) {
        let kind = artifact.kind;
        let list = self.list_mut(kind);
        let position = list.len();
        let name = artifact.name.clone();
        list.push(artifact);
        if let Some((previous, _)) = self.by_name.insert(name.clone(), (kind, position)) {
            warn!(name = %name, %previous, %kind, "duplicate schema name");
        }
    }

    fn list_mut(&mut self, kind: SchemaKind) -> &mut Vec<SchemaArtifact> {
        match kind {
            SchemaKind::Service => &mut self.services,
            SchemaKind::BusinessObject => &mut self.business_objects,
            SchemaKind::Enum => &mut self.enums,
            SchemaKind::Exception => &mut self.exceptions,
        }
    }

    /// Artifacts of one category
    pub fn of_kind(&self, kind: SchemaKind) -> &[SchemaArtifact] {
        match kind {
            SchemaKind::Service => &self.services,
            SchemaKind::BusinessObject => &self.business_objects,
            SchemaKind::Enum => &self.enums,
            SchemaKind::Exception => &self.exceptions,
        }
    }

    /// The full working set: services, business objects, enums, exceptions
    pub fn all(&self) -> Vec<SchemaArtifact> {
        self.services
            .iter()
            .chain(&self.business_objects)
            .chain(&self.enums)
            .chain(&self.exceptions)
            .cloned()
            .collect()
    }

    /// Look up an artifact by normalized name
    pub fn get(&self, name: &str) -> Option<&SchemaArtifact> {
        let (kind, position) = self.by_name.get(name)?;
        self.of_kind(*kind).get(*position)
    }

    /// Up to `limit` known names closest to `query`, best first
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, &String)> = self
            .by_name
            .keys()
            .filter_map(|name| matcher.fuzzy_match(name, query).map(|score| (score, name)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.services.len() + self.business_objects.len() + self.enums.len() + self.exceptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn prefixes() -> Vec<String> {
        vec!["wizecommerce.".to_string()]
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Order.thrift", &prefixes()), "Order.thrift");
        assert_eq!(
            normalize_name("thrift/services/wizecommerce.Order.thrift", &prefixes()),
            "Order.thrift"
        );
        assert_eq!(normalize_name("/abs/path/User.thrift", &[]), "User.thrift");
    }

    #[test]
    fn test_stem() {
        let artifact = SchemaArtifact {
            name: "OrderService.thrift".to_string(),
            path: PathBuf::from("/x/OrderService.thrift"),
            kind: SchemaKind::Service,
        };
        assert_eq!(artifact.stem(), "OrderService");
    }

    #[test]
    fn test_list_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.thrift"), "").unwrap();
        fs::write(dir.path().join("nested/a.thrift"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = list_schema_files(dir.path(), "thrift").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["b.thrift", "a.thrift"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let files = list_schema_files(Path::new("/definitely/not/here"), "thrift").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_catalog_scan_orders_categories() {
        let dir = tempfile::tempdir().unwrap();
        let services = dir.path().join("services");
        let objects = dir.path().join("objects");
        fs::create_dir_all(&services).unwrap();
        fs::create_dir_all(&objects).unwrap();
        fs::write(services.join("wizecommerce.OrderService.thrift"), "").unwrap();
        fs::write(objects.join("Order.thrift"), "").unwrap();

        let roots = vec![
            (SchemaKind::BusinessObject, objects),
            (SchemaKind::Service, services),
        ];
        let catalog = SchemaCatalog::scan(&roots, "thrift", &prefixes()).unwrap();

        let names: Vec<_> = catalog.all().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["OrderService.thrift", "Order.thrift"]);
        assert_eq!(
            catalog.get("OrderService.thrift").map(|a| a.kind),
            Some(SchemaKind::Service)
        );
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_suggest() {
        let mut catalog = SchemaCatalog::default();
        for name in ["Order.thrift", "User.thrift", "OrderStatus.thrift"] {
            catalog.insert(SchemaArtifact {
                name: name.to_string(),
                path: PathBuf::from(name),
                kind: SchemaKind::BusinessObject,
            });
        }
        let suggestions = catalog.suggest("Ordr", 3);
        assert!(suggestions.contains(&"Order.thrift".to_string()));
        assert!(!suggestions.contains(&"User.thrift".to_string()));
    }
}
