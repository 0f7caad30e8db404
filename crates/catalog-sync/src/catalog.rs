use std::fmt;

use serde::{Deserialize, Serialize};

/// A named, versioned snapshot of catalog content, e.g. `electronicsContentCatalog:Staged`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogVersion {
    pub catalog: String,
    pub version: String,
}

impl CatalogVersion {
    pub fn new(catalog: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            version: version.into(),
        }
    }

    /// Parse the `catalog:version` shorthand used on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        let (catalog, version) = s.rsplit_once(':')?;
        if catalog.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self::new(catalog, version))
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.catalog, self.version)
    }
}

/// Identifies a reusable synchronization definition between two catalog versions.
///
/// Descriptors are immutable once built and are owned by the pipeline step
/// that asks for the synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncJobDescriptor {
    name: String,
    source: CatalogVersion,
    target: CatalogVersion,
}

impl SyncJobDescriptor {
    pub fn new(name: impl Into<String>, source: CatalogVersion, target: CatalogVersion) -> Self {
        Self {
            name: name.into(),
            source,
            target,
        }
    }

    /// Human-readable catalog name used in log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &CatalogVersion {
        &self.source
    }

    pub fn target(&self) -> &CatalogVersion {
        &self.target
    }
}

impl fmt::Display for SyncJobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} -> {})", self.name, self.source, self.target)
    }
}

/// Platform-opaque handle to a synchronization definition, as returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    code: String,
    pub source: CatalogVersion,
    pub target: CatalogVersion,
}

impl JobHandle {
    pub fn new(code: impl Into<String>, source: CatalogVersion, target: CatalogVersion) -> Self {
        Self {
            code: code.into(),
            source,
            target,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_catalog_version_shorthand() {
        let cv = CatalogVersion::parse("electronicsContentCatalog:Staged").unwrap();
        assert_eq!(cv.catalog, "electronicsContentCatalog");
        assert_eq!(cv.version, "Staged");
        assert_eq!(cv.to_string(), "electronicsContentCatalog:Staged");
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert!(CatalogVersion::parse("no-separator").is_none());
        assert!(CatalogVersion::parse(":Online").is_none());
        assert!(CatalogVersion::parse("catalog:").is_none());
    }

    #[test]
    fn descriptor_display_includes_versions() {
        let desc = SyncJobDescriptor::new(
            "electronics->spa",
            CatalogVersion::new("electronicsContentCatalog", "Staged"),
            CatalogVersion::new("electronics-spaContentCatalog", "Staged"),
        );
        assert_eq!(
            desc.to_string(),
            "electronics->spa (electronicsContentCatalog:Staged -> electronics-spaContentCatalog:Staged)"
        );
    }
}
