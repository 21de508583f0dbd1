//! Core types describing an EPUB package document.

/// Dublin Core metadata carried by the package document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
    pub creators: Vec<String>,
}

/// One `<item>` from the package manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestItem {
    pub id: String,
    /// Href as written in the manifest, relative to the package document.
    pub href: String,
    pub media_type: String,
    /// Space-separated `properties` attribute (EPUB 3), if present.
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Whether this item is an XHTML content document.
    pub fn is_document(&self) -> bool {
        self.media_type == "application/xhtml+xml"
    }

    /// Whether this item carries the given EPUB 3 property (e.g. "nav").
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .map(|p| p.split_whitespace().any(|v| v == property))
            .unwrap_or(false)
    }
}

/// One `<itemref>` from the package spine.
#[derive(Debug, Clone, PartialEq)]
pub struct SpineRef {
    pub idref: String,
    pub linear: bool,
}

/// Parsed package document: metadata, manifest and spine.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub metadata: Metadata,
    pub manifest: Vec<ManifestItem>,
    pub spine: Vec<SpineRef>,
}

impl Package {
    /// Look up a manifest item by id.
    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }
}

/// A spine-ordered reference to an XHTML content document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    /// Manifest item id.
    pub id: String,
    /// Archive entry name (href resolved against the package directory).
    pub name: String,
    /// True for the EPUB 3 navigation document.
    pub nav: bool,
}
