//! Reading and writing the EPUB (OCF) zip container.
//!
//! The container keeps every archive entry in memory in source order.
//! Rewritten documents replace their entry's bytes; everything else is
//! carried through untouched so the output archive mirrors the input.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{EpubError, Result};
use crate::package::{parse_container, parse_package, resolve_href};
use crate::types::{DocumentRef, Metadata, Package};

const MIMETYPE_ENTRY: &str = "mimetype";
const EPUB_MIMETYPE: &str = "application/epub+zip";
const CONTAINER_ENTRY: &str = "META-INF/container.xml";

struct Entry {
    name: String,
    data: Vec<u8>,
}

/// An EPUB loaded into memory.
pub struct Epub {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    package_path: String,
    package: Package,
}

impl Epub {
    /// Open an EPUB file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open an EPUB from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let mut entries = Vec::with_capacity(archive.len());
        let mut index = HashMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            index.insert(name.clone(), entries.len());
            entries.push(Entry { name, data });
        }

        let raw = RawArchive { entries, index };
        raw.verify_mimetype()?;

        let container_xml = raw.read_str(CONTAINER_ENTRY)?;
        let package_path = parse_container(&container_xml)?;
        let package_xml = raw.read_str(&package_path)?;
        let package = parse_package(&package_path, &package_xml)?;

        tracing::debug!(
            entries = raw.entries.len(),
            documents = package.manifest.iter().filter(|i| i.is_document()).count(),
            package = %package_path,
            "opened epub"
        );

        Ok(Self {
            entries: raw.entries,
            index: raw.index,
            package_path,
            package,
        })
    }

    /// Package metadata (title, language, creators, identifier).
    pub fn metadata(&self) -> &Metadata {
        &self.package.metadata
    }

    /// The parsed package document.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Archive entry names in source order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Spine-ordered XHTML content documents.
    ///
    /// Every spine itemref must resolve to a manifest item; documents that
    /// resolve to a missing archive entry are a hard error, since a spine
    /// pointing nowhere means the container is broken.
    pub fn documents(&self) -> Result<Vec<DocumentRef>> {
        let mut documents = Vec::new();
        for spine_ref in &self.package.spine {
            let item = self.package.item(&spine_ref.idref).ok_or_else(|| {
                EpubError::InvalidPackage {
                    path: self.package_path.clone(),
                    message: format!("spine references unknown item '{}'", spine_ref.idref),
                }
            })?;
            if !item.is_document() {
                continue;
            }
            let name = resolve_href(&self.package_path, &item.href);
            if !self.index.contains_key(&name) {
                return Err(EpubError::MissingEntry { name });
            }
            documents.push(DocumentRef {
                id: item.id.clone(),
                name,
                nav: item.has_property("nav"),
            });
        }
        Ok(documents)
    }

    /// Read a content document as UTF-8 text.
    pub fn read_document(&self, name: &str) -> Result<String> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| EpubError::MissingEntry {
                name: name.to_string(),
            })?;
        let data = &self.entries[i].data;
        // Strip a UTF-8 BOM if present; some producers emit one.
        let data = data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(data);
        String::from_utf8(data.to_vec()).map_err(|_| EpubError::NotUtf8 {
            name: name.to_string(),
        })
    }

    /// Replace a content document's bytes.
    pub fn replace_document(&mut self, name: &str, html: String) -> Result<()> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| EpubError::MissingEntry {
                name: name.to_string(),
            })?;
        self.entries[i].data = html.into_bytes();
        Ok(())
    }

    /// Write the container to disk.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to_writer(BufWriter::new(file))
    }

    /// Write the container to any seekable writer.
    ///
    /// The `mimetype` entry comes first and uncompressed as OCF requires;
    /// all other entries keep the source archive's order.
    pub fn write_to_writer<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file(MIMETYPE_ENTRY, stored)?;
        zip.write_all(EPUB_MIMETYPE.as_bytes())?;

        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in &self.entries {
            if entry.name == MIMETYPE_ENTRY {
                continue;
            }
            zip.start_file(entry.name.as_str(), deflated)?;
            zip.write_all(&entry.data)?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// Entry list before the package has been parsed.
struct RawArchive {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl RawArchive {
    fn verify_mimetype(&self) -> Result<()> {
        let found = self.read_str(MIMETYPE_ENTRY)?;
        let found = found.trim();
        if found != EPUB_MIMETYPE {
            return Err(EpubError::InvalidMimetype {
                found: found.to_string(),
            });
        }
        Ok(())
    }

    fn read_str(&self, name: &str) -> Result<String> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| EpubError::MissingEntry {
                name: name.to_string(),
            })?;
        String::from_utf8(self.entries[i].data.clone()).map_err(|_| EpubError::NotUtf8 {
            name: name.to_string(),
        })
    }
}
