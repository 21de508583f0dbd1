//! OCF container and OPF package document parsing.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{EpubError, Result};
use crate::types::{ManifestItem, Metadata, Package, SpineRef};

/// Parse `META-INF/container.xml` and return the rootfile path.
pub fn parse_container(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"rootfile" {
                    let media_type = attr_value(&e, b"media-type")?;
                    let is_package = media_type
                        .as_deref()
                        .map(|m| m == "application/oebps-package+xml")
                        .unwrap_or(true);
                    if is_package {
                        if let Some(path) = attr_value(&e, b"full-path")? {
                            return Ok(path);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(EpubError::InvalidContainer {
        message: "no rootfile declared".to_string(),
    })
}

/// Parse an OPF package document.
pub fn parse_package(path: &str, xml: &str) -> Result<Package> {
    let mut reader = Reader::from_str(xml);

    let mut package = Package::default();
    let mut in_metadata = false;
    let mut current_field: Option<MetaField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = true,
                b"title" if in_metadata => current_field = Some(MetaField::Title),
                b"language" if in_metadata => current_field = Some(MetaField::Language),
                b"identifier" if in_metadata => current_field = Some(MetaField::Identifier),
                b"creator" if in_metadata => current_field = Some(MetaField::Creator),
                b"item" => package.manifest.push(manifest_item(path, &e)?),
                b"itemref" => package.spine.push(spine_ref(path, &e)?),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"item" => package.manifest.push(manifest_item(path, &e)?),
                b"itemref" => package.spine.push(spine_ref(path, &e)?),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = false,
                b"title" | b"language" | b"identifier" | b"creator" => current_field = None,
                _ => {}
            },
            Event::Text(t) => {
                if let Some(field) = current_field {
                    let text = t.unescape()?;
                    let text = text.trim();
                    if !text.is_empty() {
                        let meta = &mut package.metadata;
                        match field {
                            MetaField::Title => set_once(&mut meta.title, text),
                            MetaField::Language => set_once(&mut meta.language, text),
                            MetaField::Identifier => set_once(&mut meta.identifier, text),
                            MetaField::Creator => meta.creators.push(text.to_string()),
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if package.spine.is_empty() {
        return Err(EpubError::InvalidPackage {
            path: path.to_string(),
            message: "spine is empty".to_string(),
        });
    }

    Ok(package)
}

/// Resolve a manifest href against the package document's directory,
/// normalising `.`/`..` segments and stripping any fragment.
pub fn resolve_href(package_path: &str, href: &str) -> String {
    let href = href.split(['#', '?']).next().unwrap_or(href);
    let href = percent_decode(href);

    let base = match package_path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    };

    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            if let Ok(value) = u8::from_str_radix(&input[i + 1..i + 3], 16) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[derive(Debug, Clone, Copy)]
enum MetaField {
    Title,
    Language,
    Identifier,
    Creator,
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn manifest_item(path: &str, e: &BytesStart) -> Result<ManifestItem> {
    let id = required_attr(path, e, b"id")?;
    let href = required_attr(path, e, b"href")?;
    let media_type = required_attr(path, e, b"media-type")?;
    let properties = attr_value(e, b"properties")?;

    Ok(ManifestItem {
        id,
        href,
        media_type,
        properties,
    })
}

fn spine_ref(path: &str, e: &BytesStart) -> Result<SpineRef> {
    let idref = required_attr(path, e, b"idref")?;
    let linear = attr_value(e, b"linear")?
        .map(|v| v != "no")
        .unwrap_or(true);

    Ok(SpineRef { idref, linear })
}

fn required_attr(path: &str, e: &BytesStart, name: &[u8]) -> Result<String> {
    attr_value(e, name)?.ok_or_else(|| EpubError::InvalidPackage {
        path: path.to_string(),
        message: format!(
            "<{}> is missing the '{}' attribute",
            String::from_utf8_lossy(e.local_name().as_ref()),
            String::from_utf8_lossy(name),
        ),
    })
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value()?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const PACKAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Wuthering Heights</dc:title>
    <dc:creator>Emily Bront&#235;</dc:creator>
    <dc:language>en</dc:language>
    <dc:identifier id="uid">urn:uuid:1234</dc:identifier>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ch1" href="text/chapter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="ch1"/>
    <itemref idref="nav" linear="no"/>
  </spine>
</package>"#;

    #[test]
    fn container_rootfile_path() {
        let path = parse_container(CONTAINER).unwrap();
        assert_eq!(path, "OEBPS/content.opf");
    }

    #[test]
    fn container_without_rootfile_is_rejected() {
        let result = parse_container("<container><rootfiles/></container>");
        assert!(matches!(result, Err(EpubError::InvalidContainer { .. })));
    }

    #[test]
    fn package_metadata_and_manifest() {
        let package = parse_package("OEBPS/content.opf", PACKAGE).unwrap();

        assert_eq!(package.metadata.title.as_deref(), Some("Wuthering Heights"));
        assert_eq!(package.metadata.creators, vec!["Emily Brontë"]);
        assert_eq!(package.metadata.language.as_deref(), Some("en"));
        assert_eq!(package.manifest.len(), 3);
        assert!(package.item("nav").unwrap().has_property("nav"));
        assert!(package.item("ch1").unwrap().is_document());
        assert!(!package.item("css").unwrap().is_document());
    }

    #[test]
    fn spine_order_and_linear() {
        let package = parse_package("OEBPS/content.opf", PACKAGE).unwrap();

        let idrefs: Vec<_> = package.spine.iter().map(|s| s.idref.as_str()).collect();
        assert_eq!(idrefs, vec!["ch1", "nav"]);
        assert!(package.spine[0].linear);
        assert!(!package.spine[1].linear);
    }

    #[test]
    fn empty_spine_is_rejected() {
        let xml = r#"<package><manifest/><spine/></package>"#;
        let result = parse_package("content.opf", xml);
        assert!(matches!(result, Err(EpubError::InvalidPackage { .. })));
    }

    #[test]
    fn href_resolution() {
        assert_eq!(
            resolve_href("OEBPS/content.opf", "text/ch1.xhtml"),
            "OEBPS/text/ch1.xhtml"
        );
        assert_eq!(
            resolve_href("OEBPS/content.opf", "../images/cover.png"),
            "images/cover.png"
        );
        assert_eq!(resolve_href("content.opf", "ch1.xhtml"), "ch1.xhtml");
        assert_eq!(
            resolve_href("OEBPS/content.opf", "nav.xhtml#toc"),
            "OEBPS/nav.xhtml"
        );
        assert_eq!(
            resolve_href("OEBPS/content.opf", "My%20Chapter.xhtml"),
            "OEBPS/My Chapter.xhtml"
        );
    }
}
