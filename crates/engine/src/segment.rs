//! Text-node extraction and substitution for XHTML content documents.
//!
//! Rewriting works in two streaming passes over the same bytes. The
//! extraction pass collects every complete text node inside a `<p>`
//! element; the substitution pass walks the identical node sequence and
//! splices in the replacements. Both passes skip whitespace-only nodes,
//! so replacement indices always line up.

use lol_html::html_content::{ContentType, TextChunk, TextType};
use lol_html::{HtmlRewriter, Settings, text};

use crate::error::Result;

/// One rewritable text node: character data inside a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Ordinal among the document's non-blank paragraph text nodes.
    pub index: usize,
    /// Node text with HTML entities decoded.
    pub text: String,
}

/// Collect the non-blank paragraph text nodes of a document, in order.
pub fn extract_segments(html: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut pending = String::new();

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![text!("p", |chunk: &mut TextChunk| {
                // Script/style data inside a paragraph is not prose.
                if chunk.text_type() != TextType::Data {
                    return Ok(());
                }
                pending.push_str(chunk.as_str());
                if chunk.last_in_text_node() {
                    let decoded = html_escape::decode_html_entities(&pending).into_owned();
                    pending.clear();
                    if !decoded.trim().is_empty() {
                        segments.push(Segment {
                            index: segments.len(),
                            text: decoded,
                        });
                    }
                }
                Ok(())
            })],
            ..Settings::new()
        },
        |_: &[u8]| {},
    );

    rewriter.write(html.as_bytes())?;
    rewriter.end()?;

    Ok(segments)
}

/// Substitute paragraph text nodes with their replacements.
///
/// `replacements[i]` targets the i-th non-blank text node; `None` leaves
/// the node byte-identical. Replacement text is inserted escaped, so a
/// reply cannot inject markup into the document.
pub fn apply_replacements(html: &str, replacements: &[Option<String>]) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let mut pending = String::new();
    let mut next = 0usize;

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![text!("p", |chunk: &mut TextChunk| {
                if chunk.text_type() != TextType::Data {
                    return Ok(());
                }
                if !chunk.last_in_text_node() {
                    // Buffer partial chunks; the node is decided on its
                    // final chunk.
                    pending.push_str(chunk.as_str());
                    chunk.remove();
                    return Ok(());
                }

                let raw = format!("{}{}", pending, chunk.as_str());
                pending.clear();

                let decoded = html_escape::decode_html_entities(&raw);
                if decoded.trim().is_empty() {
                    // Blank node: put the original bytes back untouched.
                    chunk.replace(&raw, ContentType::Html);
                    return Ok(());
                }

                let replacement = replacements.get(next).and_then(|r| r.as_deref());
                next += 1;
                match replacement {
                    Some(new_text) => chunk.replace(new_text, ContentType::Text),
                    None => chunk.replace(&raw, ContentType::Html),
                }
                Ok(())
            })],
            ..Settings::new()
        },
        |bytes: &[u8]| output.extend_from_slice(bytes),
    );

    rewriter.write(html.as_bytes())?;
    rewriter.end()?;

    // The output is our own escaping of UTF-8 input, so this cannot fail.
    Ok(String::from_utf8_lossy(&output).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<html><body>\
        <h1>Not a paragraph</h1>\
        <p>First sentence.</p>\
        <p>Second with <em>emphasis</em> inside.</p>\
        <p>   </p>\
        <p>Entities like &amp; and &#8217; decode.</p>\
        </body></html>";

    #[test]
    fn extracts_paragraph_text_nodes_in_order() {
        let segments = extract_segments(DOC).unwrap();
        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "First sentence.",
                "Second with ",
                "emphasis",
                " inside.",
                "Entities like & and \u{2019} decode.",
            ]
        );
        let indices: Vec<_> = segments.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn heading_text_is_not_extracted() {
        let segments = extract_segments(DOC).unwrap();
        assert!(segments.iter().all(|s| !s.text.contains("Not a paragraph")));
    }

    #[test]
    fn all_none_substitution_is_a_fixpoint() {
        let segments = extract_segments(DOC).unwrap();
        let replacements = vec![None; segments.len()];
        let output = apply_replacements(DOC, &replacements).unwrap();

        assert_eq!(extract_segments(&output).unwrap(), segments);
        assert_eq!(output, DOC);
    }

    #[test]
    fn substitution_targets_the_right_nodes() {
        let segments = extract_segments(DOC).unwrap();
        let mut replacements = vec![None; segments.len()];
        replacements[0] = Some("A rewritten opener.".to_string());
        replacements[2] = Some("stress".to_string());

        let output = apply_replacements(DOC, &replacements).unwrap();

        assert!(output.contains("<p>A rewritten opener.</p>"));
        assert!(output.contains("<em>stress</em>"));
        assert!(output.contains("Second with "));
        assert!(output.contains("Entities like &amp; and &#8217; decode."));
    }

    #[test]
    fn replacement_text_is_escaped() {
        let html = "<p>plain</p>";
        let replacements = vec![Some("a < b & c".to_string())];
        let output = apply_replacements(html, &replacements).unwrap();

        assert!(output.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn node_count_is_preserved() {
        let segments = extract_segments(DOC).unwrap();
        let replacements: Vec<_> = segments
            .iter()
            .map(|s| Some(s.text.to_uppercase()))
            .collect();
        let output = apply_replacements(DOC, &replacements).unwrap();

        assert_eq!(extract_segments(&output).unwrap().len(), segments.len());
    }
}
