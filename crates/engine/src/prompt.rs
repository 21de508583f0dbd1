//! Prompt construction and reply parsing.
//!
//! Segments travel to the model wrapped in `<string>` tags, one tag per
//! segment, and the reply must echo the same tag count. Replies are
//! parsed leniently: anything outside the tags is ignored.

use once_cell::sync::Lazy;
use regex::Regex;

/// System instruction for rewrite requests.
pub const REWRITE_SYSTEM: &str =
    "Only respond with the rewritten text. Do not include any other text or formatting.";

/// System instruction for classification requests.
pub const CLASSIFY_SYSTEM: &str =
    "Only respond with the requested tag. Do not include any other text.";

static STRING_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<string>(.*?)</string>").expect("valid regex"));

static SHOULD_REWRITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<should_rewrite>(.*?)</should_rewrite>").expect("valid regex"));

/// Wrap segment texts in `<string>` tags, one per line.
pub fn wrap_segments<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .map(|t| format!("<string>{}</string>", t.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The rewrite instruction for a batch of `count` segments.
///
/// `correction` carries feedback from a previous attempt that returned
/// the wrong number of segments.
pub fn rewrite_prompt(count: usize, correction: Option<&str>) -> String {
    format!(
        r#"Rewrite the text into clear, modern English while preserving the original meaning, tone, and style as much as possible.
Replace archaic words and phrases, and update the syntax so it flows naturally for a contemporary reader.
Keep proper nouns and names consistent, and keep historical or cultural references that are integral to the text.
Keep numbers, dates, technical terms, and acronyms as they are.
Keep numbered lists and formats.
If a segment does not need rewriting, return it unchanged.

Each segment is wrapped in <string></string> tags. Respond with the same number of <string></string> tags, in the same order.

Examples:
<input>
    <string>[Note: The introduction, notes and index have been omitted.]</string>
</input>
<output>
    <string>[Note: The introduction, notes and index have been omitted.]</string>
</output>
<input>
    <string>Sir, in this audience,</string>
    <string>Let my disclaiming from a purpos'd evil</string>
    <string>Free me so far in your most generous thoughts</string>
</input>
<output>
    <string>Sir, before everyone here,</string>
    <string>let my denial of any intended harm</string>
    <string>clear me in your generous opinion</string>
</output>
<input>
    <string>What, art a heathen? How dost thou understand the Scripture?</string>
</input>
<output>
    <string>What? Are you a pagan? How do you understand the Scripture?</string>
</output>

There are {count} tags in the original text.
{correction}"#,
        count = count,
        correction = correction.unwrap_or(""),
    )
}

/// The classification instruction: is this batch prose worth rewriting?
pub fn classify_prompt() -> String {
    r#"You are determining whether the text should be rewritten into modern English.

If the text in the string tags is only any of the following, return false:
- A list of dates
- A list of names
- A list of acronyms
- A list of technical terms
- A list of numbers

If the text in the string tags contains sentences from a book, return true.

Respond:
<should_rewrite>
true|false
</should_rewrite>"#
        .to_string()
}

/// Feedback appended to the prompt after a wrong-count reply.
pub fn correction_note(previous_reply: &str, expected: usize, got: usize) -> String {
    format!(
        r#"
<attempt>
    <output>
        {previous_reply}
    </output>
    <reason>
        This is wrong because there are {expected} segments in the original text,
        but {got} strings in the rewritten text.
        Return exactly {expected} <string></string> tags.
    </reason>
</attempt>
"#
    )
}

/// Pull every `<string>` body out of a reply, trimmed.
pub fn extract_strings(reply: &str) -> Vec<String> {
    STRING_TAG_RE
        .captures_iter(reply)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Parse a classification reply. Unparseable replies default to `true`,
/// so an off-script answer never drops content on the floor.
pub fn parse_should_rewrite(reply: &str) -> bool {
    match SHOULD_REWRITE_RE
        .captures(reply)
        .map(|c| c[1].trim().to_ascii_lowercase())
    {
        Some(value) if value == "false" => false,
        _ => true,
    }
}
