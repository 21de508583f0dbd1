//! Grouping segments into API request batches.
//!
//! Segments are grouped at sentence boundaries so a request never splits
//! a sentence that runs across text nodes, then capped at `chunk_size`
//! segments per request.

use crate::segment::Segment;

/// True when a segment plausibly ends a sentence.
fn ends_sentence(text: &str) -> bool {
    matches!(
        text.trim_end().chars().next_back(),
        Some('.') | Some('?') | Some('!')
    )
}

/// Split segments into request batches.
pub fn batch_segments(segments: Vec<Segment>, chunk_size: usize) -> Vec<Vec<Segment>> {
    let chunk_size = chunk_size.max(1);

    let mut groups: Vec<Vec<Segment>> = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    for segment in segments {
        let boundary = ends_sentence(&segment.text);
        current.push(segment);
        if boundary {
            groups.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }

    // Cap oversized groups; a run of short nodes (verse, dialogue) can
    // otherwise produce a request too large for one completion.
    let mut batches = Vec::new();
    for group in groups {
        if group.len() <= chunk_size {
            batches.push(group);
        } else {
            let mut group = group.into_iter();
            loop {
                let chunk: Vec<Segment> = group.by_ref().take(chunk_size).collect();
                if chunk.is_empty() {
                    break;
                }
                batches.push(chunk);
            }
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(texts: &[&str]) -> Vec<Segment> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| Segment {
                index,
                text: text.to_string(),
            })
            .collect()
    }

    #[test]
    fn groups_break_at_sentence_boundaries() {
        let batches = batch_segments(
            segments(&["To be, or not to be,", "that is the question.", "Whether 'tis nobler"]),
            10,
        );

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn question_and_exclamation_end_groups() {
        let batches = batch_segments(segments(&["Who's there?", "Stand and unfold yourself!"]), 10);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn oversized_groups_are_capped() {
        let texts: Vec<String> = (0..25).map(|i| format!("line {i},")).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();

        let batches = batch_segments(segments(&refs), 10);

        let sizes: Vec<_> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn order_is_preserved_across_batches() {
        let texts: Vec<String> = (0..7).map(|i| format!("segment {i}.")).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();

        let batches = batch_segments(segments(&refs), 3);

        let flattened: Vec<_> = batches.iter().flatten().map(|s| s.index).collect();
        assert_eq!(flattened, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(batch_segments(Vec::new(), 10).is_empty());
    }
}
