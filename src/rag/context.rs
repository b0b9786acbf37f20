//! Context building for RAG responses.

use crate::vector_store::SearchResult;

/// Separator placed between retrieved chunks in the prompt.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Join retrieved chunk texts in score order.
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.entry.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// One-line description of a retrieved chunk for the `search` command.
pub fn format_result_for_display(result: &SearchResult) -> String {
    let metadata = &result.entry.metadata;
    format!(
        "{} / {} #{} (score: {:.3})",
        metadata.podcast_name, metadata.episode_name, result.entry.chunk_order, result.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::tests::entry;

    #[test]
    fn test_context_separator() {
        let results = vec![
            SearchResult { entry: entry("first", "E1", vec![1.0]), score: 0.9 },
            SearchResult { entry: entry("second", "E2", vec![1.0]), score: 0.5 },
        ];
        assert_eq!(build_context(&results), "first\n\n---\n\nsecond");
    }

    #[test]
    fn test_single_result_has_no_separator() {
        let results = vec![SearchResult { entry: entry("only", "E1", vec![1.0]), score: 0.9 }];
        assert_eq!(build_context(&results), "only");
    }

    #[test]
    fn test_format_result_for_display() {
        let result = SearchResult { entry: entry("text", "E1", vec![1.0]), score: 0.8 };
        assert_eq!(format_result_for_display(&result), "P1 / E1 #0 (score: 0.800)");
    }
}
