//! Overlapping character splitter with natural breakpoints.
//!
//! Windows are `chunk_size` characters wide. When a window does not reach the end of the
//! text, its end is pulled back to the latest paragraph, line, sentence or word boundary
//! that still leaves room for the overlap; only when none exists is the window cut hard.
//! The next window always starts exactly `overlap` characters before the previous end.

use super::ChunkingConfig;

/// A span of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Offset of the first character, counted in characters.
    pub start: usize,
    /// The span text.
    pub text: String,
}

/// Boundary kinds in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breakpoint {
    Paragraph,
    Line,
    Sentence,
    Word,
}

const BREAKPOINTS: [Breakpoint; 4] = [
    Breakpoint::Paragraph,
    Breakpoint::Line,
    Breakpoint::Sentence,
    Breakpoint::Word,
];

impl Breakpoint {
    /// Whether cutting right before `chars[cut]` ends a span on this boundary.
    fn matches(self, chars: &[char], cut: usize) -> bool {
        let prev = chars[cut - 1];
        match self {
            Breakpoint::Paragraph => cut >= 2 && prev == '\n' && chars[cut - 2] == '\n',
            Breakpoint::Line => prev == '\n',
            Breakpoint::Sentence => {
                cut >= 2 && prev.is_whitespace() && matches!(chars[cut - 2], '.' | '!' | '?')
            }
            Breakpoint::Word => prev.is_whitespace(),
        }
    }
}

/// Splits text into overlapping spans.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: ChunkingConfig,
}

impl TextSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split `text` into ordered spans.
    ///
    /// Text no longer than the chunk size comes back as a single span at offset 0.
    /// Empty text yields no spans.
    pub fn split(&self, text: &str) -> Vec<Span> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let size = self.config.chunk_size();
        let overlap = self.config.overlap();

        if total == 0 {
            return Vec::new();
        }
        if total <= size {
            return vec![Span {
                start: 0,
                text: text.to_string(),
            }];
        }

        let mut spans = Vec::new();
        let mut start = 0;

        loop {
            let limit = start + size;
            if limit >= total {
                spans.push(span(&chars, start, total));
                break;
            }

            let end = self.find_cut(&chars, start, limit);
            spans.push(span(&chars, start, end));
            start = end - overlap;
        }

        spans
    }

    /// Latest preferred cut in `(start + overlap, limit]`, falling back to `limit`.
    fn find_cut(&self, chars: &[char], start: usize, limit: usize) -> usize {
        let floor = start + self.config.overlap();

        for breakpoint in BREAKPOINTS {
            if let Some(cut) = (floor + 1..=limit)
                .rev()
                .find(|&cut| breakpoint.matches(chars, cut))
            {
                return cut;
            }
        }

        limit
    }
}

fn span(chars: &[char], start: usize, end: usize) -> Span {
    Span {
        start,
        text: chars[start..end].iter().collect(),
    }
}
