//! Positioned table text.
//!
//! Reports are read as words with bounding boxes, not as plain text, so
//! table columns are recovered from where the text sits on the page. Words
//! sharing a baseline form a [`TextLine`]; words on a line separated by less
//! than a couple of character widths form one [`Segment`] (one cell of
//! text).

use std::sync::LazyLock;

use regex::Regex;

/// Words whose tops differ by at most this many points share a line.
const LINE_TOLERANCE: f64 = 3.0;

/// Horizontal gap, in average character widths, that still joins two words
/// into one segment.
const SEGMENT_GAP_CHARS: f64 = 1.5;

static DATE_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2})$").unwrap_or_else(|_| unreachable!())
});

/// A word and its bounding box, in points from the top-left of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    /// Word text, without surrounding whitespace.
    pub text: String,
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl PlacedWord {
    /// Creates a word from its text and bounding box.
    #[must_use]
    pub fn new(text: impl Into<String>, x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
            x1,
            bottom,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn char_width(&self) -> f64 {
        (self.x1 - self.x0) / self.text.chars().count().max(1) as f64
    }
}

/// The words of one page, in any order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    /// Every word on the page.
    pub words: Vec<PlacedWord>,
}

/// A run of adjacent words on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Words joined by single spaces.
    pub text: String,
    /// Left edge of the first word.
    pub x0: f64,
    /// Right edge of the last word.
    pub x1: f64,
}

/// Words sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Words sorted by left edge.
    pub words: Vec<PlacedWord>,
}

impl TextLine {
    /// Line text with words joined by single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Splits the line into segments wherever the gap between two words is
    /// wider than [`SEGMENT_GAP_CHARS`] average character widths.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut previous: Option<&PlacedWord> = None;

        for word in &self.words {
            let joins = previous.is_some_and(|prev| {
                let limit = SEGMENT_GAP_CHARS * prev.char_width().max(word.char_width());
                word.x0 - prev.x1 <= limit
            });

            match segments.last_mut() {
                Some(segment) if joins => {
                    segment.text.push(' ');
                    segment.text.push_str(&word.text);
                    segment.x1 = segment.x1.max(word.x1);
                }
                _ => segments.push(Segment {
                    text: word.text.clone(),
                    x0: word.x0,
                    x1: word.x1,
                }),
            }
            previous = Some(word);
        }

        segments
    }
}

/// Groups the words of a page into lines, top to bottom, each sorted left
/// to right. Blank words are dropped.
#[must_use]
pub fn group_lines(words: &[PlacedWord]) -> Vec<TextLine> {
    let mut sorted: Vec<&PlacedWord> = words
        .iter()
        .filter(|w| !w.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<(f64, TextLine)> = Vec::new();
    for word in sorted {
        match lines.last_mut() {
            Some((top, line)) if word.top - *top <= LINE_TOLERANCE => {
                line.words.push(word.clone());
            }
            _ => lines.push((
                word.top,
                TextLine {
                    words: vec![word.clone()],
                },
            )),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut line)| {
            line.words.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            line
        })
        .collect()
}

/// Returns `true` if `cell` looks like a filing date (`MM/DD/YYYY` or
/// `YYYY-MM-DD`).
#[must_use]
pub fn is_date_cell(cell: &str) -> bool {
    DATE_CELL.is_match(cell.trim())
}

/// Collapses every run of whitespace (including newlines) to one space.
#[must_use]
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
