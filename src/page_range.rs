use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, SplitterError};

/// What the numbers in a range expression count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Page,
    Slide,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Page => f.write_str("page"),
            ItemKind::Slide => f.write_str("slide"),
        }
    }
}

/// How expanded ranges are combined into the final index list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accumulation {
    /// Deduplicated, ascending.
    #[default]
    Sorted,
    /// Parse order; overlapping ranges repeat indices.
    Ordered,
}

/// One comma-separated token of a range expression, 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PageRange {
    /// Parse a single token like "5" or "1-5". Reverse ranges are rejected.
    pub fn parse(s: &str, kind: ItemKind) -> Result<Self> {
        let token = s.trim();
        let parse_error = || SplitterError::ParseError {
            kind,
            token: token.to_string(),
        };

        let range = match token.split_once('-') {
            Some((start, end)) => PageRange {
                start: parse_number(start).ok_or_else(parse_error)?,
                end: Some(parse_number(end).ok_or_else(parse_error)?),
            },
            None => PageRange {
                start: parse_number(token).ok_or_else(parse_error)?,
                end: None,
            },
        };

        if let Some(end) = range.end {
            if range.start > end {
                return Err(SplitterError::InvalidRange {
                    kind,
                    start: range.start,
                    end,
                });
            }
        }

        Ok(range)
    }

    fn last(&self) -> u32 {
        self.end.unwrap_or(self.start)
    }

    /// Check both endpoints against `[1, total]`, reporting the first one outside it.
    pub fn validate(&self, total: usize, kind: ItemKind) -> Result<()> {
        let bound = if self.start < 1 {
            Some(self.start)
        } else if self.last() as usize > total {
            Some(self.last())
        } else {
            None
        };

        match bound {
            Some(bound) => Err(SplitterError::OutOfBounds {
                kind,
                token: self.to_string(),
                bound,
                total,
            }),
            None => Ok(()),
        }
    }

    /// Zero-based indices covered by this range.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        (self.start as usize - 1)..(self.last() as usize)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

fn parse_number(s: &str) -> Option<u32> {
    let s = s.trim();
    // u32::from_str accepts a leading '+'
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn require_expression(s: &str, kind: ItemKind) -> Result<()> {
    if s.trim().is_empty() {
        return Err(SplitterError::MissingInput(match kind {
            ItemKind::Page => "page range",
            ItemKind::Slide => "slide range",
        }));
    }
    Ok(())
}

/// Parse every token of a range expression without knowing the document size.
///
/// Catches malformed and reversed ranges before any document is opened.
pub fn parse_page_ranges(s: &str, kind: ItemKind) -> Result<Vec<PageRange>> {
    require_expression(s, kind)?;
    s.split(',').map(|part| PageRange::parse(part, kind)).collect()
}

/// Expand a range expression like "1-3,5" into zero-based indices.
///
/// Tokens are parsed and validated left to right; the first bad token
/// aborts the whole expression.
pub fn expand_page_ranges(
    s: &str,
    total: usize,
    kind: ItemKind,
    accumulation: Accumulation,
) -> Result<Vec<usize>> {
    require_expression(s, kind)?;

    let mut indices = Vec::new();
    for part in s.split(',') {
        let range = PageRange::parse(part, kind)?;
        range.validate(total, kind)?;
        indices.extend(range.indices());
    }

    Ok(match accumulation {
        Accumulation::Ordered => indices,
        Accumulation::Sorted => indices
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    })
}

/// File-name-safe form of a range expression: "1-3, 5" becomes "1_3_5".
pub fn range_slug(s: &str) -> String {
    s.split(',')
        .map(|part| {
            part.chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == '-' { '_' } else { c })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_")
}
