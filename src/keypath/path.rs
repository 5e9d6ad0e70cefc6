use crate::keypath::errors::PathError;
use std::fmt;
use std::str::FromStr;

/// One hop through a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Key lookup in a map.
    MapKey(String),
    /// Position in a sequence.
    SequenceIndex(usize),
}

impl Segment {
    pub fn key(key: impl Into<String>) -> Self {
        Segment::MapKey(key.into())
    }

    pub fn index(index: usize) -> Self {
        Segment::SequenceIndex(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::MapKey(key) => write!(f, "'{key}'"),
            Segment::SequenceIndex(index) => write!(f, "[{index}]"),
        }
    }
}

/// A parsed path expression such as `serve.vllm.vllm_args[0]`.
///
/// Always holds at least one segment. The expression it was parsed from is
/// kept so that errors can quote it back to the operator unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    raw: String,
    segments: Vec<Segment>,
}

impl KeyPath {
    /// Parse a path expression.
    ///
    /// Dots separate bare keys, brackets hold either an integer index or a
    /// (possibly quoted) key that may itself contain dots: `a.b["x.y"][2]`.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let segments = parse_segments(input)?;
        if segments.is_empty() {
            return Err(PathError::Empty {
                input: input.to_string(),
            });
        }
        Ok(Self {
            raw: input.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments walked through before the assignment.
    pub fn traversal(&self) -> &[Segment] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The segment that receives the assigned value.
    pub fn terminal(&self) -> &Segment {
        &self.segments[self.segments.len() - 1]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for KeyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(s)
    }
}

fn parse_segments(input: &str) -> Result<Vec<Segment>, PathError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for ch in input.chars() {
        if in_brackets {
            match ch {
                ']' => {
                    segments.push(bracket_segment(input, &current)?);
                    current.clear();
                    in_brackets = false;
                }
                '[' => {
                    // Nested opener: keep what we have verbatim and start over.
                    if !current.is_empty() {
                        segments.push(Segment::MapKey(std::mem::take(&mut current)));
                    }
                }
                other => current.push(other),
            }
            continue;
        }

        match ch {
            '.' => {
                if !current.is_empty() {
                    segments.push(Segment::MapKey(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(Segment::MapKey(std::mem::take(&mut current)));
                }
                in_brackets = true;
            }
            other => current.push(other),
        }
    }

    if in_brackets {
        tracing::warn!(
            path = input,
            "unclosed '[' in path expression; using the remainder as a key"
        );
    }

    if !current.is_empty() {
        segments.push(Segment::MapKey(current));
    }

    Ok(segments)
}

fn bracket_segment(input: &str, content: &str) -> Result<Segment, PathError> {
    let stripped = content.trim_matches('"').trim_matches('\'').trim();
    match parse_index(input, stripped)? {
        Some(index) => Ok(Segment::SequenceIndex(index)),
        None => Ok(Segment::MapKey(stripped.to_string())),
    }
}

/// `Ok(None)` when the text is not an integer at all.
fn parse_index(input: &str, text: &str) -> Result<Option<usize>, PathError> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    if negative && digits.bytes().any(|b| b != b'0') {
        return Err(PathError::NegativeIndex {
            input: input.to_string(),
            index: text.to_string(),
        });
    }

    digits
        .parse::<usize>()
        .map(Some)
        .map_err(|_| PathError::IndexOverflow {
            input: input.to_string(),
            index: text.to_string(),
        })
}
