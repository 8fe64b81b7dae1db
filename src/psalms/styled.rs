//! Inline styling for verses and lyrics.
//!
//! Three markers are recognized: `**bold**`, `*italic*` and `~~strikethrough~~`.
//! A single `*` only opens or closes italics when it is not next to another
//! `*`. Markers without a closing partner are kept as literal text. Nesting is
//! not supported.

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Bold(&'a str),
    Italic(&'a str),
    Strike(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match *self {
            Segment::Plain(t) | Segment::Bold(t) | Segment::Italic(t) | Segment::Strike(t) => t,
        }
    }
}

fn is_lone_star(bytes: &[u8], p: usize) -> bool {
    bytes[p] == b'*'
        && (p == 0 || bytes[p - 1] != b'*')
        && (p + 1 == bytes.len() || bytes[p + 1] != b'*')
}

/// Split `text` into plain and styled runs. Adjacent plain text forms one run.
///
/// ```
/// use devotions::psalms::styled::{parse, Segment};
///
/// assert_eq!(
///     parse("**Selah** and *rest*"),
///     vec![Segment::Bold("Selah"), Segment::Plain(" and "), Segment::Italic("rest")]
/// );
/// ```
pub fn parse(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i < text.len() {
        if let Some((segment, end)) = styled_run(text, i) {
            push_plain(&mut segments, &text[plain_start..i]);
            segments.push(segment);
            i = end;
            plain_start = i;
            continue;
        }

        // Skip ahead to the next possible marker. A marker that opens nothing
        // is consumed as literal text.
        let rest = &text[i..];
        let next = [rest.find("~~"), rest.find('*')]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(rest.len());
        i += if next > 0 {
            next
        } else if rest.starts_with("**") || rest.starts_with("~~") {
            2
        } else {
            1
        };
    }

    push_plain(&mut segments, &text[plain_start..]);
    segments
}

fn push_plain<'a>(segments: &mut Vec<Segment<'a>>, plain: &'a str) {
    if !plain.is_empty() {
        segments.push(Segment::Plain(plain));
    }
}

/// The styled run opening at byte `i`, and the index just past its closing marker.
fn styled_run(text: &str, i: usize) -> Option<(Segment<'_>, usize)> {
    let rest = &text[i..];
    for marker in ["**", "~~"] {
        if let Some(body) = rest.strip_prefix(marker) {
            if let Some(len) = body.find(marker) {
                let inner = &body[..len];
                let segment = if marker == "**" {
                    Segment::Bold(inner)
                } else {
                    Segment::Strike(inner)
                };
                return Some((segment, i + len + 2 * marker.len()));
            }
        }
    }

    let bytes = text.as_bytes();
    if is_lone_star(bytes, i) {
        let end = (i + 1..bytes.len()).find(|&p| is_lone_star(bytes, p))?;
        return Some((Segment::Italic(&text[i + 1..end]), end + 1));
    }
    None
}

/// Render segments with ANSI styling for a terminal.
pub fn render_ansi(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for segment in segments {
        // Writing to a String cannot fail.
        let _ = match segment {
            Segment::Plain(t) => write!(out, "{}", t),
            Segment::Bold(t) => write!(out, "\x1b[1m{}\x1b[22m", t),
            Segment::Italic(t) => write!(out, "\x1b[3m{}\x1b[23m", t),
            Segment::Strike(t) => write!(out, "\x1b[9m{}\x1b[29m", t),
        };
    }
    out
}

/// Render segments as bare text with the markers removed.
pub fn render_plain(segments: &[Segment<'_>]) -> String {
    segments.iter().map(Segment::text).collect()
}
