//! Splits template source into text, output and tag segments

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    /// Inside `{{ ... }}`, trimmed
    Output { src: &'a str, line: usize },
    /// Inside `{% ... %}`, trimmed
    Tag { src: &'a str, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delim {
    Output,
    Tag,
    Comment,
}

impl Delim {
    const fn open(self) -> &'static str {
        match self {
            Self::Output => "{{",
            Self::Tag => "{%",
            Self::Comment => "{#",
        }
    }

    const fn close(self) -> &'static str {
        match self {
            Self::Output => "}}",
            Self::Tag => "%}",
            Self::Comment => "#}",
        }
    }
}

fn find_open(s: &str) -> Option<(usize, Delim)> {
    let bytes = s.as_bytes();
    s.match_indices('{').find_map(|(idx, _)| {
        let delim = match bytes.get(idx + 1) {
            Some(b'{') => Delim::Output,
            Some(b'%') => Delim::Tag,
            Some(b'#') => Delim::Comment,
            _ => return None,
        };
        Some((idx, delim))
    })
}

fn newlines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}

pub(crate) fn tokenize(body: &str) -> Result<Vec<Segment<'_>>, ParseError> {
    let mut out = Vec::new();
    let mut rest = body;
    let mut line = 1;

    while let Some((idx, delim)) = find_open(rest) {
        if idx > 0 {
            let text = &rest[..idx];
            out.push(Segment::Text(text));
            line += newlines(text);
        }
        let after = &rest[idx + 2..];
        let end = after.find(delim.close()).ok_or_else(|| {
            ParseError::syntax(line, format!("'{}' is never closed", delim.open()))
        })?;
        let inner = &after[..end];
        match delim {
            Delim::Output => out.push(Segment::Output {
                src: inner.trim(),
                line,
            }),
            Delim::Tag => out.push(Segment::Tag {
                src: inner.trim(),
                line,
            }),
            Delim::Comment => {}
        }
        line += newlines(inner);
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    Ok(out)
}
