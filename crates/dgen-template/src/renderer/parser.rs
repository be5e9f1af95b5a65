//! Block structure parser

use super::ast::{Condition, ForBlock, IfBlock, Node, Path, Program};
use super::expr;
use super::lexer::{self, Segment};
use crate::error::ParseError;

enum Tag {
    If(Condition),
    Elif(Condition),
    Else,
    EndIf,
    For(String, Path),
    EndFor,
}

impl Tag {
    fn parse(src: &str, line: usize) -> Result<Self, ParseError> {
        let (head, rest) = match src.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (src, ""),
        };
        let no_args = |tag: Tag| {
            if rest.is_empty() {
                Ok(tag)
            } else {
                Err(ParseError::syntax(line, format!("'{head}' takes no arguments")))
            }
        };
        match head {
            "if" => expr::parse_condition(rest, line).map(Tag::If),
            "elif" => expr::parse_condition(rest, line).map(Tag::Elif),
            "else" => no_args(Tag::Else),
            "endif" => no_args(Tag::EndIf),
            "for" => expr::parse_for_header(rest, line).map(|(var, path)| Tag::For(var, path)),
            "endfor" => no_args(Tag::EndFor),
            "" => Err(ParseError::syntax(line, "empty tag")),
            other => Err(ParseError::syntax(line, format!("unknown tag '{other}'"))),
        }
    }
}

/// Tag that ended a block
enum End {
    Elif(Condition, usize),
    Else(usize),
    EndIf(usize),
    EndFor(usize),
}

impl End {
    fn unexpected(self) -> ParseError {
        let (line, tag) = match self {
            Self::Elif(_, line) => (line, "elif"),
            Self::Else(line) => (line, "else"),
            Self::EndIf(line) => (line, "endif"),
            Self::EndFor(line) => (line, "endfor"),
        };
        ParseError::Unexpected {
            line,
            tag: tag.to_string(),
        }
    }
}

fn unclosed(line: usize, tag: &str) -> ParseError {
    ParseError::Unclosed {
        line,
        tag: tag.to_string(),
    }
}

struct BlockParser<'a> {
    segments: std::vec::IntoIter<Segment<'a>>,
}

impl BlockParser<'_> {
    fn block(&mut self) -> Result<(Vec<Node>, Option<End>), ParseError> {
        let mut nodes = Vec::new();
        while let Some(segment) = self.segments.next() {
            match segment {
                Segment::Text(text) => nodes.push(Node::Text(text.to_string())),
                Segment::Output { src, line } => {
                    nodes.push(Node::Output(expr::parse_output(src, line)?));
                }
                Segment::Tag { src, line } => match Tag::parse(src, line)? {
                    Tag::If(cond) => nodes.push(self.if_block(cond, line)?),
                    Tag::For(var, iterable) => nodes.push(self.for_block(var, iterable, line)?),
                    Tag::Elif(cond) => return Ok((nodes, Some(End::Elif(cond, line)))),
                    Tag::Else => return Ok((nodes, Some(End::Else(line)))),
                    Tag::EndIf => return Ok((nodes, Some(End::EndIf(line)))),
                    Tag::EndFor => return Ok((nodes, Some(End::EndFor(line)))),
                },
            }
        }
        Ok((nodes, None))
    }

    fn if_block(&mut self, first: Condition, line: usize) -> Result<Node, ParseError> {
        let mut branches = Vec::new();
        let mut cond = first;
        loop {
            let (body, end) = self.block()?;
            branches.push((cond, body));
            match end {
                Some(End::Elif(next, _)) => cond = next,
                Some(End::EndIf(_)) => {
                    return Ok(Node::If(IfBlock {
                        branches,
                        otherwise: Vec::new(),
                    }))
                }
                Some(End::Else(_)) => {
                    let (otherwise, end) = self.block()?;
                    return match end {
                        Some(End::EndIf(_)) => Ok(Node::If(IfBlock {
                            branches,
                            otherwise,
                        })),
                        Some(other) => Err(other.unexpected()),
                        None => Err(unclosed(line, "if")),
                    };
                }
                Some(other @ End::EndFor(_)) => return Err(other.unexpected()),
                None => return Err(unclosed(line, "if")),
            }
        }
    }

    fn for_block(&mut self, var: String, iterable: Path, line: usize) -> Result<Node, ParseError> {
        let (body, end) = self.block()?;
        match end {
            Some(End::EndFor(_)) => Ok(Node::For(ForBlock {
                var,
                iterable,
                body,
                line,
            })),
            Some(other) => Err(other.unexpected()),
            None => Err(unclosed(line, "for")),
        }
    }
}

/// Parse template source into a [`Program`]
pub(crate) fn parse(body: &str) -> Result<Program, ParseError> {
    let mut parser = BlockParser {
        segments: lexer::tokenize(body)?.into_iter(),
    };
    match parser.block()? {
        (nodes, None) => Ok(Program { nodes }),
        (_, Some(end)) => Err(end.unexpected()),
    }
}
