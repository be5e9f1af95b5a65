//! Expression and condition parsing
//!
//! ```text
//! expr      := operand ( '|' name [ '(' literal (',' literal)* ')' ] )*
//! operand   := path | literal
//! condition := and ( 'or' and )*
//! and       := unary ( 'and' unary )*
//! unary     := 'not' unary | expr [ ('==' | '!=') expr ]
//! ```

use super::ast::{Condition, Expr, FilterCall, Operand, Path, PathSegment};
use super::filters::Filter;
use crate::error::ParseError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Str(String),
    Num(Value),
    Pipe,
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn lex(src: &str, line: usize) -> Result<Vec<Tok>, ParseError> {
    let mut toks = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '|' => {
                chars.next();
                toks.push(Tok::Pipe);
            }
            '(' => {
                chars.next();
                toks.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                toks.push(Tok::RParen);
            }
            ',' => {
                chars.next();
                toks.push(Tok::Comma);
            }
            '=' | '!' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => toks.push(if c == '=' { Tok::Eq } else { Tok::Ne }),
                    _ => return Err(ParseError::syntax(line, format!("expected '=' after '{c}'"))),
                }
            }
            '"' | '\'' => {
                chars.next();
                let mut s = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    match ch {
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                s.push(match escaped {
                                    'n' => '\n',
                                    't' => '\t',
                                    other => other,
                                });
                            }
                        }
                        ch if ch == c => {
                            closed = true;
                            break;
                        }
                        ch => s.push(ch),
                    }
                }
                if !closed {
                    return Err(ParseError::syntax(line, "unterminated string literal"));
                }
                toks.push(Tok::Str(s));
            }
            c if c.is_ascii_digit() || (c == '-' && next_is_digit(src, start)) => {
                let mut end = start + c.len_utf8();
                chars.next();
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &src[start..end];
                let value = if let Ok(i) = text.parse::<i64>() {
                    Value::from(i)
                } else {
                    text.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .ok_or_else(|| ParseError::syntax(line, format!("invalid number '{text}'")))?
                };
                toks.push(Tok::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, ch)) = chars.peek() {
                    if is_word_char(ch) {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(Tok::Word(src[start..end].to_string()));
            }
            other => {
                return Err(ParseError::syntax(line, format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(toks)
}

fn next_is_digit(src: &str, at: usize) -> bool {
    src[at + 1..].chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Parse a dotted path such as `design.component_names.0`
pub(crate) fn parse_path(word: &str, line: usize) -> Result<Path, ParseError> {
    let segments = word
        .split('.')
        .map(|seg| {
            if seg.is_empty() {
                Err(ParseError::syntax(line, format!("empty segment in path '{word}'")))
            } else if seg.bytes().all(|b| b.is_ascii_digit()) {
                seg.parse::<usize>()
                    .map(PathSegment::Index)
                    .map_err(|_| ParseError::syntax(line, format!("index too large in '{word}'")))
            } else {
                Ok(PathSegment::Key(seg.to_string()))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Path::new(segments))
}

struct ExprParser {
    toks: Vec<Tok>,
    pos: usize,
    line: usize,
}

impl ExprParser {
    fn new(src: &str, line: usize) -> Result<Self, ParseError> {
        Ok(Self {
            toks: lex(src, line)?,
            pos: 0,
            line,
        })
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Tok::Word(w)) if w == word)
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(ParseError::syntax(
                self.line,
                format!("unexpected trailing token {tok:?}"),
            )),
        }
    }

    fn literal(&mut self) -> Result<Value, ParseError> {
        match self.next() {
            Some(Tok::Str(s)) => Ok(Value::String(s)),
            Some(Tok::Num(n)) => Ok(n),
            Some(Tok::Word(w)) => keyword_literal(&w)
                .ok_or_else(|| ParseError::syntax(self.line, format!("expected literal, got '{w}'"))),
            other => Err(ParseError::syntax(
                self.line,
                format!("expected literal, got {other:?}"),
            )),
        }
    }

    fn operand(&mut self) -> Result<Operand, ParseError> {
        match self.next() {
            Some(Tok::Str(s)) => Ok(Operand::Literal(Value::String(s))),
            Some(Tok::Num(n)) => Ok(Operand::Literal(n)),
            Some(Tok::Word(w)) => match keyword_literal(&w) {
                Some(v) => Ok(Operand::Literal(v)),
                None if is_reserved(&w) => Err(ParseError::syntax(
                    self.line,
                    format!("'{w}' cannot be used as a value"),
                )),
                None => parse_path(&w, self.line).map(Operand::Path),
            },
            Some(tok) => Err(ParseError::syntax(
                self.line,
                format!("expected value, got {tok:?}"),
            )),
            None => Err(ParseError::syntax(self.line, "expected value, got end of expression")),
        }
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let operand = self.operand()?;
        let mut filters = Vec::new();
        while self.peek() == Some(&Tok::Pipe) {
            self.next();
            let name = match self.next() {
                Some(Tok::Word(w)) => w,
                _ => return Err(ParseError::syntax(self.line, "expected filter name after '|'")),
            };
            let filter = Filter::from_name(&name).ok_or_else(|| ParseError::UnknownFilter {
                line: self.line,
                name: name.clone(),
            })?;
            let mut args = Vec::new();
            if self.peek() == Some(&Tok::LParen) {
                self.next();
                if self.peek() == Some(&Tok::RParen) {
                    self.next();
                } else {
                    loop {
                        args.push(self.literal()?);
                        match self.next() {
                            Some(Tok::Comma) => {}
                            Some(Tok::RParen) => break,
                            _ => {
                                return Err(ParseError::syntax(
                                    self.line,
                                    format!("expected ',' or ')' in arguments to '{name}'"),
                                ))
                            }
                        }
                    }
                }
            }
            let (min, max) = filter.arity();
            if args.len() < min || args.len() > max {
                let expected = if min == max {
                    min.to_string()
                } else {
                    format!("{min}-{max}")
                };
                return Err(ParseError::FilterArity {
                    line: self.line,
                    name,
                    expected,
                    actual: args.len(),
                });
            }
            filters.push(FilterCall { filter, args });
        }
        Ok(Expr {
            operand,
            filters,
            line: self.line,
        })
    }

    fn condition(&mut self) -> Result<Condition, ParseError> {
        let mut any = vec![self.and()?];
        while self.peek_word("or") {
            self.next();
            any.push(self.and()?);
        }
        Ok(if any.len() == 1 {
            any.remove(0)
        } else {
            Condition::Or(any)
        })
    }

    fn and(&mut self) -> Result<Condition, ParseError> {
        let mut all = vec![self.unary()?];
        while self.peek_word("and") {
            self.next();
            all.push(self.unary()?);
        }
        Ok(if all.len() == 1 {
            all.remove(0)
        } else {
            Condition::And(all)
        })
    }

    fn unary(&mut self) -> Result<Condition, ParseError> {
        if self.peek_word("not") {
            self.next();
            return Ok(Condition::Not(Box::new(self.unary()?)));
        }
        let lhs = self.expr()?;
        match self.peek() {
            Some(Tok::Eq) => {
                self.next();
                Ok(Condition::Eq(lhs, self.expr()?))
            }
            Some(Tok::Ne) => {
                self.next();
                Ok(Condition::Ne(lhs, self.expr()?))
            }
            _ => Ok(Condition::Test(lhs)),
        }
    }
}

fn keyword_literal(word: &str) -> Option<Value> {
    match word {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" | "none" => Some(Value::Null),
        _ => None,
    }
}

fn is_reserved(word: &str) -> bool {
    matches!(word, "not" | "and" | "or" | "in")
}

/// Parse the inside of `{{ ... }}`
pub(crate) fn parse_output(src: &str, line: usize) -> Result<Expr, ParseError> {
    if src.is_empty() {
        return Err(ParseError::syntax(line, "empty expression"));
    }
    let mut parser = ExprParser::new(src, line)?;
    let expr = parser.expr()?;
    parser.finish()?;
    Ok(expr)
}

/// Parse an `if`/`elif` condition
pub(crate) fn parse_condition(src: &str, line: usize) -> Result<Condition, ParseError> {
    if src.is_empty() {
        return Err(ParseError::syntax(line, "missing condition"));
    }
    let mut parser = ExprParser::new(src, line)?;
    let cond = parser.condition()?;
    parser.finish()?;
    Ok(cond)
}

/// Parse `<var> in <path>` from a `for` tag
pub(crate) fn parse_for_header(src: &str, line: usize) -> Result<(String, Path), ParseError> {
    let mut words = src.split_whitespace();
    let (Some(var), Some("in"), Some(iterable), None) =
        (words.next(), words.next(), words.next(), words.next())
    else {
        return Err(ParseError::syntax(line, "expected 'for <name> in <path>'"));
    };
    let valid_var = var
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_reserved(var)
        && var != "loop";
    if !valid_var {
        return Err(ParseError::syntax(line, format!("invalid loop variable '{var}'")));
    }
    let path = parse_path(iterable, line)?;
    if path.root().is_none() {
        return Err(ParseError::syntax(line, format!("invalid loop iterable '{iterable}'")));
    }
    Ok((var.to_string(), path))
}
