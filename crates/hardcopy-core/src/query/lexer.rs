//! Hand-written tokenizer for the restricted graph query language
//! (spec.md §4.2). No parser-combinator dependency — a small recursive
//! descent grammar doesn't need one.

use super::error::QueryError;

/// A lexical token, paired with the byte offset it started at (by the
/// caller, via [`tokenize`]'s returned positions).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Dot,
    Comma,
    Eq,
    Neq,
    And,
    Or,
    Where,
    Contains,
    In,
    OrderBy,
    Asc,
    Desc,
    Ident(String),
    Param(String),
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Eof,
}

/// Tokenize `src`, returning `(Token, byte_offset)` pairs, terminated by a
/// trailing `(Token::Eof, src.len())`.
///
/// # Errors
/// Returns [`QueryError::Parse`] for an unterminated string literal or an
/// unrecognized character.
pub fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, QueryError> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                out.push((Token::LParen, i));
                i += 1;
            }
            ')' => {
                out.push((Token::RParen, i));
                i += 1;
            }
            '[' => {
                out.push((Token::LBracket, i));
                i += 1;
            }
            ']' => {
                out.push((Token::RBracket, i));
                i += 1;
            }
            ':' => {
                out.push((Token::Colon, i));
                i += 1;
            }
            '.' => {
                out.push((Token::Dot, i));
                i += 1;
            }
            ',' => {
                out.push((Token::Comma, i));
                i += 1;
            }
            '=' => {
                out.push((Token::Eq, i));
                i += 1;
            }
            '!' if bytes.get(i + 1) == Some(&b'=') => {
                out.push((Token::Neq, i));
                i += 2;
            }
            '"' | '\'' => {
                let quote = c;
                let start = i;
                i += 1;
                let mut s = String::new();
                loop {
                    match bytes.get(i) {
                        None => {
                            return Err(QueryError::Parse {
                                source: src.to_owned(),
                                position: start,
                                message: "unterminated string literal".to_owned(),
                            });
                        }
                        Some(&b) if b as char == quote => {
                            i += 1;
                            break;
                        }
                        Some(&b) => {
                            s.push(b as char);
                            i += 1;
                        }
                    }
                }
                out.push((Token::Str(s), start));
            }
            '$' => {
                let start = i;
                i += 1;
                let name_start = i;
                while bytes.get(i).is_some_and(|b| is_ident_byte(*b)) {
                    i += 1;
                }
                if i == name_start {
                    return Err(QueryError::Parse {
                        source: src.to_owned(),
                        position: start,
                        message: "expected parameter name after '$'".to_owned(),
                    });
                }
                out.push((Token::Param(src[name_start..i].to_owned()), start));
            }
            c if c.is_ascii_digit() || (c == '-' && bytes.get(i + 1).is_some_and(|b| (*b as char).is_ascii_digit())) => {
                let start = i;
                if c == '-' {
                    i += 1;
                }
                while bytes.get(i).is_some_and(|b| (*b as char).is_ascii_digit()) {
                    i += 1;
                }
                if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(|b| (*b as char).is_ascii_digit()) {
                    i += 1;
                    while bytes.get(i).is_some_and(|b| (*b as char).is_ascii_digit()) {
                        i += 1;
                    }
                }
                let num: f64 = src[start..i].parse().map_err(|_| QueryError::Parse {
                    source: src.to_owned(),
                    position: start,
                    message: "malformed number literal".to_owned(),
                })?;
                out.push((Token::Num(num), start));
            }
            c if is_ident_start(c) => {
                let start = i;
                while bytes.get(i).is_some_and(|b| is_ident_byte(*b)) {
                    i += 1;
                }
                let word = &src[start..i];
                out.push((keyword_or_ident(word), start));
            }
            other => {
                return Err(QueryError::Parse {
                    source: src.to_owned(),
                    position: i,
                    message: format!("unexpected character '{other}'"),
                });
            }
        }
    }
    out.push((Token::Eof, src.len()));
    Ok(out)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_byte(b: u8) -> bool {
    let c = b as char;
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword_or_ident(word: &str) -> Token {
    // `ORDER BY` is two words; the parser handles gluing `ORDER` + `BY`.
    match word.to_ascii_uppercase().as_str() {
        "AND" => Token::And,
        "OR" => Token::Or,
        "WHERE" => Token::Where,
        "CONTAINS" => Token::Contains,
        "IN" => Token::In,
        "ORDER" => Token::OrderBy,
        "BY" => Token::Ident("BY".to_owned()), // consumed explicitly by the parser
        "ASC" => Token::Asc,
        "DESC" => Token::Desc,
        "TRUE" => Token::Bool(true),
        "FALSE" => Token::Bool(false),
        "NULL" => Token::Null,
        _ => Token::Ident(word.to_owned()),
    }
}
