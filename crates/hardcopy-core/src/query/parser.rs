//! Recursive descent parser over [`super::lexer::Token`]s, producing a
//! [`ParsedQuery`]. AND binds tighter than OR; parenthesized sub-expressions
//! are supported for explicit grouping.

use super::ast::{Expr, FieldRef, Op, OrderBy, ParsedQuery, Pattern, SortDirection, Value};
use super::error::QueryError;
use super::lexer::{Token, tokenize};

/// Parse a full query string into a [`ParsedQuery`].
///
/// # Errors
/// Returns [`QueryError::Parse`] on any lexical or grammatical error.
pub fn parse_query(source: &str) -> Result<ParsedQuery, QueryError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens: &tokens, pos: 0, source };
    parser.parse()
}

struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn position(&self) -> usize {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn err(&self, message: impl Into<String>) -> QueryError {
        QueryError::Parse { source: self.source.to_owned(), position: self.position(), message: message.into() }
    }

    fn expect_ident(&mut self) -> Result<String, QueryError> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.err(format!("expected identifier, found {other:?}"))),
        }
    }

    fn expect(&mut self, tok: &Token, what: &str) -> Result<(), QueryError> {
        if self.eat(tok) { Ok(()) } else { Err(self.err(format!("expected {what}"))) }
    }

    fn parse(&mut self) -> Result<ParsedQuery, QueryError> {
        let pattern = self.parse_pattern()?;
        let predicate = if self.eat(&Token::Where) { Some(self.parse_expr()?) } else { None };
        let order_by = if self.eat(&Token::OrderBy) {
            self.expect_by()?;
            Some(self.parse_order_by()?)
        } else {
            None
        };
        // A trailing `RETURN ...` clause (or anything else) is accepted and
        // ignored, per spec.md §4.2 ("ignores RETURN").
        Ok(ParsedQuery { pattern, predicate, order_by })
    }

    fn expect_by(&mut self) -> Result<(), QueryError> {
        match self.peek().clone() {
            Token::Ident(name) if name == "BY" => {
                self.advance();
                Ok(())
            }
            other => Err(self.err(format!("expected 'BY' after ORDER, found {other:?}"))),
        }
    }

    fn parse_pattern(&mut self) -> Result<Pattern, QueryError> {
        self.expect(&Token::LParen, "'('")?;
        let var = self.expect_ident()?;
        let label = if self.eat(&Token::Colon) { Some(self.parse_dotted_name()?) } else { None };
        self.expect(&Token::RParen, "')'")?;
        Ok(Pattern { var, label })
    }

    fn parse_dotted_name(&mut self) -> Result<String, QueryError> {
        let mut name = self.expect_ident()?;
        while self.eat(&Token::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn parse_expr(&mut self) -> Result<Expr, QueryError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.parse_primary()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_primary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expr, QueryError> {
        if self.eat(&Token::LParen) {
            let e = self.parse_expr()?;
            self.expect(&Token::RParen, "')'")?;
            return Ok(e);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, QueryError> {
        let field = self.parse_field_ref()?;
        let op = self.parse_op()?;
        let value = self.parse_value()?;
        Ok(Expr::Compare { field, op, value })
    }

    fn parse_field_ref(&mut self) -> Result<FieldRef, QueryError> {
        let _var = self.expect_ident()?;
        let mut path = Vec::new();
        while self.eat(&Token::Dot) {
            path.push(self.expect_ident()?);
        }
        if path.is_empty() {
            return Err(self.err("expected '.<field>' after variable in comparison"));
        }
        Ok(FieldRef { path })
    }

    fn parse_op(&mut self) -> Result<Op, QueryError> {
        match self.advance() {
            Token::Eq => Ok(Op::Eq),
            Token::Neq => Ok(Op::Neq),
            Token::Contains => Ok(Op::Contains),
            Token::In => Ok(Op::In),
            other => Err(self.err(format!("expected a comparison operator, found {other:?}"))),
        }
    }

    fn parse_value(&mut self) -> Result<Value, QueryError> {
        match self.advance() {
            Token::Str(s) => Ok(Value::Str(s)),
            Token::Num(n) => Ok(Value::Num(n)),
            Token::Bool(b) => Ok(Value::Bool(b)),
            Token::Null => Ok(Value::Null),
            Token::Param(p) => Ok(Value::Param(p)),
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.parse_value()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(&Token::RBracket, "']'")?;
                }
                Ok(Value::List(items))
            }
            other => Err(self.err(format!("expected a value, found {other:?}"))),
        }
    }

    fn parse_order_by(&mut self) -> Result<OrderBy, QueryError> {
        let field = self.parse_field_ref()?;
        let direction = if self.eat(&Token::Desc) {
            SortDirection::Desc
        } else {
            self.eat(&Token::Asc);
            SortDirection::Asc
        };
        Ok(OrderBy { field, direction })
    }
}
