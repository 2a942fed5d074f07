use std::iter::Peekable;
use std::str::Chars;
use std::vec::IntoIter;

use super::ast::{BinOp, Expr, Literal};
use crate::path::parse_dotted;
use crate::{Error, Result};

pub(crate) fn parse(input: &str) -> Result<Expr> {
    let tokens = Tokenizer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
    };
    let expr = parser.parse_or()?;
    if let Some(tok) = parser.tokens.next() {
        return Err(Error::parse(format!("unexpected token {tok:?} after expression")));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(String),
    Str(String),
    /// A bare identifier or dotted/indexed path.
    Path(String),
    OpenParen,
    CloseParen,
    Comma,
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Bang,
}

struct Tokenizer<'input> {
    chars: Peekable<Chars<'input>>,
}

impl<'input> Tokenizer<'input> {
    fn new(input: &'input str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '(' => tokens.push(self.single(Token::OpenParen)),
                ')' => tokens.push(self.single(Token::CloseParen)),
                ',' => tokens.push(self.single(Token::Comma)),
                '|' => {
                    self.chars.next();
                    self.expect('|')?;
                    tokens.push(Token::Or);
                }
                '&' => {
                    self.chars.next();
                    self.expect('&')?;
                    tokens.push(Token::And);
                }
                '=' => {
                    self.chars.next();
                    self.expect('=')?;
                    tokens.push(Token::Eq);
                }
                '!' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        tokens.push(Token::Ne);
                    } else {
                        tokens.push(Token::Bang);
                    }
                }
                '<' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        tokens.push(Token::Le);
                    } else {
                        tokens.push(Token::Lt);
                    }
                }
                '>' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'=') {
                        self.chars.next();
                        tokens.push(Token::Ge);
                    } else {
                        tokens.push(Token::Gt);
                    }
                }
                '"' => tokens.push(self.string()?),
                c if c.is_ascii_digit() => tokens.push(self.number()),
                '-' | '.' => tokens.push(self.number()),
                c if c.is_alphanumeric() || c == '_' || c == '$' => tokens.push(self.path()),
                other => return Err(Error::parse(format!("unexpected character '{other}'"))),
            }
        }

        Ok(tokens)
    }

    fn single(&mut self, tok: Token) -> Token {
        self.chars.next();
        tok
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(Error::parse(format!("expected '{expected}', got '{c}'"))),
            None => Err(Error::parse("unexpected end of expression")),
        }
    }

    fn string(&mut self) -> Result<Token> {
        self.chars.next();
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(Token::Str(out)),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(Error::parse("unterminated string literal")),
                },
                Some(c) => out.push(c),
                None => return Err(Error::parse("unterminated string literal")),
            }
        }
    }

    fn number(&mut self) -> Token {
        let mut out = String::new();
        if self.chars.peek() == Some(&'-') {
            out.push(self.chars.next().unwrap());
        }
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' {
                out.push(self.chars.next().unwrap());
            } else if (c == '+' || c == '-') && matches!(out.chars().last(), Some('e' | 'E')) {
                out.push(self.chars.next().unwrap());
            } else {
                break;
            }
        }
        Token::Num(out)
    }

    fn path(&mut self) -> Token {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '[' | ']' | '*') {
                out.push(self.chars.next().unwrap());
            } else {
                break;
            }
        }
        Token::Path(out)
    }
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while self.tokens.peek() == Some(&Token::Or) {
            self.tokens.next();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_cmp()?;
        while self.tokens.peek() == Some(&Token::And) {
            self.tokens.next();
            let rhs = self.parse_cmp()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr> {
        let lhs = self.parse_unary()?;
        let op = match self.tokens.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.tokens.next();
        let rhs = self.parse_unary()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.tokens.peek() == Some(&Token::Bang) {
            self.tokens.next();
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.tokens.next() {
            Some(Token::OpenParen) => {
                let inner = self.parse_or()?;
                self.assert_next(Token::CloseParen)?;
                Ok(inner)
            }
            Some(Token::Num(raw)) => parse_number(&raw),
            Some(Token::Str(s)) => Ok(Expr::Literal(Literal::Str(s))),
            Some(Token::Path(text)) => self.parse_ident(text),
            Some(other) => Err(Error::parse(format!("unexpected token {other:?}"))),
            None => Err(Error::parse("unexpected end of expression")),
        }
    }

    fn parse_ident(&mut self, text: String) -> Result<Expr> {
        match text.as_str() {
            "true" => return Ok(Expr::Literal(Literal::Bool(true))),
            "false" => return Ok(Expr::Literal(Literal::Bool(false))),
            "null" | "nil" => return Ok(Expr::Literal(Literal::Null)),
            _ => {}
        }

        if self.tokens.peek() == Some(&Token::OpenParen) {
            if text.contains('.') || text.contains('[') {
                return Err(Error::parse(format!("'{text}' is not a converter name")));
            }
            self.tokens.next();
            let mut args = Vec::new();
            if self.tokens.peek() != Some(&Token::CloseParen) {
                loop {
                    args.push(self.parse_or()?);
                    match self.tokens.peek() {
                        Some(Token::Comma) => {
                            self.tokens.next();
                        }
                        _ => break,
                    }
                }
            }
            self.assert_next(Token::CloseParen)?;
            return Ok(Expr::Call { name: text, args });
        }

        Ok(Expr::Path(parse_dotted(&text)?))
    }

    fn assert_next(&mut self, expected: Token) -> Result<()> {
        match self.tokens.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(Error::parse(format!(
                "expected {expected:?}, got {tok:?}"
            ))),
            None => Err(Error::parse("unexpected end of expression")),
        }
    }
}

fn parse_number(raw: &str) -> Result<Expr> {
    if raw.contains(['.', 'e', 'E']) {
        let f = raw
            .parse::<f64>()
            .map_err(|_| Error::parse(format!("invalid number '{raw}'")))?;
        Ok(Expr::Literal(Literal::Float(f)))
    } else {
        let i = raw
            .parse::<i64>()
            .map_err(|_| Error::parse(format!("invalid number '{raw}'")))?;
        Ok(Expr::Literal(Literal::Int(i)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::{IndexOp, Segment};

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse("true").unwrap(), Expr::Literal(Literal::Bool(true)));
        assert_eq!(parse("nil").unwrap(), Expr::Literal(Literal::Null));
        assert_eq!(parse("50").unwrap(), Expr::Literal(Literal::Int(50)));
        assert_eq!(parse("50.0").unwrap(), Expr::Literal(Literal::Float(50.0)));
        assert_eq!(
            parse("\"str\"").unwrap(),
            Expr::Literal(Literal::Str("str".into()))
        );
    }

    #[test]
    fn test_parse_path() {
        //given
        let expr = parse("tests.test_int").unwrap();

        //then
        assert_eq!(
            expr,
            Expr::Path(vec![
                Segment {
                    key: "tests".into(),
                    index: IndexOp::None
                },
                Segment {
                    key: "test_int".into(),
                    index: IndexOp::None
                },
            ])
        );
    }

    #[test]
    fn test_parse_comparison() {
        let expr = parse("tests.test_int == 500").unwrap();
        match expr {
            Expr::Binary { op, .. } => assert_eq!(op, BinOp::Eq),
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_and_over_or() {
        // a || b && c parses as a || (b && c)
        let expr = parse("a == 1 || b == 2 && c == 3").unwrap();
        match expr {
            Expr::Binary { op: BinOp::Or, rhs, .. } => match *rhs {
                Expr::Binary { op: BinOp::And, .. } => {}
                other => panic!("expected and on rhs, got {other:?}"),
            },
            other => panic!("expected or at top, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_not_and_parens() {
        let expr = parse("!(a.b == 1)").unwrap();
        assert!(matches!(expr, Expr::Not(_)));
    }

    #[test]
    fn test_parse_converter_call() {
        let expr = parse("len(\"a.b\") > 3").unwrap();
        match expr {
            Expr::Binary { lhs, .. } => match *lhs {
                Expr::Call { name, args } => {
                    assert_eq!(name, "len");
                    assert_eq!(args.len(), 1);
                }
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_trailing_garbage() {
        assert!(parse("a == 1 b").is_err());
        assert!(parse("(((").is_err());
        assert!(parse("a = 1").is_err());
    }
}
