//! selector::expression
//!
//! The selection expression language: lexer, recursive-descent parser, AST.
//!
//! # Grammar
//!
//! ```text
//! Expr    := OrExpr
//! OrExpr  := AndExpr ( '|' AndExpr )*
//! AndExpr := Unary ( '&' Unary )*
//! Unary   := '^' Unary
//!          | '+'? Primary '+'?
//! Primary := '(' Expr ')'
//!          | 'tag:' Pattern
//!          | 'git:' BranchName
//!          | NamePattern
//! ```
//!
//! Precedence, high to low: complement, closure, AND, OR; parentheses
//! override. A prefix `+` requests ancestor closure, a suffix `+`
//! descendant closure; `^` complements within the universe.
//!
//! # Errors
//!
//! Malformed syntax is a user-input error: it is surfaced to the caller and
//! never retried or recovered internally.

use thiserror::Error;

/// Errors from parsing a selection expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The expression contains no tokens.
    #[error("empty selection expression")]
    Empty,

    /// A token appeared where it is not allowed.
    #[error("unexpected '{token}'")]
    UnexpectedToken {
        /// The offending token text
        token: String,
    },

    /// The expression ended mid-construct.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A `(` was never closed.
    #[error("unclosed '('")]
    UnclosedParen,

    /// A quoted segment was never closed.
    #[error("unterminated quote")]
    UnterminatedQuote,

    /// A `tag:` or `git:` selector with nothing after the colon.
    #[error("empty '{kind}:' selector")]
    EmptyAtom {
        /// The selector kind ("tag" or "git")
        kind: String,
    },
}

/// A parsed selection expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    /// Glob over unit names.
    Name(String),
    /// Glob over unit tags.
    Tag(String),
    /// Units whose source files changed relative to a branch.
    Git(String),
    /// Complement within the universe.
    Not(Box<Expr>),
    /// Set intersection.
    And(Box<Expr>, Box<Expr>),
    /// Set union.
    Or(Box<Expr>, Box<Expr>),
    /// Ancestor and/or descendant closure of the inner match.
    Closure {
        inner: Box<Expr>,
        upstream: bool,
        downstream: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Amp,
    Pipe,
    Caret,
    Plus,
    Atom(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Amp => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::Plus => write!(f, "+"),
            Token::Atom(s) => write!(f, "{s}"),
        }
    }
}

fn lex(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '&' => {
                chars.next();
                tokens.push(Token::Amp);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            _ => {
                let mut atom = String::new();
                while let Some(&c) = chars.peek() {
                    match c {
                        '"' | '`' => {
                            // Quoted segment: delimiters inside are literal.
                            atom.push(c);
                            chars.next();
                            loop {
                                match chars.next() {
                                    Some(q) if q == c => {
                                        atom.push(q);
                                        break;
                                    }
                                    Some(other) => atom.push(other),
                                    None => return Err(ParseError::UnterminatedQuote),
                                }
                            }
                        }
                        c if c.is_whitespace() => break,
                        '(' | ')' | '&' | '|' | '^' | '+' => break,
                        _ => {
                            atom.push(c);
                            chars.next();
                        }
                    }
                }
                tokens.push(Token::Atom(atom));
            }
        }
    }

    Ok(tokens)
}

/// Parse one selection expression.
pub(crate) fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::RParen) => Err(ParseError::UnexpectedToken {
            token: ")".to_string(),
        }),
        Some(token) => Err(ParseError::UnexpectedToken {
            token: token.to_string(),
        }),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while self.eat(&Token::Amp) {
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Token::Caret) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }

        let upstream = self.eat(&Token::Plus);
        let primary = self.parse_primary()?;
        let downstream = self.eat(&Token::Plus);

        if upstream || downstream {
            Ok(Expr::Closure {
                inner: Box::new(primary),
                upstream,
                downstream,
            })
        } else {
            Ok(primary)
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err(ParseError::UnclosedParen);
                }
                Ok(expr)
            }
            Some(Token::Atom(atom)) => {
                if let Some(pattern) = atom.strip_prefix("tag:") {
                    if pattern.is_empty() {
                        return Err(ParseError::EmptyAtom {
                            kind: "tag".to_string(),
                        });
                    }
                    Ok(Expr::Tag(pattern.to_string()))
                } else if let Some(branch) = atom.strip_prefix("git:") {
                    if branch.is_empty() {
                        return Err(ParseError::EmptyAtom {
                            kind: "git".to_string(),
                        });
                    }
                    Ok(Expr::Git(branch.to_string()))
                } else {
                    Ok(Expr::Name(atom))
                }
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}
