//! Recursive-descent parser for the default TL adapter.
//!
//! TL's real grammar (operators chained without punctuation, e.g.
//! `group spawn { ... }` or `array forEach { ... }`) is liberal: almost any
//! bare identifier can appear as a unary prefix command or as an infix binary
//! command depending on position. This parser mirrors that liberally rather
//! than hard-coding a fixed operator table, which keeps it usable for
//! commands the analyzer doesn't special-case.
//!
//! One deliberate desugaring: `private IDENT` (bare identifier, no quotes) is
//! parsed as if the identifier had been written as a string literal
//! (`private "IDENT"`), matching how TL's own private-declaration form is
//! commonly written both ways in source.

use super::ast::{Node, NodeKind, Token};
use super::lexer::{Lexed, Lexer, TokenKind};

const UNARY_KEYWORDS: &[&str] = &["private", "spawn", "for", "hint", "call", "exec", "params"];

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at line {line}, column {column}")]
    Unexpected { line: usize, column: usize },
}

pub struct Parser<'a> {
    src: &'a str,
    lexer: Lexer<'a>,
    current: Lexed,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token();
        Self { src, lexer, current }
    }

    /// Parses the whole source as a single implicit top-level code block, so
    /// the walker can treat file scope uniformly with nested `CODE` scope.
    pub fn parse_program(mut self) -> Result<Node, ParseError> {
        let token = self.current.token;
        let stmts = self.parse_stmts(&[TokenKind::Eof])?;
        Ok(Node::branch(NodeKind::Code, token, stmts))
    }

    fn bump(&mut self) -> Lexed {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn at_terminator(&self, terms: &[TokenKind]) -> bool {
        terms.iter().any(|t| t == &self.current.kind)
    }

    fn parse_stmts(&mut self, terms: &[TokenKind]) -> Result<Vec<Node>, ParseError> {
        let mut stmts = Vec::new();
        while !self.at_terminator(terms) {
            stmts.push(self.parse_stmt()?);
            if self.current.kind == TokenKind::Semicolon {
                self.bump();
            } else {
                break;
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Node, ParseError> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let name = name.clone();
            let tok = self.current.token;
            // Lookahead for `ident =` assignment form without consuming on miss.
            let saved_lexer_pos = self.peek_is_eq();
            if saved_lexer_pos {
                self.bump(); // ident
                self.bump(); // '='
                let rhs = self.parse_expr()?;
                let ident_node = Node::leaf(NodeKind::Variable, tok, name);
                return Ok(Node::branch(NodeKind::Assignment, tok, vec![ident_node, rhs]));
            }
        }
        self.parse_expr()
    }

    /// Peeks whether the token after the current identifier is `=`, without
    /// disturbing parser state for the non-matching case.
    fn peek_is_eq(&mut self) -> bool {
        // Cheap one-token lookahead by cloning the lexer's remaining input is
        // not available on `Lexer`, so we scan a throwaway lexer copy.
        let mut probe = Lexer::new(self.remaining_src());
        let first = probe.next_token();
        debug_assert!(matches!(first.kind, TokenKind::Ident(_)));
        let second = probe.next_token();
        second.kind == TokenKind::Eq
    }

    fn remaining_src(&self) -> &'a str {
        self.src_from(self.current.token.offset)
    }

    fn src_from(&self, offset: usize) -> &'a str {
        self.src.get(offset..).unwrap_or("")
    }

    fn parse_expr(&mut self) -> Result<Node, ParseError> {
        self.parse_binary_chain()
    }

    fn parse_binary_chain(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let is_infix_candidate = matches!(&self.current.kind, TokenKind::Ident(_));
            if !is_infix_candidate {
                break;
            }
            let TokenKind::Ident(op_name) = self.current.kind.clone() else { unreachable!() };
            let op_tok = self.current.token;
            self.bump();
            let right = self.parse_unary()?;
            let op_node = Node::leaf(NodeKind::OperatorTag, op_tok, op_name);
            left = Node::branch(NodeKind::BinaryExpr, left.token, vec![left, op_node, right]);
        }
        Ok(left)
    }

    fn starts_primary(&self) -> bool {
        matches!(
            &self.current.kind,
            TokenKind::Ident(_)
                | TokenKind::Number(_)
                | TokenKind::Str(_)
                | TokenKind::LBrace
                | TokenKind::LBracket
                | TokenKind::LParen
        )
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let lname = name.to_ascii_lowercase();
            let is_keyword = UNARY_KEYWORDS.contains(&lname.as_str());
            let op_tok = self.current.token;
            let op_name = name.clone();
            // Peek one token ahead to decide if this identifier is acting as a
            // unary prefix (operand follows) or as a bare value reference.
            let mut probe = Lexer::new(self.src_from(self.current.token.offset));
            probe.next_token(); // the identifier itself
            let next = probe.next_token();
            let operand_follows = matches!(
                next.kind,
                TokenKind::Ident(_)
                    | TokenKind::Number(_)
                    | TokenKind::Str(_)
                    | TokenKind::LBrace
                    | TokenKind::LBracket
                    | TokenKind::LParen
            );
            if is_keyword && operand_follows {
                self.bump();
                let mut operand = self.parse_unary()?;
                if lname == "private" && operand.kind == NodeKind::Variable {
                    operand = Node::leaf(NodeKind::String, operand.token, operand.raw.clone());
                }
                let op_node = Node::leaf(NodeKind::OperatorTag, op_tok, op_name);
                return Ok(Node::branch(NodeKind::UnaryExpr, op_tok, vec![op_node, operand]));
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let tok = self.current.token;
        match self.current.kind.clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Node::leaf(NodeKind::Variable, tok, name))
            }
            TokenKind::Number(text) => {
                self.bump();
                Ok(Node::leaf(NodeKind::Number, tok, text))
            }
            TokenKind::Str(text) => {
                self.bump();
                Ok(Node::leaf(NodeKind::String, tok, text))
            }
            TokenKind::LBrace => {
                self.bump();
                let stmts = self.parse_stmts(&[TokenKind::RBrace, TokenKind::Eof])?;
                if self.current.kind == TokenKind::RBrace {
                    self.bump();
                }
                Ok(Node::branch(NodeKind::Code, tok, stmts))
            }
            TokenKind::LBracket => {
                self.bump();
                let mut items = Vec::new();
                while !matches!(self.current.kind, TokenKind::RBracket | TokenKind::Eof) {
                    items.push(self.parse_expr()?);
                    if self.current.kind == TokenKind::Comma {
                        self.bump();
                    } else {
                        break;
                    }
                }
                if self.current.kind == TokenKind::RBracket {
                    self.bump();
                }
                Ok(Node::branch(NodeKind::Array, tok, items))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                if self.current.kind == TokenKind::RParen {
                    self.bump();
                }
                Ok(inner)
            }
            TokenKind::Eof | TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen
            | TokenKind::Semicolon | TokenKind::Comma | TokenKind::Eq => {
                Err(ParseError::Unexpected { line: tok.line, column: tok.column })
            }
        }
    }
}
