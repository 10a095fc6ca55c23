use crate::ast::Node;
use crate::error::CoreError;
use crate::lexer::{Token, TokenKind, lex};
use crate::preprocess::preprocess;

/// Preprocess, lex and parse a whole source file.
pub fn parse(input: &str) -> Result<Node, CoreError> {
    let source = preprocess(input)?;
    let tokens = lex(&source)?;
    parse_tokens(tokens)
}

pub fn parse_tokens(tokens: Vec<Token>) -> Result<Node, CoreError> {
    Parser::new(tokens).parse_program()
}

/// Recursive descent parser with one token of lookahead.
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, index: 0 }
    }

    /// Index of the next token to be consumed.
    #[cfg(test)]
    fn position(&self) -> usize {
        self.index
    }

    pub fn parse_program(&mut self) -> Result<Node, CoreError> {
        let mut expressions = Vec::new();
        while self.current_kind() != TokenKind::Eof {
            expressions.push(self.parse_expression()?);
        }
        Ok(Node::Program(expressions))
    }

    pub fn parse_expression(&mut self) -> Result<Node, CoreError> {
        match self.current_kind() {
            TokenKind::LParen => self.parse_list(),
            TokenKind::Quote => self.parse_quoted(),
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::Integer | TokenKind::Floating | TokenKind::String => self.parse_literal(),
            kind if keyword_name(kind).is_some() => self.parse_keyword(),
            TokenKind::RParen => Err(CoreError::UnexpectedToken("unexpected ')'".to_string())),
            other => Err(CoreError::UnexpectedToken(format!(
                "unexpected {other:?} while parsing an expression"
            ))),
        }
    }

    pub fn parse_list(&mut self) -> Result<Node, CoreError> {
        self.expect(TokenKind::LParen)?;
        let mut items = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RParen => break,
                TokenKind::Eof => {
                    return Err(CoreError::UnexpectedToken(
                        "unexpected end of input, expected ')'".to_string(),
                    ));
                }
                _ => items.push(self.parse_expression()?),
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Node::List(items))
    }

    pub fn parse_literal(&mut self) -> Result<Node, CoreError> {
        let token = self.advance();
        let text = token.value.unwrap_or_default();
        match token.kind {
            TokenKind::Integer => text
                .parse::<i64>()
                .map(Node::Integer)
                .map_err(|err| CoreError::InvalidLiteral(format!("integer {text}: {err}"))),
            TokenKind::Floating => {
                let value = text
                    .parse::<f64>()
                    .map_err(|err| CoreError::InvalidLiteral(format!("float {text}: {err}")))?;
                if !value.is_finite() {
                    return Err(CoreError::InvalidLiteral(format!(
                        "float {text} is out of range"
                    )));
                }
                Ok(Node::Floating(value))
            }
            TokenKind::String => Ok(Node::String(text)),
            other => Err(CoreError::UnexpectedToken(format!(
                "expected a literal but found {other:?}"
            ))),
        }
    }

    pub fn parse_quoted(&mut self) -> Result<Node, CoreError> {
        self.expect(TokenKind::Quote)?;
        let inner = self.parse_expression()?;
        Ok(Node::Quoted(Box::new(inner)))
    }

    pub fn parse_identifier(&mut self) -> Result<Node, CoreError> {
        let token = self.advance();
        match (token.kind, token.value) {
            (TokenKind::Identifier, Some(name)) => Ok(Node::Identifier(name)),
            (kind, _) => Err(CoreError::UnexpectedToken(format!(
                "expected an identifier but found {kind:?}"
            ))),
        }
    }

    pub fn parse_keyword(&mut self) -> Result<Node, CoreError> {
        let token = self.advance();
        keyword_name(token.kind)
            .map(|name| Node::Keyword(name.to_string()))
            .ok_or_else(|| {
                CoreError::UnexpectedToken(format!("expected a keyword but found {:?}", token.kind))
            })
    }

    fn current_kind(&self) -> TokenKind {
        self.tokens
            .get(self.index)
            .map_or(TokenKind::Eof, |token| token.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.index)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof));
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), CoreError> {
        let found = self.current_kind();
        if found != kind {
            return Err(CoreError::UnexpectedToken(format!(
                "expected {kind:?} but found {found:?}"
            )));
        }
        self.advance();
        Ok(())
    }
}

/// Canonical source text of keyword and operator tokens.
fn keyword_name(kind: TokenKind) -> Option<&'static str> {
    let name = match kind {
        TokenKind::Null => "null",
        TokenKind::Not => "not",
        TokenKind::If => "if",
        TokenKind::Let => "let",
        TokenKind::Defun => "defun",
        TokenKind::Car => "car",
        TokenKind::Cdr => "cdr",
        TokenKind::T => "t",
        TokenKind::Nil => "nil",
        TokenKind::Cons => "cons",
        TokenKind::List => "list",
        TokenKind::Progn => "progn",
        TokenKind::Print => "print",
        TokenKind::Greater => ">",
        TokenKind::GreaterEqual => ">=",
        TokenKind::Less => "<",
        TokenKind::LessEqual => "<=",
        TokenKind::Equal => "=",
        TokenKind::NotEqual => "/=",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Times => "*",
        TokenKind::Divide => "/",
        _ => return None,
    };
    Some(name)
}
