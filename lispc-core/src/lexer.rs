//! Lexer for preprocessed lisp source.

use crate::error::CoreError;

/// Kind of a token produced by the lexer.
///
/// Keywords get their own kinds; everything else that looks like a
/// name is an `Identifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Symbols
    Greater,      // >
    GreaterEqual, // >=
    Less,         // <
    LessEqual,    // <=
    Equal,        // =
    NotEqual,     // /=
    Plus,         // +
    Minus,        // -
    Times,        // *
    Divide,       // /
    LParen,       // (
    RParen,       // )
    Quote,        // '

    // Keywords
    Null,
    Not,
    If,
    Let,
    Defun,
    Car,
    Cdr,
    T,
    Nil,
    Cons,
    List,
    Progn,
    Print,

    // Atoms
    Identifier,
    Integer,
    Floating,
    String,

    // Never stored; returned by the parser once the tokens run out.
    Eof,
}

impl TokenKind {
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "null" => TokenKind::Null,
            "not" => TokenKind::Not,
            "if" => TokenKind::If,
            "let" => TokenKind::Let,
            "defun" => TokenKind::Defun,
            "car" => TokenKind::Car,
            "cdr" => TokenKind::Cdr,
            "t" => TokenKind::T,
            "nil" => TokenKind::Nil,
            "cons" => TokenKind::Cons,
            "list" => TokenKind::List,
            "progn" => TokenKind::Progn,
            "print" => TokenKind::Print,
            _ => return None,
        };
        Some(kind)
    }
}

/// A single token. Atoms carry their text; symbols and keywords don't
/// need to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind) -> Self {
        Token { kind, value: None }
    }

    pub fn with_value(kind: TokenKind, value: impl Into<String>) -> Self {
        Token {
            kind,
            value: Some(value.into()),
        }
    }
}

/// Lex preprocessed source into tokens.
///
/// At each position the longest of the symbol, number and identifier
/// matches wins. Ties go to symbols, then floats, then integers, then
/// identifiers, so `42` is an integer and `-` on its own is a symbol.
pub fn lex(source: &str) -> Result<Vec<Token>, CoreError> {
    let mut lexer = Lexer {
        source,
        chars: source.as_bytes(),
        index: 0,
    };
    lexer.run()
}

struct Lexer<'src> {
    source: &'src str,
    chars: &'src [u8],
    index: usize,
}

#[derive(Clone, Copy)]
enum Candidate {
    Symbol(TokenKind),
    Floating,
    Integer,
    Identifier,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> Result<Vec<Token>, CoreError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_whitespace() || ch == 0x0b {
                self.index += 1;
                continue;
            }
            if ch == b'"' {
                tokens.push(self.lex_string()?);
                continue;
            }

            let candidates = [
                self.match_symbol().map(|(kind, len)| (Candidate::Symbol(kind), len)),
                Some((Candidate::Floating, self.match_float())),
                Some((Candidate::Integer, self.match_integer())),
                Some((Candidate::Identifier, self.match_identifier())),
            ];

            let mut best: Option<(Candidate, usize)> = None;
            for (candidate, len) in candidates.into_iter().flatten() {
                if len > best.map_or(0, |(_, best_len)| best_len) {
                    best = Some((candidate, len));
                }
            }

            let Some((candidate, len)) = best else {
                return Err(self.unexpected_char());
            };

            let start = self.index;
            self.index += len;
            let text = &self.source[start..self.index];
            let token = match candidate {
                Candidate::Symbol(kind) => Token::new(kind),
                Candidate::Floating => Token::with_value(TokenKind::Floating, text),
                Candidate::Integer => Token::with_value(TokenKind::Integer, text),
                Candidate::Identifier => match TokenKind::keyword(text) {
                    Some(kind) => Token::with_value(kind, text),
                    None => Token::with_value(TokenKind::Identifier, text),
                },
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn match_symbol(&self) -> Option<(TokenKind, usize)> {
        let ch = self.peek_char()?;
        if self.peek_next() == Some(b'=') {
            let kind = match ch {
                b'>' => Some(TokenKind::GreaterEqual),
                b'<' => Some(TokenKind::LessEqual),
                b'/' => Some(TokenKind::NotEqual),
                _ => None,
            };
            if let Some(kind) = kind {
                return Some((kind, 2));
            }
        }
        let kind = match ch {
            b'>' => TokenKind::Greater,
            b'<' => TokenKind::Less,
            b'=' => TokenKind::Equal,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Times,
            b'/' => TokenKind::Divide,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'\'' => TokenKind::Quote,
            _ => return None,
        };
        Some((kind, 1))
    }

    /// `[+-]?digits`, or 0 when there is no match.
    fn match_integer(&self) -> usize {
        let mut len = 0;
        if matches!(self.peek_at(0), Some(b'+' | b'-')) {
            len += 1;
        }
        let digits = self.count_digits(len);
        if digits == 0 { 0 } else { len + digits }
    }

    /// `[+-]?digits.digits`, or 0 when there is no match.
    fn match_float(&self) -> usize {
        let whole = self.match_integer();
        if whole == 0 || self.peek_at(whole) != Some(b'.') {
            return 0;
        }
        let fraction = self.count_digits(whole + 1);
        if fraction == 0 { 0 } else { whole + 1 + fraction }
    }

    fn match_identifier(&self) -> usize {
        self.chars[self.index..]
            .iter()
            .take_while(|ch| ch.is_ascii_alphanumeric())
            .count()
    }

    fn lex_string(&mut self) -> Result<Token, CoreError> {
        let start = self.index;
        // Opening quote
        self.index += 1;

        let mut value = Vec::new();
        while let Some(ch) = self.peek_char() {
            match ch {
                b'"' => {
                    self.index += 1;
                    let value = String::from_utf8_lossy(&value).into_owned();
                    return Ok(Token::with_value(TokenKind::String, value));
                }
                b'\\' => {
                    // The backslash goes, the escaped character stays.
                    self.index += 1;
                    match self.peek_char() {
                        Some(escaped) => {
                            value.push(escaped);
                            self.index += 1;
                        }
                        None => break,
                    }
                }
                _ => {
                    value.push(ch);
                    self.index += 1;
                }
            }
        }

        self.index = start;
        Err(self.unexpected_char())
    }

    fn unexpected_char(&self) -> CoreError {
        let found = self.source[self.index..]
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default();
        CoreError::LexError {
            position: self.index,
            found,
        }
    }

    fn count_digits(&self, offset: usize) -> usize {
        self.chars
            .get(self.index + offset..)
            .unwrap_or_default()
            .iter()
            .take_while(|ch| ch.is_ascii_digit())
            .count()
    }

    fn peek_char(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_next(&self) -> Option<u8> {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.chars.get(self.index + offset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("lex")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn lexes_simple_call() {
        let tokens = lex("(+ 1 2.5)").expect("lex");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::LParen),
                Token::new(TokenKind::Plus),
                Token::with_value(TokenKind::Integer, "1"),
                Token::with_value(TokenKind::Floating, "2.5"),
                Token::new(TokenKind::RParen),
            ]
        );
    }

    #[test]
    fn prefers_two_character_symbols() {
        assert_eq!(
            kinds(">= <= /= > < = / '"),
            vec![
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::NotEqual,
                TokenKind::Greater,
                TokenKind::Less,
                TokenKind::Equal,
                TokenKind::Divide,
                TokenKind::Quote,
            ]
        );
    }

    #[test]
    fn recognizes_keywords() {
        assert_eq!(
            kinds("null not if let defun car cdr t nil cons list progn print"),
            vec![
                TokenKind::Null,
                TokenKind::Not,
                TokenKind::If,
                TokenKind::Let,
                TokenKind::Defun,
                TokenKind::Car,
                TokenKind::Cdr,
                TokenKind::T,
                TokenKind::Nil,
                TokenKind::Cons,
                TokenKind::List,
                TokenKind::Progn,
                TokenKind::Print,
            ]
        );
        assert_eq!(kinds("nils defunx"), vec![TokenKind::Identifier; 2]);
    }

    #[test]
    fn signed_numbers_beat_the_sign_symbol() {
        let tokens = lex("(- -4 +2.5)").expect("lex");
        assert_eq!(tokens[1], Token::new(TokenKind::Minus));
        assert_eq!(tokens[2], Token::with_value(TokenKind::Integer, "-4"));
        assert_eq!(tokens[3], Token::with_value(TokenKind::Floating, "+2.5"));
    }

    #[test]
    fn integer_without_fraction_digits_stays_integer() {
        assert_eq!(kinds("1 2.5"), vec![TokenKind::Integer, TokenKind::Floating]);
        let err = lex("1.").unwrap_err();
        assert!(matches!(err, CoreError::LexError { position: 1, .. }));
    }

    #[test]
    fn longest_match_keeps_alphanumeric_runs_together() {
        let tokens = lex("42 42abc").expect("lex");
        assert_eq!(tokens[0], Token::with_value(TokenKind::Integer, "42"));
        assert_eq!(tokens[1], Token::with_value(TokenKind::Identifier, "42abc"));
    }

    #[test]
    fn unescapes_string_literals() {
        let tokens = lex(r#""say \"hi\" \n""#).expect("lex");
        assert_eq!(
            tokens,
            vec![Token::with_value(TokenKind::String, "say \"hi\" n")]
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = lex("(print \"abc)").unwrap_err();
        assert!(matches!(err, CoreError::LexError { position: 7, .. }));
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = lex("(print x_y)").unwrap_err();
        match err {
            CoreError::LexError { position, found } => {
                assert_eq!(position, 8);
                assert_eq!(found, "_");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn skips_all_whitespace() {
        assert_eq!(kinds(" \t\r\n(\x0b)\x0c"), vec![TokenKind::LParen, TokenKind::RParen]);
    }
}
