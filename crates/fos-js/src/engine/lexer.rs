//! Expression Lexer
//!
//! Tokenizes directive expressions.

use super::token::{Token, TokenKind, Span, keyword_from_str};
use std::str::Chars;
use std::iter::Peekable;

/// Expression lexer
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<Chars<'src>>,
    pos: u32,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            pos: 0,
        }
    }

    /// Get current position
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Peek at the next character
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Peek at the character after next
    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.pos as usize..].chars();
        iter.next();
        iter.next()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        Some(c)
    }

    /// Consume `expected` if it is next
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_next() == Some('*') => {
                    self.advance();
                    self.advance();
                    while let Some(c) = self.advance() {
                        if c == '*' && self.peek() == Some('/') {
                            self.advance();
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.pos;
        let Some(c) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match c {
            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' || c == '$' => self.scan_identifier(start),

            // Numbers
            '0'..='9' => self.scan_number(start),
            '.' if matches!(self.peek(), Some('0'..='9')) => self.scan_number(start),

            // Strings
            '"' | '\'' => self.scan_string(c),

            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,

            '?' => {
                if self.eat('?') { TokenKind::QuestionQuestion } else { TokenKind::Question }
            }

            '+' => match self.peek() {
                Some('+') => { self.advance(); TokenKind::PlusPlus }
                Some('=') => { self.advance(); TokenKind::PlusEq }
                _ => TokenKind::Plus,
            },

            '-' => match self.peek() {
                Some('-') => { self.advance(); TokenKind::MinusMinus }
                Some('=') => { self.advance(); TokenKind::MinusEq }
                _ => TokenKind::Minus,
            },

            '*' => {
                if self.eat('=') { TokenKind::StarEq } else { TokenKind::Star }
            }

            '/' => {
                if self.eat('=') { TokenKind::SlashEq } else { TokenKind::Slash }
            }

            '%' => TokenKind::Percent,

            '<' => {
                if self.eat('=') { TokenKind::LtEq } else { TokenKind::Lt }
            }

            '>' => {
                if self.eat('=') { TokenKind::GtEq } else { TokenKind::Gt }
            }

            '=' => {
                if self.eat('=') {
                    if self.eat('=') { TokenKind::EqEqEq } else { TokenKind::EqEq }
                } else {
                    TokenKind::Eq
                }
            }

            '!' => {
                if self.eat('=') {
                    if self.eat('=') { TokenKind::NotEqEq } else { TokenKind::NotEq }
                } else {
                    TokenKind::Bang
                }
            }

            '&' => {
                if self.eat('&') { TokenKind::AmpAmp } else { TokenKind::Error("unsupported operator '&'".into()) }
            }

            '|' => {
                if self.eat('|') { TokenKind::PipePipe } else { TokenKind::Error("unsupported operator '|'".into()) }
            }

            other => TokenKind::Error(format!("unexpected character '{}'", other).into()),
        };

        Token::new(kind, Span::new(start, self.pos))
    }

    fn scan_identifier(&mut self, start: u32) -> TokenKind {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            self.advance();
        }
        let word = &self.source[start as usize..self.pos as usize];
        keyword_from_str(word).unwrap_or_else(|| TokenKind::Identifier(word.into()))
    }

    fn scan_number(&mut self, start: u32) -> TokenKind {
        while matches!(self.peek(), Some('0'..='9' | '_')) {
            self.advance();
        }
        if self.peek() == Some('.') && matches!(self.peek_next(), Some('0'..='9')) {
            self.advance();
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        let text: String = self.source[start as usize..self.pos as usize]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        match text.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Error(format!("invalid number '{}'", text).into()),
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        while let Some(c) = self.advance() {
            if c == quote {
                return TokenKind::String(value.into());
            } else if c == '\\' {
                match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('0') => value.push('\0'),
                    Some(c) => value.push(c),
                    None => break,
                }
            } else {
                value.push(c);
            }
        }

        TokenKind::Error("unterminated string literal".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                return out;
            }
            out.push(token.kind);
        }
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("foo = 'baz';");
        assert!(matches!(&tokens[0], TokenKind::Identifier(name) if &**name == "foo"));
        assert_eq!(tokens[1], TokenKind::Eq);
        assert_eq!(tokens[2], TokenKind::String("baz".into()));
        assert_eq!(tokens[3], TokenKind::Semicolon);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ ++ += === !== && || ?? <="),
            vec![
                TokenKind::Plus,
                TokenKind::PlusPlus,
                TokenKind::PlusEq,
                TokenKind::EqEqEq,
                TokenKind::NotEqEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::QuestionQuestion,
                TokenKind::LtEq,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42 1.5 .5 1e3"), vec![
            TokenKind::Number(42.0),
            TokenKind::Number(1.5),
            TokenKind::Number(0.5),
            TokenKind::Number(1000.0),
        ]);
    }

    #[test]
    fn test_dollar_identifier_and_comments() {
        let tokens = kinds("$event /* note */ . key // trailing");
        assert!(matches!(&tokens[0], TokenKind::Identifier(name) if &**name == "$event"));
        assert_eq!(tokens[1], TokenKind::Dot);
        assert!(matches!(&tokens[2], TokenKind::Identifier(name) if &**name == "key"));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(kinds("'abc")[0], TokenKind::Error(_)));
    }
}
