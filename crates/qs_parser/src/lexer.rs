use std::iter::Peekable;
use std::str::Chars;

use crate::span::{BytePos, Span, WithSpan};
use crate::token::{Token, TokenKind};

/// Single forward scan over the source text. The lexer never fails: characters
/// it does not recognize are skipped and an unclosed string runs to the end of input.
pub struct Lexer<'a> {
    input_iter: Peekable<Chars<'a>>,
    current_position: BytePos,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input_iter: input.chars().peekable(),
            current_position: BytePos::new(0),
        }
    }

    /// Consume the next character from the list.
    fn read_char(&mut self) -> Option<char> {
        let next = self.input_iter.next();
        if let Some(c) = next {
            self.current_position = self.current_position.shift(c);
        }
        next
    }

    /// Get the next character from the list without consuming it.
    fn peek_char(&mut self) -> Option<&char> {
        self.input_iter.peek()
    }

    /// Consume characters while they satisfy `accept`, appending them to `lexeme`.
    fn read_while(&mut self, lexeme: &mut String, accept: fn(char) -> bool) {
        while let Some(&ch) = self.peek_char() {
            if !accept(ch) {
                break;
            }
            lexeme.push(ch);
            self.read_char();
        }
    }

    /// Read everything up to the closing quote. There are no escape sequences;
    /// reaching the end of input simply ends the string.
    fn read_string(&mut self, opening: char) -> Token {
        let mut contents = String::new();

        while let Some(ch) = self.read_char() {
            if ch == opening {
                break;
            }
            contents.push(ch);
        }

        Token::new(TokenKind::Str, contents)
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut lexeme = String::from(first);
        self.read_while(&mut lexeme, is_number_char);
        Token::new(TokenKind::Num, lexeme)
    }

    fn read_identifier(&mut self, first: char) -> Token {
        let mut lexeme = String::from(first);
        self.read_while(&mut lexeme, is_identifier_char);
        Token::new(TokenKind::Var, lexeme)
    }

    /// Read a new token from the characters list, or None at the end of input.
    pub fn next_token(&mut self) -> Option<WithSpan<Token>> {
        loop {
            let initial_position = self.current_position;
            let c = self.read_char()?;

            let token = match c {
                c if is_number_char(c) => self.read_number(c),
                '\'' | '"' | '`' => self.read_string(c),
                c if is_identifier_char(c) => self.read_identifier(c),
                '(' | ')' | ',' | '=' | ';' => Token::new(TokenKind::Punct, c),
                '+' | '-' | '*' | '/' | '%' => Token::new(TokenKind::Operator, c),
                // Whitespace and anything unrecognized
                _ => continue,
            };

            let span = Span::new(initial_position, self.current_position);
            return Some(WithSpan::new(token, span));
        }
    }

    /// Lex the whole input.
    pub fn tokenize(mut self) -> Vec<WithSpan<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Letters are recognized by having distinct upper and lower case forms.
fn is_identifier_char(c: char) -> bool {
    c == '_' || c == '?' || c.to_uppercase().ne(c.to_lowercase())
}
