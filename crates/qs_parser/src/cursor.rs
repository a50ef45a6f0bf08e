use std::rc::Rc;

use crate::lexer::Lexer;
use crate::span::WithSpan;
use crate::token::{Keyword, Token, TokenKind};

/// A saved read position. Only meaningful for the token buffer it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookmark(usize);

impl Bookmark {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Read position inside a shared, read-only token buffer.
///
/// Cloning a cursor only bumps the buffer's reference count, so saving and
/// restoring a position is cheap. Loops and function calls re-enter a region
/// of the grammar by rewinding to a [`Bookmark`].
#[derive(Debug, Clone)]
pub struct Cursor {
    tokens: Rc<[WithSpan<Token>]>,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: Rc<[WithSpan<Token>]>) -> Cursor {
        Cursor { tokens, pos: 0 }
    }

    pub fn from_source(source: &str) -> Cursor {
        Cursor::new(Lexer::new(source).tokenize().into())
    }

    /// Token under the cursor, None once past the last token.
    pub fn current(&self) -> Option<&WithSpan<Token>> {
        self.tokens.get(self.pos)
    }

    /// Whether the current token is the punctuation `lexeme`. A string literal
    /// with the same text does not count.
    pub fn current_is_punct(&self, lexeme: &str) -> bool {
        matches!(
            self.current(),
            Some(token) if token.value.kind == TokenKind::Punct && token.value.is(lexeme)
        )
    }

    pub fn current_keyword(&self) -> Option<Keyword> {
        self.current().and_then(|token| token.value.keyword())
    }

    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn bookmark(&self) -> Bookmark {
        Bookmark(self.pos)
    }

    pub fn rewind(&mut self, bookmark: Bookmark) {
        self.pos = bookmark.0;
    }

    pub fn tokens(&self) -> &Rc<[WithSpan<Token>]> {
        &self.tokens
    }
}
