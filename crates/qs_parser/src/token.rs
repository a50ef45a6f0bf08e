use std::fmt;

/// The lexical class of a [`Token`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    /// A run of digits and dots (e.g. `12`, `3.5`, `1.2.3`)
    Num,
    /// The unquoted contents of a string literal
    Str,
    /// Identifiers and keywords
    Var,
    /// `(`, `)`, `,`, `=` and `;`
    Punct,
    /// `+`, `-`, `*`, `/` and `%`
    Operator,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;

        match self {
            Num => write!(f, "number"),
            Str => write!(f, "string"),
            Var => write!(f, "identifier"),
            Punct => write!(f, "punctuation"),
            Operator => write!(f, "operator"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
        }
    }

    pub fn is(&self, lexeme: &str) -> bool {
        self.lexeme == lexeme
    }

    /// Get the Keyword this token spells, if any.
    /// Only identifier tokens can be keywords, so a string literal `"if"` never is.
    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Var => Keyword::lookup(&self.lexeme),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Str => write!(f, "\"{}\"", self.lexeme),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

/// Identifiers that introduce a special form instead of a variable lookup.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keyword {
    Call,
    If,
    Else,
    For,
    While,
    Fn,
    Set,
}

impl Keyword {
    /// Get the Keyword for the given identifier, if valid.
    pub fn lookup(s: &str) -> Option<Keyword> {
        use Keyword::*;

        match s {
            "call" => Some(Call),
            "if" => Some(If),
            "else" => Some(Else),
            "for" => Some(For),
            "while" => Some(While),
            "fn" => Some(Fn),
            "set" => Some(Set),
            _ => None,
        }
    }
}
