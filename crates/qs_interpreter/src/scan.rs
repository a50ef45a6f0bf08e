use qs_parser::{
    cursor::Cursor,
    span::{Span, WithSpan},
    token::{Keyword, Token, TokenKind},
};

use crate::error::{EvalResult, InterpretationError};

pub(crate) const ADDITIVE: &[&str] = &["+", "-"];
pub(crate) const MULTIPLICATIVE: &[&str] = &["*", "/", "%"];

/// Consume the punctuation `lexeme` or fail.
pub(crate) fn expect_punct(cursor: &mut Cursor, lexeme: &str) -> EvalResult<Span> {
    match cursor.current() {
        Some(token) if token.value.kind == TokenKind::Punct && token.value.is(lexeme) => {
            let span = token.span;
            cursor.advance();
            Ok(span)
        }
        got => Err(InterpretationError::expected(format!("`{}`", lexeme), got)),
    }
}

/// Consume an identifier token and return its name.
pub(crate) fn expect_identifier(cursor: &mut Cursor) -> EvalResult<(String, Span)> {
    match cursor.current() {
        Some(token) if token.value.kind == TokenKind::Var => {
            let name = token.value.lexeme.clone();
            let span = token.span;
            cursor.advance();
            Ok((name, span))
        }
        got => Err(InterpretationError::expected(TokenKind::Var, got)),
    }
}

/// The current token if it is one of `operators`.
pub(crate) fn current_operator(cursor: &Cursor, operators: &[&str]) -> Option<WithSpan<Token>> {
    cursor
        .current()
        .filter(|token| {
            token.value.kind == TokenKind::Operator && operators.contains(&token.value.lexeme.as_str())
        })
        .cloned()
}

/// Balanced-parenthesis scan: advance past a `( ... )` region, counting nesting.
pub(crate) fn skip_list(cursor: &mut Cursor) -> EvalResult<()> {
    expect_punct(cursor, "(")?;

    let mut depth = 1usize;
    while depth > 0 {
        let token = match cursor.current() {
            Some(token) => &token.value,
            None => return Err(InterpretationError::expected("`)`", None)),
        };

        if token.kind == TokenKind::Punct {
            if token.is("(") {
                depth += 1;
            } else if token.is(")") {
                depth -= 1;
            }
        }
        cursor.advance();
    }

    Ok(())
}

/// How deep the syntactic skip may still recurse. Starts at the evaluator's
/// current nesting so both walks share one limit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Nesting {
    depth: usize,
    limit: usize,
}

impl Nesting {
    pub(crate) fn new(depth: usize, limit: usize) -> Self {
        Nesting { depth, limit }
    }

    fn enter(self, cursor: &Cursor) -> EvalResult<Nesting> {
        if self.depth >= self.limit {
            return Err(InterpretationError::nesting_too_deep(
                self.limit,
                cursor.current().map(|token| token.span),
            ));
        }
        Ok(Nesting {
            depth: self.depth + 1,
            ..self
        })
    }
}

/// Advance past one expression by walking its syntax. Nothing is evaluated and
/// nothing is bound.
pub(crate) fn skip_expr(cursor: &mut Cursor, nesting: Nesting) -> EvalResult<()> {
    skip_atom(cursor, nesting)?;
    while current_operator(cursor, MULTIPLICATIVE).is_some() {
        cursor.advance();
        skip_atom(cursor, nesting)?;
    }
    Ok(())
}

fn skip_atom(cursor: &mut Cursor, nesting: Nesting) -> EvalResult<()> {
    skip_base(cursor, nesting)?;
    while current_operator(cursor, ADDITIVE).is_some() {
        cursor.advance();
        skip_base(cursor, nesting)?;
    }
    Ok(())
}

fn skip_base(cursor: &mut Cursor, nesting: Nesting) -> EvalResult<()> {
    let (kind, keyword) = match cursor.current() {
        Some(token) => (token.value.kind, token.value.keyword()),
        None => return Err(InterpretationError::expected("an expression", None)),
    };
    let inner = nesting.enter(cursor)?;

    match (kind, keyword) {
        (TokenKind::Num, _) | (TokenKind::Str, _) => cursor.advance(),
        (TokenKind::Var, Some(Keyword::Call)) => {
            cursor.advance();
            expect_identifier(cursor)?;
            skip_list(cursor)?;
        }
        (TokenKind::Var, Some(Keyword::If)) => {
            cursor.advance();
            skip_expr(cursor, inner)?;
            skip_list(cursor)?;
            if cursor.current_keyword() == Some(Keyword::Else) {
                cursor.advance();
                skip_list(cursor)?;
            }
        }
        (TokenKind::Var, Some(Keyword::For)) => {
            cursor.advance();
            skip_expr(cursor, inner)?;
            expect_punct(cursor, ";")?;
            skip_expr(cursor, inner)?;
            expect_punct(cursor, ";")?;
            skip_expr(cursor, inner)?;
            skip_list(cursor)?;
        }
        (TokenKind::Var, Some(Keyword::While)) => {
            cursor.advance();
            skip_expr(cursor, inner)?;
            skip_list(cursor)?;
        }
        (TokenKind::Var, Some(Keyword::Fn)) => {
            cursor.advance();
            expect_identifier(cursor)?;
            skip_list(cursor)?;
            if cursor.current_is_punct("(") {
                skip_list(cursor)?;
            }
        }
        (TokenKind::Var, Some(Keyword::Set)) => {
            cursor.advance();
            expect_identifier(cursor)?;
            expect_punct(cursor, "=")?;
            skip_expr(cursor, inner)?;
        }
        (TokenKind::Var, _) => cursor.advance(),
        (TokenKind::Punct, _) if cursor.current_is_punct("(") => skip_list(cursor)?,
        _ => return Err(InterpretationError::expected("an expression", cursor.current())),
    }

    Ok(())
}
