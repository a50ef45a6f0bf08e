use qs_parser::{
    span::{Span, WithSpan},
    token::Token,
};

use crate::value::Value;

/// The one failure kind of an interpretation run. Lexical, syntactic and
/// runtime problems are only told apart by their message.
///
/// The first error aborts the run. Bindings made before the failure are left
/// in the environment as they were.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}{}", at_suffix(.span))]
pub struct InterpretationError {
    pub message: String,
    pub span: Option<Span>,
}

pub type EvalResult<T> = Result<T, InterpretationError>;

fn at_suffix(span: &Option<Span>) -> String {
    match span {
        Some(span) => format!(" {}", span.at_str()),
        None => String::new(),
    }
}

impl InterpretationError {
    pub fn new(message: impl Into<String>) -> Self {
        InterpretationError {
            message: message.into(),
            span: None,
        }
    }

    pub fn at(message: impl Into<String>, span: Span) -> Self {
        InterpretationError {
            message: message.into(),
            span: Some(span),
        }
    }

    /// When the token under the cursor is not the one the grammar requires
    pub fn expected(expected: impl std::fmt::Display, got: Option<&WithSpan<Token>>) -> Self {
        match got {
            Some(token) => Self::at(
                format!("expected {}, got `{}`", expected, token.value),
                token.span,
            ),
            None => Self::new(format!("expected {}, got EOF", expected)),
        }
    }

    /// When referencing an identifier that has never been bound
    pub fn identifier_not_found(name: &str, span: Span) -> Self {
        Self::at(format!("identifier '{}' not found", name), span)
    }

    /// When `call` names a binding that holds neither a function nor a native
    pub fn not_callable(name: &str, value: &Value, span: Span) -> Self {
        Self::at(
            format!(
                "`{}` is not callable: it is bound to `{}` ({})",
                name,
                value.typename(),
                value.to_code_string()
            ),
            span,
        )
    }

    /// When expressions nest deeper than the configured limit
    pub fn nesting_too_deep(limit: usize, span: Option<Span>) -> Self {
        InterpretationError {
            message: format!("maximum nesting depth of {} exceeded", limit),
            span,
        }
    }

    /// When an operator is applied to values it does not support
    pub fn invalid_operands(operator: &WithSpan<Token>, left: &Value, right: &Value) -> Self {
        Self::at(
            format!(
                "unsupported operand type(s) for {} operator: `{}` ({}) and `{}` ({})",
                operator.value,
                left.typename(),
                left.to_code_string(),
                right.typename(),
                right.to_code_string()
            ),
            operator.span,
        )
    }
}
