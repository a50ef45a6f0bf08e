use std::{fmt::Display, rc::Rc};

use qs_parser::cursor::Cursor;

use crate::host::Host;

#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Function(Rc<Function>),
    /// The host escape binding
    Native(Rc<dyn Host>),
    /// Result of statement-shaped forms (`fn`, `set`) and of loops whose body never ran.
    Nil,
}

impl Value {
    pub fn typename(&self) -> &'static str {
        use Value::*;

        match self {
            Number(_) => "number",
            String(_) => "string",
            Function(_) => "function",
            Native(_) => "native",
            Nil => "nil",
        }
    }

    /// `0`, `NaN`, `""` and nil are falsy.
    pub fn is_truthy(&self) -> bool {
        use Value::*;

        match self {
            Number(value) => *value != 0.0 && !value.is_nan(),
            String(value) => !value.is_empty(),
            Function(_) | Native(_) => true,
            Nil => false,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    /// Converts the given value to a string (in the format of a code object).
    ///
    /// Use this anywhere a programmer expects to see the code-version of a value (e.g. in the REPL).
    /// # Examples
    /// ```rust
    /// use qs_interpreter::value::Value;
    ///
    /// let value = Value::String("hello world".to_string());
    ///
    /// assert_eq!(value.to_code_string(), "\"hello world\"");
    /// ```
    pub fn to_code_string(&self) -> String {
        match self {
            Value::String(value) => format!("\"{}\"", value),
            value => value.to_string(),
        }
    }
}

impl Display for Value {
    /// Runtime string form, also used for string concatenation
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Value::*;

        match self {
            Number(value) => write!(f, "{}", format_number(*value)),
            String(value) => write!(f, "{}", value),
            Function(func) => write!(f, "{}", func),
            Native(host) => write!(f, "native function {}", host.name()),
            Nil => write!(f, "nil"),
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Value::*;

        match self {
            Number(value) => f.debug_tuple("Number").field(value).finish(),
            String(value) => f.debug_tuple("String").field(value).finish(),
            Function(func) => f.debug_tuple("Function").field(func).finish(),
            Native(host) => f.debug_tuple("Native").field(&host.name()).finish(),
            Nil => write!(f, "Nil"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        use Value::*;

        match (self, other) {
            (Number(left), Number(right)) => left == right,
            (String(left), String(right)) => left == right,
            // Functions and natives are only equal to themselves
            (Function(left), Function(right)) => Rc::ptr_eq(left, right),
            (Native(left), Native(right)) => {
                Rc::as_ptr(left) as *const () == Rc::as_ptr(right) as *const ()
            }
            (Nil, Nil) => true,
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

/// Integral numbers print without a fractional part (`7`, not `7.0`).
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{}", value as i64)
    } else {
        ryu::Buffer::new().format(value).to_owned()
    }
}

/// A user-defined routine. It does not own its body: `body` is a cursor
/// bookmarked at the body's opening `(` inside the token buffer of the run
/// that defined it.
pub struct Function {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Cursor,
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn {}({})", self.name, self.parameters.join(", "))
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("body_start", &self.body.bookmark().index())
            .finish()
    }
}
