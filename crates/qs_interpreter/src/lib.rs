mod config;
mod environment;
mod error;
mod evaluator;
pub mod host;
mod scan;
pub mod value;

pub use config::{
    Config, DEFAULT_HOST_BINDING, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NESTING, STACK_SIZE,
};
pub use environment::Environment;
pub use error::{EvalResult, InterpretationError};
pub use evaluator::Interpreter;
