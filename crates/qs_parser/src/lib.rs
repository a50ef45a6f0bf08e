pub mod cursor;
pub mod lexer;
pub mod span;
pub mod token;
