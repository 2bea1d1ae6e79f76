pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use lexer::Position;
pub use parser::parse;
