pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod script;
pub mod value;
