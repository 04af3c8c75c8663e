pub mod lexer;

pub use lexer::{tokenize, Location, SpannedToken, Token};
