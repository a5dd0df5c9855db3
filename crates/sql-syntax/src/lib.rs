pub mod ast;
pub mod builder;
pub mod errors;
pub mod parser;
pub mod render;

pub use builder::parse;
pub use errors::ParseError;
pub use render::{Render, Renderer, to_sql};
