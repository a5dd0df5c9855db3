use crate::ast::{Expr, Query, Select};
use std::fmt;

pub mod expr;
pub mod query;

/// Types that can write themselves as canonical SQL text.
pub trait Render {
    fn render(&self, r: &mut Renderer);
}

/// Accumulates the SQL text of a node tree.
#[derive(Debug, Default)]
pub struct Renderer {
    pub sql: String,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.sql
    }

    pub(crate) fn push_ident(&mut self, ident: &str) {
        // Writing into a String cannot fail.
        let _ = crate::ast::ident::write_ident(&mut self.sql, ident);
    }

    pub(crate) fn push_display(&mut self, value: &impl fmt::Display) {
        use fmt::Write;
        let _ = write!(self.sql, "{}", value);
    }

    pub(crate) fn push_list<T: Render>(&mut self, items: &[T]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            item.render(self);
        }
    }
}

/// Renders any node to a fresh string.
pub fn to_sql<T: Render + ?Sized>(node: &T) -> String {
    let mut renderer = Renderer::new();
    node.render(&mut renderer);
    renderer.finish()
}

impl<T: Render + ?Sized> Render for std::sync::Arc<T> {
    fn render(&self, r: &mut Renderer) {
        self.as_ref().render(r)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_sql(self))
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_sql(self))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_sql(self))
    }
}
