//! Expression and statement builders for mockalchemy.
//!
//! `mockalchemy-query` is the **query construction layer** the session double
//! observes. Expressions and statements compile to SQL text plus bound
//! parameters, and that pair is their canonical form: two values built
//! independently from the same source compare equal through it.
//!
//! - **Expression DSL**: `Expr` with comparison, logical and function builders.
//! - **Statements**: `select`, `insert`, `update`, `delete`.
//! - **Dialect support**: placeholders and quoting for Postgres, MySQL and SQLite.

pub mod clause;
pub mod expr;
pub mod statement;

pub use clause::{Join, JoinType, NullsOrder, OrderBy, OrderDirection};
pub use expr::{BinaryOp, Dialect, Expr, and, or};
pub use statement::{
    Delete, Insert, Select, Selectable, Statement, Update, delete, insert, select, update,
};
