//! Core types for mockalchemy.
//!
//! This crate provides the shared vocabulary of the session doubles:
//!
//! - `Value` for bound parameters and column values
//! - `Table`, `Record` and `Row` for fixture data
//! - `Model` for typed test entities
//! - `Renderable` for anything compared by canonical rendering
//! - `Error` and `Result`

pub mod error;
pub mod model;
pub mod render;
pub mod row;
pub mod value;

pub use error::{AssertionError, Error, KeyError, KeyErrorKind, Result, TypeError};
pub use model::{Model, Table};
pub use render::Renderable;
pub use row::{Record, Row, Scalar};
pub use value::Value;
