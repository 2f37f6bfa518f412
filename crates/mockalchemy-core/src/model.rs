//! Mapped-entity metadata and the `Model` trait.
//!
//! A [`Table`] is the runtime description of a mapped entity: its table name,
//! ordered column names and declared primary-key columns. [`Model`] is the
//! typed view implemented by test structs that convert to and from
//! [`Record`].

use crate::Result;
use crate::render::Renderable;
use crate::row::Record;
use crate::value::Value;
use std::sync::Arc;

/// Metadata for a mapped entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    primary_key: Vec<String>,
}

impl Table {
    /// Create table metadata with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Append a regular column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.columns.contains(&name) {
            self.columns.push(name);
        }
        self
    }

    /// Append several regular columns.
    #[must_use]
    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self = self.column(name);
        }
        self
    }

    /// Declare a primary-key column, adding it to the column list if needed.
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self = self.column(name.clone());
        if !self.primary_key.contains(&name) {
            self.primary_key.push(name);
        }
        self
    }

    /// Wrap the metadata for sharing between records.
    pub fn shared(self) -> Arc<Table> {
        Arc::new(self)
    }

    /// Table metadata for a [`Model`] implementation.
    pub fn of<M: Model>() -> Self {
        let mut table = Table::new(M::TABLE_NAME).columns(M::COLUMNS.iter().copied());
        for pk in M::PRIMARY_KEY {
            table = table.primary_key(*pk);
        }
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Declared primary-key columns, in declaration order.
    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_key
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Position of a column in the column list.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

impl Renderable for Table {
    fn canonical_form(&self) -> String {
        format!("Entity({})", self.name)
    }
}

/// A typed mapped entity.
///
/// Implementors list their columns once and convert to and from the untyped
/// [`Record`] the session stores.
///
/// # Example
///
/// ```ignore
/// struct Hero { id: i64, name: String }
///
/// impl Model for Hero {
///     const TABLE_NAME: &'static str = "heroes";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///     const COLUMNS: &'static [&'static str] = &["id", "name"];
///
///     fn to_values(&self) -> Vec<Value> {
///         vec![self.id.into(), self.name.clone().into()]
///     }
///
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(Self { id: record.get_as("id")?, name: record.get_as("name")? })
///     }
/// }
/// ```
pub trait Model: Sized {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// The primary key column name(s).
    const PRIMARY_KEY: &'static [&'static str];

    /// Every column, in the order [`Model::to_values`] produces them.
    const COLUMNS: &'static [&'static str];

    /// Column values in [`Model::COLUMNS`] order.
    fn to_values(&self) -> Vec<Value>;

    /// Construct a model instance from a stored record.
    #[allow(clippy::result_large_err)]
    fn from_record(record: &Record) -> Result<Self>;

    fn table() -> Arc<Table> {
        Arc::new(Table::of::<Self>())
    }

    fn to_record(&self) -> Record {
        Record::new(Self::table(), self.to_values())
    }
}
