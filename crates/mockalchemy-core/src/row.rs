//! Stored rows: mapped records and column projections.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::model::{Model, Table};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A mapped-entity instance held by the fixture store.
///
/// Table metadata is shared via `Arc` so every record of the same entity
/// points at one column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: Arc<Table>,
    values: Vec<Value>,
}

impl Record {
    /// Create a record from values in column order.
    ///
    /// Missing trailing values are NULL; surplus values are dropped with a
    /// warning, since they usually mean `to_values` and `COLUMNS` disagree.
    pub fn new(table: Arc<Table>, mut values: Vec<Value>) -> Self {
        let width = table.column_names().len();
        if values.len() > width {
            tracing::warn!(
                table = table.name(),
                columns = width,
                values = values.len(),
                "Dropping values beyond the table's columns"
            );
        }
        values.resize(width, Value::Null);
        Self { table, values }
    }

    /// Create a record from `(column, value)` pairs. Unset columns are NULL.
    #[allow(clippy::result_large_err)]
    pub fn from_pairs<I, K, V>(table: Arc<Table>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Record::new(table, Vec::new());
        for (column, value) in pairs {
            record.set(column.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Create a record from a JSON object keyed by column name.
    #[allow(clippy::result_large_err)]
    pub fn from_json(table: Arc<Table>, json: &serde_json::Value) -> Result<Self> {
        let Some(object) = json.as_object() else {
            return Err(Error::Type(TypeError {
                expected: "JSON object",
                actual: json.to_string(),
                column: None,
            }));
        };
        Record::from_pairs(
            table,
            object.iter().map(|(k, v)| (k.as_str(), Value::from_json(v))),
        )
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get a column value by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.table.index_of(column).map(|i| &self.values[i])
    }

    /// Get a typed column value by name.
    #[allow(clippy::result_large_err)]
    pub fn get_as<T>(&self, column: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = Error>,
    {
        let value = self
            .get(column)
            .cloned()
            .ok_or_else(|| unknown_column(&self.table, column))?;
        T::try_from(value).map_err(|e| match e {
            Error::Type(mut type_err) => {
                type_err.column = Some(column.to_string());
                Error::Type(type_err)
            }
            other => other,
        })
    }

    /// Set a column value by name.
    #[allow(clippy::result_large_err)]
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .table
            .index_of(column)
            .ok_or_else(|| unknown_column(&self.table, column))?;
        self.values[index] = value.into();
        Ok(())
    }

    /// Primary-key values in declared order, or `None` when the entity
    /// declares no primary key.
    pub fn primary_key_values(&self) -> Option<Vec<Value>> {
        if !self.table.has_primary_key() {
            return None;
        }
        self.table
            .primary_key_columns()
            .iter()
            .map(|pk| self.get(pk).cloned())
            .collect()
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.table
            .column_names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Convert into a typed model.
    #[allow(clippy::result_large_err)]
    pub fn to_model<M: Model>(&self) -> Result<M> {
        M::from_record(self)
    }
}

fn unknown_column(table: &Table, column: &str) -> Error {
    Error::Custom(format!(
        "column '{}' does not exist on '{}'",
        column,
        table.name()
    ))
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.table.name())?;
        for (i, (column, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}={value}")?;
        }
        write!(f, ")")
    }
}

impl<M: Model> From<&M> for Record {
    fn from(model: &M) -> Self {
        model.to_record()
    }
}

/// A row held by a fixture entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// A mapped-entity instance
    Entity(Record),
    /// A column projection such as `select(Model.name)`; carries no key
    Tuple(Vec<Value>),
}

impl Row {
    /// Build a projection row.
    pub fn tuple<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Row::Tuple(values.into_iter().map(Into::into).collect())
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Row::Entity(record) => Some(record),
            Row::Tuple(_) => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Row::Entity(record) => Some(record),
            Row::Tuple(_) => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Row::Entity(record) => Some(record),
            Row::Tuple(_) => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Row::Tuple(values) => Some(values),
            Row::Entity(_) => None,
        }
    }

    /// Get a column of an entity row by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(column))
    }

    /// Convert an entity row into a typed model.
    #[allow(clippy::result_large_err)]
    pub fn to_model<M: Model>(&self) -> Result<M> {
        match self {
            Row::Entity(record) => record.to_model(),
            Row::Tuple(values) => Err(Error::Type(TypeError {
                expected: M::TABLE_NAME,
                actual: format!("tuple row of {} values", values.len()),
                column: None,
            })),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Entity(record) => write!(f, "{record}"),
            Row::Tuple(values) => {
                write!(f, "(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                if values.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<Record> for Row {
    fn from(record: Record) -> Self {
        Row::Entity(record)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::Tuple(values)
    }
}

impl<M: Model> From<&M> for Row {
    fn from(model: &M) -> Self {
        Row::Entity(model.to_record())
    }
}

/// Result of a `scalar()` terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A single-column projection unwrapped to its value
    Value(Value),
    /// Any other row, returned whole
    Row(Row),
}

impl Scalar {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Scalar::Value(v) => Some(v),
            Scalar::Row(_) => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Scalar::Row(r) => Some(r),
            Scalar::Value(_) => None,
        }
    }
}

impl From<Row> for Scalar {
    fn from(row: Row) -> Self {
        match row {
            Row::Tuple(mut values) if values.len() == 1 => {
                Scalar::Value(values.pop().unwrap_or(Value::Null))
            }
            other => Scalar::Row(other),
        }
    }
}
