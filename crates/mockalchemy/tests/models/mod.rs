//! Entities shared by the integration suites.

#![allow(dead_code)]

use mockalchemy::prelude::*;

/// Qualified column of `M`'s table.
pub fn column<M: Model>(name: &str) -> Expr {
    Expr::qualified(M::TABLE_NAME, name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SomeClass {
    pub pk1: i64,
    pub pk2: i64,
    pub name: Option<String>,
}

impl SomeClass {
    pub fn new(pk1: i64, pk2: i64) -> Self {
        Self {
            pk1,
            pk2,
            name: None,
        }
    }

    pub fn named(pk1: i64, pk2: i64, name: &str) -> Self {
        Self {
            pk1,
            pk2,
            name: Some(name.to_string()),
        }
    }
}

impl Model for SomeClass {
    const TABLE_NAME: &'static str = "some_table";
    const PRIMARY_KEY: &'static [&'static str] = &["pk1", "pk2"];
    const COLUMNS: &'static [&'static str] = &["pk1", "pk2", "name"];

    fn to_values(&self) -> Vec<Value> {
        vec![self.pk1.into(), self.pk2.into(), self.name.clone().into()]
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            pk1: record.get_as("pk1")?,
            pk2: record.get_as("pk2")?,
            name: record.get_as("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub pk1: i64,
    pub name: Option<String>,
}

impl Entry {
    pub fn new(pk1: i64) -> Self {
        Self { pk1, name: None }
    }

    pub fn named(pk1: i64, name: &str) -> Self {
        Self {
            pk1,
            name: Some(name.to_string()),
        }
    }

    pub fn pk1() -> Expr {
        column::<Self>("pk1")
    }

    pub fn name() -> Expr {
        column::<Self>("name")
    }
}

impl Model for Entry {
    const TABLE_NAME: &'static str = "model_table";
    const PRIMARY_KEY: &'static [&'static str] = &["pk1"];
    const COLUMNS: &'static [&'static str] = &["pk1", "name"];

    fn to_values(&self) -> Vec<Value> {
        vec![self.pk1.into(), self.name.clone().into()]
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            pk1: record.get_as("pk1")?,
            name: record.get_as("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    pub pk1: i64,
    pub data_p1: f64,
    pub data_p2: f64,
    pub name: Option<String>,
}

impl Data {
    pub fn new(pk1: i64, data_p1: f64, data_p2: f64) -> Self {
        Self {
            pk1,
            data_p1,
            data_p2,
            name: None,
        }
    }

    pub fn pk1() -> Expr {
        column::<Self>("pk1")
    }

    pub fn data_p1() -> Expr {
        column::<Self>("data_p1")
    }
}

impl Model for Data {
    const TABLE_NAME: &'static str = "data_table";
    const PRIMARY_KEY: &'static [&'static str] = &["pk1"];
    const COLUMNS: &'static [&'static str] = &["pk1", "data_p1", "data_p2", "name"];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.pk1.into(),
            self.data_p1.into(),
            self.data_p2.into(),
            self.name.clone().into(),
        ]
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            pk1: record.get_as("pk1")?,
            data_p1: record.get_as("data_p1")?,
            data_p2: record.get_as("data_p2")?,
            name: record.get_as("name")?,
        })
    }
}

/// Convert resolved rows into typed models.
pub fn models<M: Model>(rows: &[Row]) -> Vec<M> {
    rows.iter()
        .map(|row| row.to_model().expect("row converts to model"))
        .collect()
}
